//! Configuration loading from the process environment.
//!
//! One `Config` value is built in `main` and handed to the service
//! constructors; nothing reads the environment after startup.

use crate::{Error, Result};
use std::path::PathBuf;
use tracing::warn;

/// Default cross-origin allow-list: local frontend dev servers.
const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:5173",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:5173",
];

const DEFAULT_PORT: u16 = 8000;

/// Deployment mode, selected by the `ENVIRONMENT` variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// All-origins CORS, intended for local frontend work only.
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            _ => Environment::Production,
        }
    }
}

/// Runtime configuration resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    /// Listen port (`PORT`, set by the hosting platform).
    pub port: u16,
    /// Groq API key shared by the planner and voice-note features.
    /// Absence is not fatal at startup; affected endpoints report a
    /// configuration error at call time.
    pub groq_api_key: Option<String>,
    /// Cross-origin allow-list, ignored in development mode.
    pub allowed_origins: Vec<String>,
    /// Firebase service-account credentials as inline JSON
    /// (`FIREBASE_SERVICE_ACCOUNT`), preferred over the key file.
    pub firebase_service_account: Option<String>,
    /// Fallback path to a service-account key file.
    pub firebase_service_account_path: PathBuf,
}

impl Config {
    /// Resolve configuration from the environment.
    pub fn from_env() -> Result<Self> {
        let environment = std::env::var("ENVIRONMENT")
            .map(|v| Environment::parse(&v))
            .unwrap_or(Environment::Production);

        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| Error::Config(format!("Invalid PORT value: {raw}")))?,
            Err(_) => DEFAULT_PORT,
        };

        let groq_api_key = std::env::var("GROQ_API_KEY")
            .ok()
            .filter(|key| is_valid_key(key));

        let allowed_origins = match std::env::var("ALLOWED_ORIGINS") {
            Ok(raw) => {
                let origins = parse_origins(&raw);
                if origins.is_empty() {
                    warn!("ALLOWED_ORIGINS is set but empty, using defaults");
                    Self::default_allowed_origins()
                } else {
                    origins
                }
            }
            Err(_) => Self::default_allowed_origins(),
        };

        let firebase_service_account = std::env::var("FIREBASE_SERVICE_ACCOUNT")
            .ok()
            .filter(|raw| is_valid_key(raw));

        let firebase_service_account_path = std::env::var("FIREBASE_SERVICE_ACCOUNT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("serviceAccountKey.json"));

        Ok(Self {
            environment,
            port,
            groq_api_key,
            allowed_origins,
            firebase_service_account,
            firebase_service_account_path,
        })
    }

    pub fn default_allowed_origins() -> Vec<String> {
        DEFAULT_ALLOWED_ORIGINS
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

/// Validate a credential value (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Split a comma-separated origin list, dropping empty entries.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
