//! smartstudy-api - AI-powered study assistant backend
//!
//! Thin HTTP layer over three external collaborators: Firebase (auth +
//! Firestore), and the Groq API (chat completions + Whisper). Serves
//! the planner, study-buddy, and voice-note route groups.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use smartstudy_api::services::{
    FirebaseAuthVerifier, GoogleAuth, GroqClient, InferenceProvider, TokenVerifier,
};
use smartstudy_api::services::firebase::ServiceAccount;
use smartstudy_api::store::{DocumentStore, FirestoreStore};
use smartstudy_api::{build_router, AppState};
use smartstudy_common::{Config, Result as CommonResult};

const OUTBOUND_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // .env before anything reads the environment
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting SmartStudy backend v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;
    info!("Environment: {}", config.environment.as_str());

    if config.groq_api_key.is_some() {
        info!("✓ GROQ_API_KEY found in environment");
    } else {
        warn!("GROQ_API_KEY not set - planner and voice features will return configuration errors");
    }

    // Firebase is optional at startup: a credential failure leaves the
    // study-buddy endpoints rejecting requests and is reported by
    // /health instead of crashing the process.
    let (identity, store) = match init_firebase(&config) {
        Ok((verifier, store)) => {
            info!("✓ Firebase initialized");
            (Some(verifier), Some(store))
        }
        Err(e) => {
            warn!("Firebase initialization failed: {e}");
            warn!("Set FIREBASE_SERVICE_ACCOUNT or provide a service account key file");
            (None, None)
        }
    };

    let ai: Option<Arc<dyn InferenceProvider>> = match &config.groq_api_key {
        Some(key) => match GroqClient::new(key.clone()) {
            Ok(client) => {
                info!("✓ Groq client initialized");
                Some(Arc::new(client))
            }
            Err(e) => {
                error!("Failed to initialize Groq client: {e}");
                None
            }
        },
        None => None,
    };

    let port = config.port;
    let state = AppState::new(Arc::new(config), identity, store, ai);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Listening on http://0.0.0.0:{port}");
    info!("Health check: http://0.0.0.0:{port}/health");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the verifier and document store from one credential load; both
/// share the OAuth token cache.
fn init_firebase(
    config: &Config,
) -> CommonResult<(Arc<dyn TokenVerifier>, Arc<dyn DocumentStore>)> {
    let account = ServiceAccount::from_config(config)?;

    let http_client = reqwest::Client::builder()
        .timeout(OUTBOUND_TIMEOUT)
        .build()
        .map_err(|e| smartstudy_common::Error::Config(e.to_string()))?;

    let auth = Arc::new(GoogleAuth::new(http_client.clone(), account)?);
    let verifier = FirebaseAuthVerifier::new(http_client.clone(), auth.clone());
    let store = FirestoreStore::new(http_client, auth);

    Ok((Arc::new(verifier), Arc::new(store)))
}
