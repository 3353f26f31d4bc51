//! smartstudy-api library interface
//!
//! Exposes the application state and router for integration testing.

pub mod api;
pub mod error;
pub mod services;
pub mod store;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use smartstudy_common::{Config, Environment};

use crate::services::{InferenceProvider, TokenVerifier};
use crate::store::{DocumentStore, NoteStore};

// Whisper rejects anything larger, so there is no point accepting more.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Bearer-token verifier; `None` when Firebase credentials failed
    /// to load (surfaced via /health, not a startup failure).
    pub identity: Option<Arc<dyn TokenVerifier>>,
    /// Document database; absent together with `identity`.
    pub store: Option<Arc<dyn DocumentStore>>,
    /// AI provider; `None` without a GROQ_API_KEY.
    pub ai: Option<Arc<dyn InferenceProvider>>,
    /// Volatile voice-note list.
    pub notes: NoteStore,
    /// Service startup timestamp for uptime reporting.
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        identity: Option<Arc<dyn TokenVerifier>>,
        store: Option<Arc<dyn DocumentStore>>,
        ai: Option<Arc<dyn InferenceProvider>>,
    ) -> Self {
        Self {
            config,
            identity,
            store,
            ai,
            notes: NoteStore::new(),
            startup_time: Utc::now(),
        }
    }

    /// The AI provider, or the configuration error every AI-backed
    /// endpoint reports when the key is missing.
    pub fn ai(&self) -> ApiResult<&Arc<dyn InferenceProvider>> {
        self.ai.as_ref().ok_or_else(|| {
            ApiError::Config("GROQ_API_KEY not configured. Add it to your .env file.".to_string())
        })
    }

    /// The document store, or a configuration error when Firebase
    /// initialization failed at startup.
    pub fn document_store(&self) -> ApiResult<&Arc<dyn DocumentStore>> {
        self.store.as_ref().ok_or_else(|| {
            ApiError::Config("Document store not initialized. Check Firebase credentials.".to_string())
        })
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .merge(api::root_routes())
        .merge(api::planner_routes())
        .merge(api::study_buddy_routes())
        .merge(api::voice_notes_routes())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Cross-origin policy: explicit allow-list in production, permissive
/// in development (credentials cannot ride along with a wildcard).
fn cors_layer(config: &Config) -> CorsLayer {
    if config.environment == Environment::Development {
        warn!("DEVELOPMENT MODE: allowing ALL origins");
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
