//! Service banner, health, and CORS-probe endpoints

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// "initialized" when Firebase credentials loaded at startup
    pub firebase: String,
    pub groq_api_configured: bool,
    pub environment: String,
    /// Seconds since service start
    pub uptime_seconds: u64,
    pub routes: Vec<String>,
}

/// GET /
///
/// Service banner with the endpoint map the frontend bootstraps from.
pub async fn read_root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": "SmartStudy API is running!",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment.as_str(),
        "endpoints": {
            "health": "/health",
            "planner_generate": "/api/planner/generate",
            "study_buddy": "/api/study-buddy",
            "voice_transcribe": "/api/voice/transcribe",
            "voice_health": "/api/voice/health",
        }
    }))
}

/// GET /health
///
/// Process-level status: collaborator configuration and uptime.
/// Credential-load failures at startup show up here rather than
/// crashing the process.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);

    Json(HealthResponse {
        status: "healthy".to_string(),
        firebase: if state.identity.is_some() {
            "initialized".to_string()
        } else {
            "not initialized".to_string()
        },
        groq_api_configured: state.config.groq_api_key.is_some(),
        environment: state.config.environment.as_str().to_string(),
        uptime_seconds: uptime.num_seconds().max(0) as u64,
        routes: vec![
            "planner".to_string(),
            "study_buddy".to_string(),
            "voice_notes".to_string(),
        ],
    })
}

/// GET /test-cors
pub async fn test_cors(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": "CORS is working!",
        "cors_enabled": true,
        "test": "success",
        "environment": state.config.environment.as_str(),
    }))
}

/// Build root-level routes (no authentication)
pub fn root_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(read_root))
        .route("/health", get(health_check))
        .route("/test-cors", get(test_cors))
}
