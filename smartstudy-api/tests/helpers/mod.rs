//! Shared helpers for API integration tests
//!
//! Builds the real router over an in-memory document store, a static
//! token verifier, and scripted AI provider stubs, so every endpoint
//! can be exercised without network access.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use serde_json::Value;

use smartstudy_api::services::{
    AuthUser, ChatRequest, FirebaseError, InferenceProvider, ProviderError, TokenVerifier,
    TranscriptionRequest,
};
use smartstudy_api::store::{fields, DocumentStore, MemoryStore};
use smartstudy_api::{build_router, AppState};
use smartstudy_common::{Config, Environment};

pub const MULTIPART_BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

/// Verifier with a fixed token → identity table.
pub struct StaticVerifier {
    users: HashMap<String, AuthUser>,
}

impl StaticVerifier {
    /// Entries are `(token, uid, email)`.
    pub fn new(entries: &[(&str, &str, &str)]) -> Arc<Self> {
        let users = entries
            .iter()
            .map(|(token, uid, email)| {
                (
                    token.to_string(),
                    AuthUser {
                        uid: uid.to_string(),
                        email: email.to_string(),
                    },
                )
            })
            .collect();
        Arc::new(Self { users })
    }
}

#[async_trait]
impl TokenVerifier for StaticVerifier {
    async fn verify(&self, id_token: &str) -> Result<AuthUser, FirebaseError> {
        self.users
            .get(id_token)
            .cloned()
            .ok_or_else(|| FirebaseError::Api(400, "INVALID_ID_TOKEN".to_string()))
    }
}

/// Scripted outcome for one stubbed provider call.
pub enum StubResponse {
    Text(String),
    Fail(String),
}

impl StubResponse {
    pub fn text(value: &str) -> Self {
        StubResponse::Text(value.to_string())
    }

    pub fn fail(message: &str) -> Self {
        StubResponse::Fail(message.to_string())
    }

    fn resolve(&self) -> Result<String, ProviderError> {
        match self {
            StubResponse::Text(text) => Ok(text.clone()),
            StubResponse::Fail(message) => Err(ProviderError::Api(500, message.clone())),
        }
    }
}

/// AI provider stub recording every chat request it sees.
pub struct StubAi {
    pub transcript: StubResponse,
    pub chat: StubResponse,
    pub chat_requests: Mutex<Vec<ChatRequest>>,
}

impl StubAi {
    pub fn new(transcript: StubResponse, chat: StubResponse) -> Arc<Self> {
        Arc::new(Self {
            transcript,
            chat,
            chat_requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl InferenceProvider for StubAi {
    async fn chat_completion(&self, request: ChatRequest) -> Result<String, ProviderError> {
        self.chat_requests
            .lock()
            .expect("chat request log poisoned")
            .push(request);
        self.chat.resolve()
    }

    async fn transcribe(&self, _request: TranscriptionRequest) -> Result<String, ProviderError> {
        self.transcript.resolve()
    }
}

pub fn test_config(groq_configured: bool) -> Config {
    Config {
        environment: Environment::Production,
        port: 0,
        groq_api_key: groq_configured.then(|| "gsk_test".to_string()),
        allowed_origins: Config::default_allowed_origins(),
        firebase_service_account: None,
        firebase_service_account_path: "serviceAccountKey.json".into(),
    }
}

/// Assemble the router from whichever collaborators a test supplies.
pub fn build_app(
    identity: Option<Arc<dyn TokenVerifier>>,
    store: Option<Arc<dyn DocumentStore>>,
    ai: Option<Arc<dyn InferenceProvider>>,
) -> Router {
    let groq_configured = ai.is_some();
    let state = AppState::new(
        Arc::new(test_config(groq_configured)),
        identity,
        store,
        ai,
    );
    build_router(state)
}

/// Memory store pre-seeded with three user profiles. Bob has no `name`
/// field, exercising the email local-part fallback.
pub async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());

    store
        .set(
            "users",
            "alice",
            fields(serde_json::json!({
                "name": "Alice",
                "email": "alice@example.com",
                "online": true,
                "studyPreferences": {
                    "subject": "Math",
                    "level": "Advanced",
                    "availability": "Evenings",
                    "studyStyle": "Focused",
                },
            })),
        )
        .await
        .expect("seed alice");

    store
        .set(
            "users",
            "bob",
            fields(serde_json::json!({
                "email": "bob.smith@example.com",
                "online": false,
                "studyPreferences": { "subject": "Physics" },
            })),
        )
        .await
        .expect("seed bob");

    store
        .set(
            "users",
            "carol",
            fields(serde_json::json!({
                "name": "Carol",
                "email": "carol@example.com",
            })),
        )
        .await
        .expect("seed carol");

    store
}

pub fn standard_verifier() -> Arc<StaticVerifier> {
    StaticVerifier::new(&[
        ("alice-token", "alice", "alice@example.com"),
        ("bob-token", "bob", "bob.smith@example.com"),
        ("carol-token", "carol", "carol@example.com"),
    ])
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request should build")
}

pub fn get_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request should build")
}

pub fn post_json(uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request should build")
}

pub fn post_empty(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request should build")
}

pub fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .expect("request should build")
}

/// Multipart upload with a single `audio` field.
pub fn multipart_request(
    uri: &str,
    file_name: &str,
    content_type: &str,
    data: &[u8],
) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{MULTIPART_BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"audio\"; filename=\"{file_name}\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request should build")
}

/// Extract JSON body from a response
pub async fn json_body(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("should read body");
    serde_json::from_slice(&bytes).expect("should parse JSON")
}
