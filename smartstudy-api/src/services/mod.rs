//! External service clients
//!
//! Each collaborator is reached over HTTPS and sits behind a trait so
//! the handlers can be exercised without network access.

pub mod firebase;
pub mod groq;

pub use firebase::{AuthUser, FirebaseAuthVerifier, FirebaseError, GoogleAuth, TokenVerifier};
pub use groq::GroqClient;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// AI provider errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// One chat message in the OpenAI-compatible wire shape.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A bounded chat-completion request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// A speech-to-text request carrying the raw audio bytes.
#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    pub file_name: String,
    pub data: Vec<u8>,
    pub model: String,
    pub language: String,
}

/// Text generation and transcription, as offered by the Groq API.
///
/// No retries at this layer: callers decide whether a failure is fatal
/// (planner, transcription) or degradable (summarization).
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Run a chat completion and return the raw generated text.
    async fn chat_completion(&self, request: ChatRequest) -> Result<String, ProviderError>;

    /// Transcribe an audio payload and return the transcript text.
    async fn transcribe(&self, request: TranscriptionRequest) -> Result<String, ProviderError>;
}
