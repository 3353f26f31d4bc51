//! Groq API client
//!
//! Chat completions and Whisper transcription over Groq's
//! OpenAI-compatible REST surface.

use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use async_trait::async_trait;

use super::{ChatRequest, InferenceProvider, ProviderError, TranscriptionRequest};

const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Chat model used for planner output and note summarization.
pub const CHAT_MODEL: &str = "llama-3.3-70b-versatile";

/// Whisper model used for voice-note transcription.
pub const TRANSCRIPTION_MODEL: &str = "whisper-large-v3";

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Groq API client
pub struct GroqClient {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GroqClient {
    pub fn new(api_key: String) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            base_url: GROQ_BASE_URL.to_string(),
        })
    }
}

#[async_trait]
impl InferenceProvider for GroqClient {
    async fn chat_completion(&self, request: ChatRequest) -> Result<String, ProviderError> {
        let body = json!({
            "model": request.model,
            "messages": request.messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        tracing::debug!(model = %request.model, "requesting chat completion");

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(status.as_u16(), error_text));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::Parse("completion contained no choices".to_string()))
    }

    async fn transcribe(&self, request: TranscriptionRequest) -> Result<String, ProviderError> {
        let part = reqwest::multipart::Part::bytes(request.data).file_name(request.file_name);
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", request.model)
            .text("response_format", "json")
            .text("language", request.language);

        let response = self
            .http_client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(status.as_u16(), error_text));
        }

        let transcription: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        tracing::info!(
            characters = transcription.text.len(),
            "transcription complete"
        );

        Ok(transcription.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ChatMessage;

    #[test]
    fn test_client_creation() {
        let client = GroqClient::new("test_key".to_string());
        assert!(client.is_ok());
    }

    #[test]
    fn chat_messages_serialize_to_wire_shape() {
        let message = ChatMessage::user("hello");
        let value = serde_json::to_value(&message).expect("should serialize");
        assert_eq!(value["role"], "user");
        assert_eq!(value["content"], "hello");
    }

    #[test]
    fn completion_response_parses_first_choice() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"Day 1: review"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(raw).expect("should parse");
        assert_eq!(parsed.choices[0].message.content, "Day 1: review");
    }
}
