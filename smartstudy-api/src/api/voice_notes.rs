//! Voice-note endpoints
//!
//! Upload → transcription → summarization pipeline, plus listing and
//! deletion of the volatile note list. Transcription failures fail the
//! request; summarization failures degrade to fallback content.

use axum::{
    extract::{Multipart, Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use smartstudy_common::types::VoiceNote;

use crate::services::{groq, ChatMessage, ChatRequest, TranscriptionRequest};
use crate::{ApiError, ApiResult, AppState};

const SUMMARY_TEMPERATURE: f32 = 0.5;
const SUMMARY_MAX_TOKENS: u32 = 500;

const SUMMARY_SYSTEM_PROMPT: &str = "You are a helpful study assistant. Extract key points and \
     create a concise summary. Always respond in valid JSON format.";

#[derive(Debug, Serialize)]
pub struct NotesResponse {
    pub notes: Vec<VoiceNote>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct VoiceHealthResponse {
    pub status: String,
    pub groq_api_configured: bool,
    pub groq_client_initialized: bool,
    pub notes_count: usize,
}

/// Uploaded audio payload pulled out of the multipart body.
struct AudioUpload {
    file_name: Option<String>,
    content_type: Option<String>,
    data: Vec<u8>,
}

/// Temp-file extension inferred from the declared MIME type; browsers
/// usually record webm, so that is the default container.
fn extension_for(content_type: Option<&str>) -> &'static str {
    match content_type {
        Some(ct) if ct.contains("mp4") => ".mp4",
        Some(ct) if ct.contains("ogg") => ".ogg",
        Some(ct) if ct.contains("wav") => ".wav",
        _ => ".webm",
    }
}

/// Strip optional markdown code fences the model wraps JSON in despite
/// being told not to.
fn strip_code_fences(raw: &str) -> &str {
    let mut cleaned = raw.trim();
    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest;
    } else if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest;
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest;
    }
    cleaned.trim()
}

#[derive(Debug, Default, Deserialize)]
struct SummaryPayload {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    key_points: Vec<String>,
}

/// Stand-in summary payload used when the summarization call itself
/// fails; shaped like a model response so it flows through the same
/// parsing path.
fn provider_failure_payload(transcript_len: usize) -> String {
    json!({
        "summary": "Transcription completed successfully. AI summary generation encountered an issue.",
        "key_points": [
            format!("Transcript generated with {transcript_len} characters"),
            "Audio processing completed successfully",
        ]
    })
    .to_string()
}

/// Parse the model's summary response, degrading instead of failing:
/// unparseable text and empty key-point lists both produce usable
/// fallback content.
fn parse_summary_response(raw: &str, transcript_len: usize) -> (String, Vec<String>) {
    let cleaned = strip_code_fences(raw);

    match serde_json::from_str::<SummaryPayload>(cleaned) {
        Ok(payload) => {
            let summary = if payload.summary.is_empty() {
                "Summary generated successfully".to_string()
            } else {
                payload.summary
            };
            let key_points = if payload.key_points.is_empty() {
                vec![
                    "Transcript generated successfully".to_string(),
                    format!("Total length: {transcript_len} characters"),
                ]
            } else {
                payload.key_points
            };
            (summary, key_points)
        }
        Err(e) => {
            warn!("summary JSON parsing failed: {e}");
            (
                "Processing completed successfully".to_string(),
                vec![
                    "Audio transcribed successfully".to_string(),
                    format!("Transcript length: {transcript_len} characters"),
                    "AI analysis completed".to_string(),
                ],
            )
        }
    }
}

fn summary_request(transcript: &str) -> ChatRequest {
    ChatRequest {
        model: groq::CHAT_MODEL.to_string(),
        messages: vec![
            ChatMessage::system(SUMMARY_SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Analyze this lecture/study note transcript and provide:\n\
                 1. A brief summary (2-3 sentences)\n\
                 2. 5-7 key points (bullet points)\n\
                 \n\
                 Transcript: {transcript}\n\
                 \n\
                 Respond ONLY in this JSON format (no markdown, no code blocks):\n\
                 {{\n  \"summary\": \"...\",\n  \"key_points\": [\"point1\", \"point2\", \"point3\", \"point4\", \"point5\"]\n}}"
            )),
        ],
        temperature: SUMMARY_TEMPERATURE,
        max_tokens: SUMMARY_MAX_TOKENS,
    }
}

async fn read_audio_field(multipart: &mut Multipart) -> ApiResult<AudioUpload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart payload: {e}")))?
    {
        if field.name() != Some("audio") {
            continue;
        }

        let file_name = field.file_name().map(|s| s.to_string());
        let content_type = field.content_type().map(|s| s.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {e}")))?
            .to_vec();

        return Ok(AudioUpload {
            file_name,
            content_type,
            data,
        });
    }

    Err(ApiError::BadRequest("Missing audio upload".to_string()))
}

/// POST /api/voice/transcribe
pub async fn transcribe_audio(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<VoiceNote>> {
    let ai = state.ai()?;

    let upload = read_audio_field(&mut multipart).await?;
    info!(
        file = upload.file_name.as_deref().unwrap_or("<unnamed>"),
        bytes = upload.data.len(),
        "received audio upload"
    );

    if upload.data.is_empty() {
        return Err(ApiError::BadRequest("Audio file is empty".to_string()));
    }

    // Stage the upload through a scoped temp file; the guard removes it
    // on every exit path, including the error returns below.
    let extension = extension_for(upload.content_type.as_deref());
    let temp_file = tempfile::Builder::new()
        .prefix("smartstudy-audio-")
        .suffix(extension)
        .tempfile()?;
    std::fs::write(temp_file.path(), &upload.data)?;
    let audio_bytes = std::fs::read(temp_file.path())?;

    let transcript = ai
        .transcribe(TranscriptionRequest {
            file_name: upload
                .file_name
                .unwrap_or_else(|| format!("recording{extension}")),
            data: audio_bytes,
            model: groq::TRANSCRIPTION_MODEL.to_string(),
            language: "en".to_string(),
        })
        .await
        .map_err(|e| {
            ApiError::Upstream(format!(
                "Transcription failed: {e}. Check your GROQ_API_KEY and audio format."
            ))
        })?;

    if transcript.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Transcription resulted in empty text. Please speak louder or check your microphone."
                .to_string(),
        ));
    }

    // Summarization is best-effort: a provider failure substitutes
    // fallback content rather than failing the whole request.
    let raw_summary = match ai.chat_completion(summary_request(&transcript)).await {
        Ok(text) => text,
        Err(e) => {
            warn!("AI summary generation failed: {e}");
            provider_failure_payload(transcript.len())
        }
    };

    let (summary, key_points) = parse_summary_response(&raw_summary, transcript.len());

    let now = Utc::now();
    let note = VoiceNote {
        id: format!("note_{}", now.timestamp_millis()),
        title: format!("Voice Note - {}", now.format("%b %d, %Y %I:%M %p")),
        transcript,
        summary,
        key_points,
        created_at: now.to_rfc3339(),
    };

    state.notes.push(note.clone()).await;
    info!(id = %note.id, "voice note saved");

    Ok(Json(note))
}

/// GET /api/voice/notes
pub async fn list_notes(State(state): State<AppState>) -> Json<NotesResponse> {
    Json(NotesResponse {
        notes: state.notes.list().await,
    })
}

/// DELETE /api/voice/notes/:id
pub async fn delete_note(
    State(state): State<AppState>,
    Path(note_id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    if !state.notes.remove(&note_id).await {
        return Err(ApiError::NotFound("Note not found".to_string()));
    }

    info!(id = %note_id, "voice note deleted");

    Ok(Json(DeleteResponse {
        message: "Note deleted successfully".to_string(),
    }))
}

/// GET /api/voice/health
pub async fn voice_health(State(state): State<AppState>) -> Json<VoiceHealthResponse> {
    Json(VoiceHealthResponse {
        status: "healthy".to_string(),
        groq_api_configured: state.config.groq_api_key.is_some(),
        groq_client_initialized: state.ai.is_some(),
        notes_count: state.notes.count().await,
    })
}

/// Build voice-note routes (no authentication)
pub fn voice_notes_routes() -> Router<AppState> {
    Router::new()
        .route("/api/voice/transcribe", post(transcribe_audio))
        .route("/api/voice/notes", get(list_notes))
        .route("/api/voice/notes/:id", delete(delete_note))
        .route("/api/voice/health", get(voice_health))
}
