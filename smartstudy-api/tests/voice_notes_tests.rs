//! Integration tests for the voice-note pipeline
//!
//! Covers the transcribe pipeline's fatal and degradable failure
//! modes, note listing/deletion, and the per-group health endpoint.

mod helpers;

use axum::http::StatusCode;
use axum::Router;
use serde_json::json;
use tower::util::ServiceExt; // for `oneshot`

use helpers::*;

const FAKE_AUDIO: &[u8] = b"RIFFxxxxWAVEfmt fake-audio-payload";

fn voice_app(transcript: StubResponse, chat: StubResponse) -> Router {
    build_app(None, None, Some(StubAi::new(transcript, chat)))
}

fn upload() -> axum::http::Request<axum::body::Body> {
    multipart_request("/api/voice/transcribe", "memo.wav", "audio/wav", FAKE_AUDIO)
}

// =============================================================================
// Transcription pipeline
// =============================================================================

#[tokio::test]
async fn transcribe_without_key_is_config_error() {
    let app = build_app(None, None, None);

    let response = app.clone().oneshot(upload()).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"]["code"], "CONFIG_ERROR");

    // No note was created
    let response = app.oneshot(get("/api/voice/notes")).await.unwrap();
    let body = json_body(response.into_body()).await;
    assert_eq!(body["notes"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn empty_upload_is_rejected() {
    let app = voice_app(StubResponse::text("unused"), StubResponse::text("unused"));

    let request = multipart_request("/api/voice/transcribe", "memo.webm", "audio/webm", b"");
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.into_body()).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("empty"));

    let response = app.oneshot(get("/api/voice/health")).await.unwrap();
    let body = json_body(response.into_body()).await;
    assert_eq!(body["notes_count"], 0);
}

#[tokio::test]
async fn missing_audio_field_is_rejected() {
    let app = voice_app(StubResponse::text("unused"), StubResponse::text("unused"));

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/voice/transcribe")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )
        .body(axum::body::Body::from(format!(
            "--{MULTIPART_BOUNDARY}--\r\n"
        )))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn successful_pipeline_returns_full_note() {
    let summary_json =
        json!({"summary": "A short talk about osmosis.", "key_points": ["a", "b", "c", "d", "e"]});
    let app = voice_app(
        StubResponse::text("Today we discussed osmosis in plant cells."),
        StubResponse::text(&summary_json.to_string()),
    );

    let response = app.clone().oneshot(upload()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let note = json_body(response.into_body()).await;
    assert!(note["id"].as_str().unwrap().starts_with("note_"));
    assert!(note["title"].as_str().unwrap().starts_with("Voice Note - "));
    assert_eq!(
        note["transcript"],
        "Today we discussed osmosis in plant cells."
    );
    assert_eq!(note["summary"], "A short talk about osmosis.");
    assert_eq!(note["key_points"].as_array().unwrap().len(), 5);
    assert!(note["created_at"].is_string());

    // The note is listed afterwards
    let response = app.oneshot(get("/api/voice/notes")).await.unwrap();
    let body = json_body(response.into_body()).await;
    let notes = body["notes"].as_array().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["id"], note["id"]);
}

#[tokio::test]
async fn transcription_failure_fails_the_request() {
    let app = voice_app(
        StubResponse::fail("audio decode error"),
        StubResponse::text("unused"),
    );

    let response = app.clone().oneshot(upload()).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("Transcription failed"));
    assert!(message.contains("audio decode error"));

    let response = app.oneshot(get("/api/voice/notes")).await.unwrap();
    let body = json_body(response.into_body()).await;
    assert_eq!(body["notes"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn whitespace_transcript_is_a_quality_error() {
    let app = voice_app(StubResponse::text("   \n "), StubResponse::text("unused"));

    let response = app.oneshot(upload()).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response.into_body()).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("empty text"));
}

#[tokio::test]
async fn summarization_failure_degrades_to_fallback() {
    let app = voice_app(
        StubResponse::text("A transcript that survived."),
        StubResponse::fail("rate limited"),
    );

    let response = app.oneshot(upload()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let note = json_body(response.into_body()).await;
    assert_eq!(note["transcript"], "A transcript that survived.");
    assert!(note["summary"]
        .as_str()
        .unwrap()
        .contains("encountered an issue"));
    assert!(!note["key_points"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unparseable_summary_degrades_to_fallback() {
    let app = voice_app(
        StubResponse::text("A transcript."),
        StubResponse::text("Sure! Here are your key points: ..."),
    );

    let response = app.oneshot(upload()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let note = json_body(response.into_body()).await;
    assert_eq!(note["summary"], "Processing completed successfully");
    assert_eq!(note["key_points"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn fenced_summary_json_is_parsed() {
    let app = voice_app(
        StubResponse::text("A transcript."),
        StubResponse::text("```json\n{\"summary\": \"Fenced.\", \"key_points\": [\"k1\"]}\n```"),
    );

    let response = app.oneshot(upload()).await.unwrap();
    let note = json_body(response.into_body()).await;
    assert_eq!(note["summary"], "Fenced.");
    assert_eq!(note["key_points"][0], "k1");
}

// =============================================================================
// Listing and deletion
// =============================================================================

#[tokio::test]
async fn delete_missing_note_is_not_found() {
    let app = voice_app(StubResponse::text("t"), StubResponse::text("{}"));

    let response = app
        .clone()
        .oneshot(delete("/api/voice/notes/note_12345"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_exactly_one_note() {
    let summary = json!({"summary": "s", "key_points": ["k"]}).to_string();
    let app = voice_app(StubResponse::text("first note"), StubResponse::text(&summary));

    let response = app.clone().oneshot(upload()).await.unwrap();
    let note = json_body(response.into_body()).await;
    let note_id = note["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(delete(&format!("/api/voice/notes/{note_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["message"], "Note deleted successfully");

    // Gone from the listing, count back to zero
    let response = app.clone().oneshot(get("/api/voice/notes")).await.unwrap();
    let body = json_body(response.into_body()).await;
    assert_eq!(body["notes"].as_array().unwrap().len(), 0);

    // Deleting again is a 404 and leaves the count unchanged
    let response = app
        .clone()
        .oneshot(delete(&format!("/api/voice/notes/{note_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.oneshot(get("/api/voice/health")).await.unwrap();
    let body = json_body(response.into_body()).await;
    assert_eq!(body["notes_count"], 0);
}

// =============================================================================
// Voice health
// =============================================================================

#[tokio::test]
async fn voice_health_reports_client_state() {
    let app = build_app(None, None, None);
    let response = app.oneshot(get("/api/voice/health")).await.unwrap();
    let body = json_body(response.into_body()).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["groq_api_configured"], false);
    assert_eq!(body["groq_client_initialized"], false);
    assert_eq!(body["notes_count"], 0);

    let app = voice_app(StubResponse::text("t"), StubResponse::text("{}"));
    let response = app.oneshot(get("/api/voice/health")).await.unwrap();
    let body = json_body(response.into_body()).await;
    assert_eq!(body["groq_api_configured"], true);
    assert_eq!(body["groq_client_initialized"], true);
}
