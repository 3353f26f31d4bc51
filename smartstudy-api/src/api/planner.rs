//! Study-plan generation endpoint

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::services::{groq, ChatMessage, ChatRequest};
use crate::{ApiResult, AppState};

const PLAN_TEMPERATURE: f32 = 0.6;
const PLAN_MAX_TOKENS: u32 = 400;

#[derive(Debug, Deserialize)]
pub struct StudyRequest {
    pub subjects: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    /// Raw generated text, returned verbatim
    pub plan: String,
}

/// POST /api/planner/generate
///
/// Builds the fixed prompt from the subject list and returns whatever
/// the model generates. An empty subject list is allowed and simply
/// produces a degenerate prompt.
pub async fn generate_plan(
    State(state): State<AppState>,
    Json(request): Json<StudyRequest>,
) -> ApiResult<Json<PlanResponse>> {
    let ai = state.ai()?;

    let prompt = format!(
        "\nCreate a simple 7-day study plan.\nSubjects: {}\n\nGive day-wise plan in bullet points.\n",
        request.subjects.join(", ")
    );

    let plan = ai
        .chat_completion(ChatRequest {
            model: groq::CHAT_MODEL.to_string(),
            messages: vec![ChatMessage::user(prompt)],
            temperature: PLAN_TEMPERATURE,
            max_tokens: PLAN_MAX_TOKENS,
        })
        .await?;

    Ok(Json(PlanResponse { plan }))
}

/// Build planner routes
pub fn planner_routes() -> Router<AppState> {
    Router::new().route("/api/planner/generate", post(generate_plan))
}
