//! Study-buddy endpoints
//!
//! Profile discovery, the request/accept/decline workflow, connection
//! listing, and preference updates. Every route requires a verified
//! bearer token.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use smartstudy_common::types::{
    email_local_part, BuddyInfo, MyBuddy, PendingRequest, StudyPreferences,
};

use crate::services::AuthUser;
use crate::store::{fields, Document, FieldFilter};
use crate::{ApiError, ApiResult, AppState};

const USERS_COLLECTION: &str = "users";
const REQUESTS_COLLECTION: &str = "buddy_requests";

// Simulated match score range; recomputed on every listing.
const MATCH_SCORE_MIN: i64 = 75;
const MATCH_SCORE_MAX: i64 = 98;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuddyRequestBody {
    pub buddy_id: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct BuddiesResponse {
    pub buddies: Vec<BuddyInfo>,
}

#[derive(Debug, Serialize)]
pub struct RequestsResponse {
    pub requests: Vec<PendingRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestCreatedResponse {
    pub success: bool,
    pub message: String,
    pub request_id: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct PreferencesResponse {
    pub success: bool,
    pub preferences: StudyPreferences,
}

#[derive(Debug, Serialize)]
pub struct MyBuddiesResponse {
    pub buddies: Vec<MyBuddy>,
}

/// Study preferences from a profile document, display defaults applied.
fn study_preferences(doc: &Document) -> StudyPreferences {
    doc.get("studyPreferences")
        .cloned()
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default()
}

/// Profile display name, falling back to the email local part.
fn display_name(doc: &Document, email: &str) -> String {
    doc.get_str("name")
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| email_local_part(email).to_string())
}

/// Subcollection path holding one user's connection edges.
fn buddies_collection(uid: &str) -> String {
    format!("{USERS_COLLECTION}/{uid}/buddies")
}

/// GET /api/study-buddy/available
///
/// Every profile except the caller's, with a per-request simulated
/// match score, sorted best-first.
pub async fn available_buddies(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<BuddiesResponse>> {
    let store = state.document_store()?;
    let users = store.stream(USERS_COLLECTION, &[]).await?;

    let mut rng = rand::thread_rng();
    let mut buddies = Vec::new();
    for doc in users {
        if doc.id == user.uid {
            continue;
        }

        let prefs = study_preferences(&doc);
        let email = doc.get_str("email").unwrap_or_default();
        let name = display_name(&doc, &email);
        let online = doc.get_bool("online").unwrap_or(false);
        buddies.push(BuddyInfo {
            id: doc.id,
            name,
            email,
            subject: prefs.subject,
            level: prefs.level,
            availability: prefs.availability,
            study_style: prefs.study_style,
            online,
            match_score: rng.gen_range(MATCH_SCORE_MIN..=MATCH_SCORE_MAX),
        });
    }

    buddies.sort_by(|a, b| b.match_score.cmp(&a.match_score));

    Ok(Json(BuddiesResponse { buddies }))
}

/// POST /api/study-buddy/request
pub async fn send_buddy_request(
    user: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<BuddyRequestBody>,
) -> ApiResult<Json<RequestCreatedResponse>> {
    if body.buddy_id.is_empty() {
        return Err(ApiError::BadRequest("Buddy ID required".to_string()));
    }

    let store = state.document_store()?;
    let now = Utc::now().to_rfc3339();
    let request_id = store
        .create(
            REQUESTS_COLLECTION,
            fields(json!({
                "fromUserId": user.uid,
                "fromUserEmail": user.email,
                "toUserId": body.buddy_id,
                "message": body.message,
                "status": "pending",
                "createdAt": now,
                "updatedAt": now,
            })),
        )
        .await?;

    info!(%request_id, to = %body.buddy_id, "buddy request sent");

    Ok(Json(RequestCreatedResponse {
        success: true,
        message: "Request sent successfully".to_string(),
        request_id,
    }))
}

/// GET /api/study-buddy/requests
///
/// Pending requests addressed to the caller, enriched with each
/// sender's profile. A missing sender document is tolerated; defaults
/// apply.
pub async fn pending_requests(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<RequestsResponse>> {
    let store = state.document_store()?;
    let docs = store
        .stream(
            REQUESTS_COLLECTION,
            &[
                FieldFilter::eq("toUserId", user.uid.as_str()),
                FieldFilter::eq("status", "pending"),
            ],
        )
        .await?;

    let mut requests = Vec::new();
    for doc in docs {
        let from_user_id = doc.get_str("fromUserId").unwrap_or_default();
        let from_user_email = doc.get_str("fromUserEmail").unwrap_or_default();
        let sender = store.get(USERS_COLLECTION, &from_user_id).await?;

        let (from_user_name, subject) = match &sender {
            Some(profile) => (
                display_name(profile, &from_user_email),
                study_preferences(profile).subject,
            ),
            None => (
                email_local_part(&from_user_email).to_string(),
                StudyPreferences::default().subject,
            ),
        };

        requests.push(PendingRequest {
            id: doc.id.clone(),
            from_user_id,
            from_user_name,
            from_user_email,
            message: doc.get_str("message").unwrap_or_default(),
            created_at: doc.get_str("createdAt"),
            subject,
        });
    }

    Ok(Json(RequestsResponse { requests }))
}

/// Load a request and check the caller owns its receiving side.
async fn load_owned_request(
    state: &AppState,
    request_id: &str,
    caller_uid: &str,
) -> ApiResult<Document> {
    let store = state.document_store()?;
    let doc = store
        .get(REQUESTS_COLLECTION, request_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Request not found".to_string()))?;

    if doc.get_str("toUserId").as_deref() != Some(caller_uid) {
        return Err(ApiError::Forbidden("Unauthorized".to_string()));
    }

    Ok(doc)
}

/// POST /api/study-buddy/accept/:id
///
/// `pending` requests transition to `accepted` and the mirrored
/// connection edges are written. Re-accepting an `accepted` request is
/// an idempotent success; a `declined` request is terminal and cannot
/// be accepted.
pub async fn accept_request(
    user: AuthUser,
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let doc = load_owned_request(&state, &request_id, &user.uid).await?;

    match doc.get_str("status").as_deref() {
        Some("accepted") => {
            return Ok(Json(StatusResponse {
                success: true,
                message: "Request already accepted".to_string(),
            }))
        }
        Some("declined") => {
            return Err(ApiError::Conflict(
                "Request was already declined".to_string(),
            ))
        }
        _ => {}
    }

    let store = state.document_store()?;
    let now = Utc::now().to_rfc3339();
    store
        .update(
            REQUESTS_COLLECTION,
            &request_id,
            fields(json!({ "status": "accepted", "updatedAt": now })),
        )
        .await?;

    // Two separate writes, not a transaction: a crash here leaves an
    // asymmetric connection visible to one participant only.
    let from_user_id = doc.get_str("fromUserId").unwrap_or_default();
    let edge = fields(json!({ "createdAt": now, "lastInteraction": now }));
    store
        .set(&buddies_collection(&user.uid), &from_user_id, edge.clone())
        .await?;
    store
        .set(&buddies_collection(&from_user_id), &user.uid, edge)
        .await?;

    info!(%request_id, "buddy request accepted");

    Ok(Json(StatusResponse {
        success: true,
        message: "Request accepted".to_string(),
    }))
}

/// POST /api/study-buddy/decline/:id
///
/// Same ownership rules as accept; declining a `declined` request is
/// idempotent, an `accepted` request is terminal.
pub async fn decline_request(
    user: AuthUser,
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let doc = load_owned_request(&state, &request_id, &user.uid).await?;

    match doc.get_str("status").as_deref() {
        Some("declined") => {
            return Ok(Json(StatusResponse {
                success: true,
                message: "Request already declined".to_string(),
            }))
        }
        Some("accepted") => {
            return Err(ApiError::Conflict(
                "Request was already accepted".to_string(),
            ))
        }
        _ => {}
    }

    let store = state.document_store()?;
    let now = Utc::now().to_rfc3339();
    store
        .update(
            REQUESTS_COLLECTION,
            &request_id,
            fields(json!({ "status": "declined", "updatedAt": now })),
        )
        .await?;

    info!(%request_id, "buddy request declined");

    Ok(Json(StatusResponse {
        success: true,
        message: "Request declined".to_string(),
    }))
}

/// GET /api/study-buddy/my-buddies
pub async fn my_buddies(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<MyBuddiesResponse>> {
    let store = state.document_store()?;
    let edges = store.stream(&buddies_collection(&user.uid), &[]).await?;

    let mut buddies = Vec::new();
    for edge in edges {
        let profile = store.get(USERS_COLLECTION, &edge.id).await?;

        let (name, email, subject, online) = match &profile {
            Some(doc) => {
                let email = doc.get_str("email").unwrap_or_default();
                (
                    display_name(doc, &email),
                    email,
                    study_preferences(doc).subject,
                    doc.get_bool("online").unwrap_or(false),
                )
            }
            None => (
                String::new(),
                String::new(),
                StudyPreferences::default().subject,
                false,
            ),
        };

        buddies.push(MyBuddy {
            id: edge.id.clone(),
            name,
            email,
            subject,
            online,
            last_interaction: edge.get_str("lastInteraction"),
            connected_since: edge.get_str("createdAt"),
        });
    }

    Ok(Json(MyBuddiesResponse { buddies }))
}

/// POST /api/study-buddy/preferences
///
/// Wholesale overwrite of the caller's preferences sub-document.
pub async fn update_preferences(
    user: AuthUser,
    State(state): State<AppState>,
    Json(preferences): Json<StudyPreferences>,
) -> ApiResult<Json<PreferencesResponse>> {
    let store = state.document_store()?;
    let now = Utc::now().to_rfc3339();

    store
        .update(
            USERS_COLLECTION,
            &user.uid,
            fields(json!({
                "studyPreferences": preferences.clone(),
                "updatedAt": now,
            })),
        )
        .await?;

    Ok(Json(PreferencesResponse {
        success: true,
        preferences,
    }))
}

/// Build study-buddy routes
pub fn study_buddy_routes() -> Router<AppState> {
    Router::new()
        .route("/api/study-buddy/available", get(available_buddies))
        .route("/api/study-buddy/request", post(send_buddy_request))
        .route("/api/study-buddy/requests", get(pending_requests))
        .route("/api/study-buddy/accept/:id", post(accept_request))
        .route("/api/study-buddy/decline/:id", post(decline_request))
        .route("/api/study-buddy/my-buddies", get(my_buddies))
        .route("/api/study-buddy/preferences", post(update_preferences))
}
