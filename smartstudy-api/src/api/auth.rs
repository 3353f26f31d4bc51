//! Bearer-token authentication extractor
//!
//! Every study-buddy handler takes an `AuthUser` argument; extraction
//! performs the header parsing and the identity-provider round trip,
//! so handlers never see an unauthenticated request.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::services::AuthUser;
use crate::{ApiError, AppState};

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("Invalid authorization header".to_string()))?;

        let verifier = state.identity.as_ref().ok_or_else(|| {
            ApiError::Unauthorized("Identity provider not initialized".to_string())
        })?;

        verifier
            .verify(token)
            .await
            .map_err(|e| ApiError::Unauthorized(format!("Invalid token: {e}")))
    }
}
