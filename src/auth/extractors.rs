use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use tracing::{debug, warn};

use super::cookie::extract_session_token;
use crate::{error::AppError, state::AppState, users::User};

/// Resolves the session cookie into a user.
///
/// Returns `Ok(None)` for anonymous requests: no cookie, a token that fails
/// verification, or a token whose user no longer exists. Storage failures are
/// errors, never anonymity.
pub async fn resolve_identity(state: &AppState, headers: &HeaderMap) -> Result<Option<User>, AppError> {
    let Some(token) = extract_session_token(headers) else {
        return Ok(None);
    };
    let Some(user_id) = state.keys.user_id(&token) else {
        debug!("invalid or expired session token");
        return Ok(None);
    };
    let user = state.users.find_by_id(user_id).await?;
    if user.is_none() {
        warn!(%user_id, "session token names a missing user");
    }
    Ok(user)
}

/// Guard for protected routes; rejects anonymous requests with 401 before the
/// handler body runs.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match resolve_identity(state, &parts.headers).await? {
            Some(user) => Ok(AuthUser(user)),
            None => Err(AppError::Unauthenticated("Authentication required")),
        }
    }
}
