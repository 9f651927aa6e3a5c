use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{
        normalize_email, LoginRequest, PublicUser, SignupRequest, UpdateProfileRequest,
        ViewsResponse,
    },
    repo_types::NewUser,
};
use crate::{
    auth::{
        attach_session_cookie,
        cookie::extract_session_token,
        password::{hash_password, verify_dummy, verify_password},
        AuthUser,
    },
    error::{ApiMessage, ApiResponse, AppError, AppResult},
    extract::{JsonBody, Page, QueryParams},
    state::AppState,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/signup", post(signup))
        .route("/users/login", post(login))
        .route("/users/logout", post(logout))
        .route("/users/me", get(get_me).put(update_me))
        .route("/users/me/views", patch(increment_my_views))
}

#[instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<SignupRequest>,
) -> AppResult<(StatusCode, HeaderMap, Json<ApiResponse<PublicUser>>)> {
    let valid = payload.validate().map_err(AppError::validation)?;

    if state.users.find_by_email(&valid.email).await?.is_some() {
        warn!(email = %valid.email, "email already registered");
        return Err(AppError::Conflict("Email already registered"));
    }

    let password_hash = hash_password(&valid.password)?;
    let created = state
        .users
        .create(NewUser {
            email: valid.email,
            password_hash,
            name: valid.name,
            bio: valid.bio,
            artist_type: valid.artist_type,
            profile_picture: valid.profile_picture,
        })
        .await?;
    // A concurrent signup may win between the check and the insert.
    let Some(user) = created else {
        return Err(AppError::Conflict("Email already registered"));
    };

    let token = state.keys.issue(user.id)?;
    let mut headers = HeaderMap::new();
    attach_session_cookie(&mut headers, &state.cookies, &token);

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, headers, ApiResponse::ok(user.into())))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> AppResult<(HeaderMap, Json<ApiResponse<PublicUser>>)> {
    let email = payload.email.as_deref().map(normalize_email).unwrap_or_default();
    let password = payload.password.unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest("Email and password are required".into()));
    }

    let user = match state.users.find_by_email(&email).await? {
        Some(u) => u,
        None => {
            verify_dummy(&password);
            warn!(email = %email, "login unknown email");
            return Err(AppError::Unauthenticated(INVALID_CREDENTIALS));
        }
    };

    if !verify_password(&password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthenticated(INVALID_CREDENTIALS));
    }

    let token = state.keys.issue(user.id)?;
    let mut headers = HeaderMap::new();
    attach_session_cookie(&mut headers, &state.cookies, &token);

    info!(user_id = %user.id, "user logged in");
    Ok((headers, ApiResponse::ok(user.into())))
}

/// Clears the cookie. The token itself stays valid until it expires.
/// Never touches the database, so it succeeds while storage is down.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    request_headers: HeaderMap,
) -> (HeaderMap, Json<ApiMessage>) {
    let user_id = extract_session_token(&request_headers).and_then(|t| state.keys.user_id(&t));
    if let Some(user_id) = user_id {
        info!(%user_id, "user logged out");
    }
    let mut headers = HeaderMap::new();
    attach_session_cookie(&mut headers, &state.cookies, "");
    (headers, ApiMessage::ok("Logged out"))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<ApiResponse<PublicUser>> {
    ApiResponse::ok(user.into())
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(payload): JsonBody<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<PublicUser>>> {
    let update = payload.validate().map_err(AppError::validation)?;
    if update.is_empty() {
        return Err(AppError::BadRequest("No updatable fields provided".into()));
    }
    let updated = state
        .users
        .update_profile(user.id, update)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    info!("profile updated");
    Ok(ApiResponse::ok(updated.into()))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn increment_my_views(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<ApiResponse<ViewsResponse>>> {
    let views = state
        .users
        .increment_views(user.id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    Ok(ApiResponse::ok(ViewsResponse { views }))
}

#[instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    QueryParams(page): QueryParams<Page>,
) -> AppResult<Json<ApiResponse<Vec<PublicUser>>>> {
    // Every user unless the client asks for a page.
    let users = state.users.list(page.limit(), page.offset()).await?;
    Ok(ApiResponse::ok(users.into_iter().map(PublicUser::from).collect()))
}
