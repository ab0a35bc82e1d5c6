//! # User Route Handlers
//!
//! Registration, login and account lookups under `/api/users`.

use super::{AppError, AppState};
use crate::{
    auth::middleware::{issue_token, AuthenticatedUser},
    types::{
        AuthResponse, EmailAvailability, LoginRequest, MessageResponse, RegisterRequest,
        UserResponse, UsernameAvailability,
    },
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use core_access::{
    authenticate, create_user, find_user_by_id, is_email_available, is_username_available, User,
};
use tracing::info;

fn auth_response(state: &AppState, user: User, message: &str) -> Result<AuthResponse, AppError> {
    let access_token = issue_token(
        &user,
        &state.config.jwt_secret,
        state.config.token_expiry_days,
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to sign access token: {e}")))?;

    Ok(AuthResponse {
        success: true,
        message: message.to_string(),
        access_token,
        token_type: "bearer".to_string(),
        user: user.into(),
    })
}

/// `POST /api/users/register`
pub async fn register_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    info!(username = %payload.username, "Registration request received.");
    let user = create_user(
        &app_state.sqlite_provider.db,
        payload.email.trim(),
        payload.username.trim(),
        &payload.password,
    )
    .await?;

    let response = auth_response(&app_state, user, "User registered successfully")?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// `POST /api/users/login`
pub async fn login_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = authenticate(
        &app_state.sqlite_provider.db,
        payload.email.trim(),
        &payload.password,
    )
    .await?
    .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    info!(user_id = %user.id, "User logged in.");
    Ok(Json(auth_response(&app_state, user, "Login successful")?))
}

/// `GET /api/users/me`
pub async fn me_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UserResponse>, AppError> {
    let account = find_user_by_id(&app_state.sqlite_provider.db, &user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(account.into()))
}

/// `GET /api/users/check-email/{email}`
pub async fn check_email_handler(
    State(app_state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<EmailAvailability>, AppError> {
    let available = is_email_available(&app_state.sqlite_provider.db, &email).await?;
    Ok(Json(EmailAvailability { email, available }))
}

/// `GET /api/users/check-username/{username}`
pub async fn check_username_handler(
    State(app_state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UsernameAvailability>, AppError> {
    let available = is_username_available(&app_state.sqlite_provider.db, &username).await?;
    Ok(Json(UsernameAvailability {
        username,
        available,
    }))
}

/// `POST /api/users/logout`
///
/// Tokens are stateless, so the client simply discards its copy.
pub async fn logout_handler(user: AuthenticatedUser) -> Json<MessageResponse> {
    info!(user_id = %user.id, "User logged out.");
    Json(MessageResponse {
        success: true,
        message: "Logged out successfully".to_string(),
    })
}
