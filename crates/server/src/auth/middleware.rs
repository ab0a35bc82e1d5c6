//! # Authentication Middleware
//!
//! This module provides the Axum extractor for JWT-based authentication and
//! the function that mints the tokens it accepts.

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use chrono::{Duration, Utc};
use core_access::User;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::state::AppState;

/// Represents the claims we expect to find in the JWT.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The subject of the token: the user's id.
    pub sub: String,
    pub email: String,
    pub username: String,
    /// The expiration timestamp.
    pub exp: usize,
    /// The issue timestamp.
    pub iat: usize,
}

/// Signs an access token for `user` that expires after `expiry_days`.
pub fn issue_token(
    user: &User,
    secret: &str,
    expiry_days: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.clone(),
        email: user.email.clone(),
        username: user.username.clone(),
        exp: (now + Duration::days(expiry_days)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// An Axum extractor that provides the identity carried by a valid token.
///
/// Requests without an `Authorization: Bearer` header, or with a token that
/// fails signature or expiry checks, are rejected with `401 Unauthorized`.
/// Extract `Option<AuthenticatedUser>` where anonymous access is allowed.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: String,
    pub email: String,
    pub username: String,
}

/// A custom rejection type for authentication failures.
pub struct AuthError(StatusCode, String);

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

async fn bearer_token(parts: &mut Parts, state: &AppState) -> Result<Option<String>, AuthError> {
    let bearer_header =
        Option::<TypedHeader<Authorization<Bearer>>>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                warn!("Unexpected error during header extraction: {}", e);
                AuthError(
                    StatusCode::BAD_REQUEST,
                    "Invalid Authorization header format.".to_string(),
                )
            })?;
    Ok(bearer_header.map(|TypedHeader(Authorization(bearer))| bearer.token().to_string()))
}

fn authenticate_token(token: &str, secret: &str) -> Result<AuthenticatedUser, AuthError> {
    // `Validation::default()` is HS256 and checks `exp`.
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        warn!("JWT validation failed: {}", e);
        AuthError(
            StatusCode::UNAUTHORIZED,
            "Invalid or expired token.".to_string(),
        )
    })?;

    debug!(user_id = %token_data.claims.sub, "Request authenticated.");
    Ok(AuthenticatedUser {
        id: token_data.claims.sub,
        email: token_data.claims.email,
        username: token_data.claims.username,
    })
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts, state).await?.ok_or_else(|| {
            AuthError(StatusCode::UNAUTHORIZED, "Not authenticated".to_string())
        })?;
        authenticate_token(&token, &state.config.jwt_secret)
    }
}

/// Anonymous requests resolve to `None`; a present but invalid token is
/// still rejected.
impl OptionalFromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        match bearer_token(parts, state).await? {
            Some(token) => authenticate_token(&token, &state.config.jwt_secret).map(Some),
            None => Ok(None),
        }
    }
}
