use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::AppConfig, error::ApiError, repository::RepositoryState};

/// Claims
///
/// Payload expected inside a bearer token. Tokens are HS256-signed with
/// `AppConfig::jwt_secret`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user id, as a string.
    pub sub: String,
    /// Expiration Time (exp): the token is rejected after this instant.
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
}

/// Signs a token for `user_id` that stays valid for `ttl`.
///
/// # Errors
/// Fails if the claims cannot be encoded.
pub fn issue_token(
    user_id: i32,
    secret: &str,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp().max(0) as usize,
        exp: (now + ttl).timestamp().max(0) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// AuthUser
///
/// The resolved identity of an authenticated request. Handlers that need the
/// caller take it as an argument instead of reading request-global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
}

/// AuthUser Extractor Implementation
///
/// 1. Dependency resolution: repository and config from the application state.
/// 2. Token extraction: `Authorization: Bearer <token>`.
/// 3. JWT decoding with expiry validation.
/// 4. DB lookup: the subject must still exist.
///
/// Rejection: [`ApiError::Unauthorized`] (401) on any authentication failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized)?;

        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|err| {
            tracing::debug!(error = %err, "rejected bearer token");
            ApiError::Unauthorized
        })?;

        let user_id: i32 = token_data
            .claims
            .sub
            .parse()
            .map_err(|_| ApiError::Unauthorized)?;

        // A valid token for a deleted user is still rejected.
        let user = repo.get_user(user_id).await?.ok_or(ApiError::Unauthorized)?;

        Ok(AuthUser {
            id: user.id,
            username: user.username,
        })
    }
}
