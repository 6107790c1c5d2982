use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

/// Failures raised by a [`Repository`](crate::repository::Repository) implementation.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("user {0} does not exist")]
    UnknownUser(i32),
}

/// ErrorBody
///
/// Structured error payload. `error` is the HTTP reason phrase, `message` the
/// optional human readable detail.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq)]
#[ts(export)]
pub struct ErrorBody {
    #[schema(example = "Bad Request")]
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "No such user")]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn new(status: StatusCode, message: Option<String>) -> Self {
        Self {
            error: status.canonical_reason().unwrap_or("Unknown error").to_string(),
            message,
        }
    }
}

/// ApiError
///
/// Errors a handler can fail with. Every variant but `NotFound` renders the
/// structured [`ErrorBody`]; a missing post keeps the bare 404 of the router.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found")]
    NotFound,

    #[error("missing or invalid bearer token")]
    Unauthorized,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::BadRequest(message) => {
                (status, Json(ErrorBody::new(status, Some(message)))).into_response()
            }
            Self::NotFound => status.into_response(),
            Self::Unauthorized => {
                let mut response = (status, Json(ErrorBody::new(status, None))).into_response();
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
            Self::Repository(err) => {
                // Details stay in the logs, never in the response.
                tracing::error!(error = %err, "repository failure");
                (status, Json(ErrorBody::new(status, None))).into_response()
            }
        }
    }
}
