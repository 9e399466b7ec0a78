use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::application::todo_service::ServiceError;
use crate::domain::todo::Todo;

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody { pub error: String }

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Todo not found")]
    NotFound,

    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(message) => Self::BadRequest(message),
            ServiceError::NotFound(_) => Self::NotFound,
            ServiceError::Store(e) => Self::Internal(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal(e) => {
                tracing::error!(error = %format!("{e:#}"), "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, axum::Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

/// A todo plus a human-readable confirmation, as returned by the mutating endpoints.
#[derive(Debug, Serialize)]
pub struct TodoMessage {
    #[serde(flatten)]
    pub todo: Todo,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct Message { pub message: &'static str }

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub message: &'static str,
}
