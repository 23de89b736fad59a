use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use shared::StoreError;
use thiserror::Error;
use tracing::error;

use crate::task_guard::AlreadyRunning;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Puller is already working")]
    Conflict,

    #[error("Query not found")]
    NotFound,

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AlreadyRunning> for ApiError {
    fn from(_: AlreadyRunning) -> Self {
        ApiError::Conflict
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Conflict => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidTimestamp(_) | ApiError::MissingField(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Store(e) => {
                error!("Store query failed: {}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (self.status(), Json(json!({ "response": message }))).into_response()
    }
}
