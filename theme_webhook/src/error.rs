use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{signature::Rejection, store::StoreError};

#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("invalid webhook payload: {0}")]
    MalformedPayload(String),
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] Rejection),
    #[error("failed to store theme: {0}")]
    StorageFailure(#[from] StoreError),
}

impl WebhookError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::StorageFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let message = match &self {
            // keep filesystem details out of the response
            Self::StorageFailure(_) => "Failed to update theme".to_string(),
            _ => self.to_string(),
        };

        (
            self.status(),
            Json(json!({
                "success": false,
                "error": message,
            })),
        )
            .into_response()
    }
}
