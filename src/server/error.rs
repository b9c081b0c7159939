use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::{error, warn};
use serde::Serialize;

use crate::error::ExtractError;

/// JSON error body: `{ error, details? }`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Wrapper so handlers can return `Result<_, ApiError>` and use `?`
#[derive(Debug)]
pub struct ApiError(pub ExtractError);

impl From<ExtractError> for ApiError {
    fn from(err: ExtractError) -> Self {
        ApiError(err)
    }
}

// Extractor rejections get the same JSON body as every other failure
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(ExtractError::BadRequest(rejection.body_text()))
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError(ExtractError::BadRequest(rejection.body_text()))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ExtractError::Unauthorized => StatusCode::UNAUTHORIZED,
            ExtractError::NotFound(_) => StatusCode::NOT_FOUND,
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let details = if status.is_server_error() {
            error!("Request failed: {:?}", self.0);
            Some(format!("{:?}", self.0))
        } else {
            warn!("Request rejected ({}): {}", status, self.0);
            None
        };

        let body = ErrorBody {
            error: self.0.to_string(),
            details,
        };
        (status, Json(body)).into_response()
    }
}
