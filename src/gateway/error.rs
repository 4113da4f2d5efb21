use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::constants::BOOKREC_STATUS_HEADER;
use crate::recommend::RecommendError;
use crate::scoring::ScoringError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unknown user: '{0}'")]
    UnknownUser(String),

    #[error("scoring failed: {0}")]
    ScoringFailed(#[from] ScoringError),

    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<RecommendError> for GatewayError {
    fn from(err: RecommendError) -> Self {
        match err {
            RecommendError::InvalidRequest { reason } => GatewayError::InvalidRequest(reason),
            RecommendError::UnknownUser { user_id } => GatewayError::UnknownUser(user_id),
            RecommendError::Scoring(e) => GatewayError::ScoringFailed(e),
            other => GatewayError::InternalError(other.to_string()),
        }
    }
}

impl From<JsonRejection> for GatewayError {
    fn from(rejection: JsonRejection) -> Self {
        GatewayError::InvalidRequest(rejection.body_text())
    }
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, bookrec_status) = match &self {
            GatewayError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            GatewayError::UnknownUser(_) => (StatusCode::NOT_FOUND, "unknown_user"),
            GatewayError::ScoringFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "scoring_error")
            }
            GatewayError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            BOOKREC_STATUS_HEADER,
            HeaderValue::from_static(bookrec_status),
        );

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, headers, body).into_response()
    }
}
