use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::constants::{BOOKREC_STATUS_HEADER, BOOKREC_STATUS_OK};
use crate::gateway::error::GatewayError;
use crate::gateway::state::HandlerState;
use crate::recommend::{RawIdentifier, RecommendRequest};

/// `POST /v1/recommendations` with `{"user_id": <string|int>, "k": <int?>}`.
///
/// Body rejections are reported through [`GatewayError`] so they carry the
/// status header and JSON error body like every other failure.
#[instrument(skip(state, payload), fields(user_id = tracing::field::Empty))]
pub async fn recommendations_handler(
    State(state): State<HandlerState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, GatewayError> {
    let Json(body) = payload?;
    let request = parse_request(&body, state.default_k, state.max_k)?;
    tracing::Span::current().record("user_id", tracing::field::display(&request.user_id));

    let recommendation = state.recommender.predict(&request)?;
    debug!(returned = recommendation.len(), k = request.k, "Recommendations served");

    let mut headers = HeaderMap::new();
    headers.insert(
        BOOKREC_STATUS_HEADER,
        HeaderValue::from_static(BOOKREC_STATUS_OK),
    );

    Ok((headers, Json(recommendation)).into_response())
}

/// Validates the loosely-typed body into a [`RecommendRequest`].
pub fn parse_request(
    body: &Value,
    default_k: usize,
    max_k: usize,
) -> Result<RecommendRequest, GatewayError> {
    let object = body
        .as_object()
        .ok_or_else(|| GatewayError::InvalidRequest("body must be a JSON object".to_string()))?;

    let user_id = object
        .get("user_id")
        .ok_or_else(|| GatewayError::InvalidRequest("missing field `user_id`".to_string()))?;
    let user_id = RawIdentifier::from_json(user_id)?.into_string();

    let k = match object.get("k") {
        None | Some(Value::Null) => default_k,
        Some(value) => {
            let k = value.as_u64().ok_or_else(|| {
                GatewayError::InvalidRequest(format!("k must be a positive integer, got {}", value))
            })?;
            usize::try_from(k).unwrap_or(usize::MAX)
        }
    };

    if k > max_k {
        return Err(GatewayError::InvalidRequest(format!(
            "k ({}) exceeds the maximum of {}",
            k, max_k
        )));
    }

    let request = RecommendRequest::new(user_id, k);
    request.validate()?;
    Ok(request)
}
