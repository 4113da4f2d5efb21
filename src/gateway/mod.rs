//! HTTP gateway (Axum) serving recommendations from a shared [`Recommender`].
//!
//! [`Recommender`]: crate::recommend::Recommender

pub mod error;
pub mod handler;
pub mod state;


use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub use error::GatewayError;
pub use handler::recommendations_handler;
pub use state::HandlerState;

use crate::constants::{BOOKREC_STATUS_HEADER, BOOKREC_STATUS_HEALTHY, BOOKREC_STATUS_READY};

pub fn create_router_with_state(state: HandlerState) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/v1/recommendations", post(recommendations_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(serde::Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub n_items: usize,
    pub n_users: usize,
    pub masked_users: usize,
    pub default_k: usize,
    pub max_k: usize,
}

fn status_header(status: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(BOOKREC_STATUS_HEADER, HeaderValue::from_static(status));
    headers
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    let body = HealthResponse { status: "ok" };
    (StatusCode::OK, status_header(BOOKREC_STATUS_HEALTHY), Json(body)).into_response()
}

/// Artifacts are loaded before the router exists, so a reachable router is ready.
#[tracing::instrument(skip(state))]
pub async fn ready_handler(State(state): State<HandlerState>) -> Response {
    let recommender = &state.recommender;
    let body = ReadyResponse {
        status: BOOKREC_STATUS_READY,
        n_items: recommender.item_cardinality(),
        n_users: recommender.user_cardinality(),
        masked_users: recommender.mask().len(),
        default_k: state.default_k,
        max_k: state.max_k,
    };
    (StatusCode::OK, status_header(BOOKREC_STATUS_READY), Json(body)).into_response()
}
