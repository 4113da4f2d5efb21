mod common;

use std::sync::Arc;

use axum::{body::Body, http::Request, http::StatusCode};
use bookrec::constants::BOOKREC_STATUS_HEADER;
use bookrec::{HandlerState, Recommender, create_router_with_state};
use common::fixtures::write_artifacts;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

#[tokio::test]
async fn test_router_over_loaded_artifacts() {
    let dir = TempDir::new().unwrap();
    write_artifacts(dir.path());
    let recommender = Arc::new(Recommender::from_dir(dir.path()).unwrap());
    let app = create_router_with_state(HandlerState::new(recommender, 10, 100));

    let request = Request::builder()
        .method("POST")
        .uri("/v1/recommendations")
        .header("content-type", "application/json")
        .body(Body::from(json!({"user_id": "u1", "k": 5}).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[BOOKREC_STATUS_HEADER], "ok");
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["items"], json!(["i3", "i2"]));
}
