//! Thin HTTP surface over the gateway.
//!
//! `POST /` mirrors the serverless handler contract: the envelope goes in,
//! a JSON body comes out, and the HTTP status is always 200 — success and
//! failure live in the body's `success`/`error` fields. `GET /health` is a
//! convenience alias for the health action.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};

use crate::gateway::Gateway;

pub fn router(gateway: Arc<Gateway>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", post(handle))
        .route("/health", get(health))
        .layer(cors)
        .with_state(gateway)
}

async fn handle(State(gateway): State<Arc<Gateway>>, Json(envelope): Json<Value>) -> Json<Value> {
    Json(gateway.handle(envelope).await)
}

async fn health(State(gateway): State<Arc<Gateway>>) -> Json<Value> {
    Json(
        gateway
            .handle(json!({"input": {"action": "health"}}))
            .await,
    )
}
