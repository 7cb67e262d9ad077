use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use tts_gateway::engine::mock::{MockEngine, MockOutcome};
use tts_gateway::gateway::{DispatchConfig, Gateway};
use tts_gateway::registry::{EngineDescriptor, EngineRegistry};
use tts_gateway::serve;

fn app() -> axum::Router {
    let engine = Arc::new(MockEngine::new(vec![MockOutcome::Success(
        b"audio".to_vec(),
    )]));
    let registry = EngineRegistry::new().register(
        EngineDescriptor {
            name: "kokkoro".to_string(),
            display_name: "Kokkoro TTS".to_string(),
            description: "test engine".to_string(),
            invocation_target: "mock://local".to_string(),
            supported_formats: vec!["mp3".to_string()],
            voices: vec!["default".to_string()],
            languages: vec!["en".to_string()],
        },
        engine,
    );
    let gateway = Gateway::new(
        registry,
        None,
        DispatchConfig {
            auth_enabled: false,
            ..DispatchConfig::default()
        },
    );
    serve::router(Arc::new(gateway))
}

async fn post(app: axum::Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn post_health_envelope() {
    let (status, body) = post(app(), json!({"input": {"action": "health"}})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["jwt_auth_enabled"], false);
}

#[tokio::test]
async fn post_synthesis_envelope() {
    let (status, body) = post(
        app(),
        json!({"input": {"text": "Hello", "engine": "kokkoro"}}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["engine"], "kokkoro");
}

#[tokio::test]
async fn errors_stay_in_the_body_with_http_200() {
    // Serverless-handler semantics: transport succeeds, the body carries
    // the failure.
    let (status, body) = post(app(), json!({"not_input": true})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn get_health_alias() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "healthy");
}
