//! In-process router checks with `oneshot`.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use common::{basic_header, with_features, PASSWORD, USERNAME};
use context_companion::backends::mock::MockBackendFactory;
use context_companion::config::CompanionConfig;
use context_companion::startup::{build_router, AppState};
use tower::ServiceExt;

fn state(translation: bool, test_generation: bool) -> AppState {
    let config = CompanionConfig::from_builder(with_features(translation, test_generation))
        .expect("Failed to load config");
    AppState::build(config, &MockBackendFactory::default()).expect("Failed to build state")
}

#[tokio::test]
async fn health_route_is_public() {
    let response = build_router(state(false, false))
        .oneshot(
            Request::builder()
                .uri("/actuator/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["status"], "UP");
}

#[tokio::test]
async fn basic_request_sets_session_cookie() {
    let response = build_router(state(true, false))
        .oneshot(
            Request::builder()
                .uri("/api/features")
                .header(header::AUTHORIZATION, basic_header(USERNAME, PASSWORD))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(cookie.starts_with("SESSION="));
}

#[tokio::test]
async fn session_cookie_is_not_reissued() {
    let state = state(true, false);
    let session = state.gate.sessions().establish(USERNAME);

    let response = build_router(state)
        .oneshot(
            Request::builder()
                .uri("/auth/session")
                .header(header::COOKIE, format!("SESSION={}", session.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn unknown_route_requires_authentication_first() {
    let router = build_router(state(false, false));

    let anonymous = router
        .clone()
        .oneshot(Request::builder().uri("/nowhere").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let authenticated = router
        .oneshot(
            Request::builder()
                .uri("/nowhere")
                .header(header::AUTHORIZATION, basic_header(USERNAME, PASSWORD))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(authenticated.status(), StatusCode::NOT_FOUND);
}
