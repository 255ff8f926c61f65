use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use tower::ServiceExt;

use vidtube_core::{test_config, App, Config, SessionConfig};

async fn router(config: Config) -> axum::Router {
    App::with_config(config)
        .await
        .expect("Failed to create app")
        .router()
}

#[tokio::test]
async fn test_healthcheck_without_a_listener() {
    let app = router(test_config(SessionConfig::default())).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/healthcheck")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["status"], "OK");
}

#[tokio::test]
async fn test_request_id_only_in_development() {
    let mut config = test_config(SessionConfig::default());
    config.environment = "development".to_string();
    let dev = router(config).await;

    let response = dev
        .oneshot(
            Request::builder()
                .uri("/api/v1/healthcheck")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));

    let test = router(test_config(SessionConfig::default())).await;
    let response = test
        .oneshot(
            Request::builder()
                .uri("/api/v1/healthcheck")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(!response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_configured_cors_origin_allows_credentials() {
    let mut config = test_config(SessionConfig::default());
    config.cors_origin = Some("https://app.example.com".to_string());
    let app = router(config).await;

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/v1/users/refresh-token")
                .header(header::ORIGIN, "https://app.example.com")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://app.example.com"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}
