use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use tower::util::ServiceExt; // for `oneshot`

use api_ingress::{web::HelloResponse, ApiIngress, ApiIngressConfig};

fn test_app(cors_enabled: bool) -> Router {
    let config = ApiIngressConfig {
        cors_enabled,
        ..Default::default()
    };
    ApiIngress::new(config, None).build_router()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

#[tokio::test]
async fn health_reports_healthy() {
    let response = test_app(false)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["status"], "healthy");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn hello_defaults_to_world_in_json() {
    let response = test_app(false)
        .oneshot(Request::builder().uri("/hello").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert_eq!(response.headers().get(header::VARY).unwrap(), "Accept");

    let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["message"], "Hello, world!");
}

#[tokio::test]
async fn hello_speaks_cbor_when_preferred() {
    let response = test_app(false)
        .oneshot(
            Request::builder()
                .uri("/hello?name=Ada%20%3CL%3E")
                .header(header::ACCEPT, "application/cbor;q=1.0, application/json;q=0.9")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/cbor"
    );

    let hello: HelloResponse = serde_cbor::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(hello.message, "Hello, Ada <L>!");
}

#[tokio::test]
async fn json_output_is_not_html_escaped() {
    let response = test_app(false)
        .oneshot(
            Request::builder()
                .uri("/hello?name=%3Cb%3E%26")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.contains("Hello, <b>&!"), "got {text}");
}

#[tokio::test]
async fn wrong_method_lists_allowed_methods() {
    let response = test_app(false)
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/items")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers().get(header::ALLOW).unwrap(), "GET");
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/problem+json"
    );
    let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["detail"], "method POST not allowed");
}

#[tokio::test]
async fn unknown_path_is_problem_404() {
    let response = test_app(false)
        .oneshot(
            Request::builder()
                .uri("/nope")
                .header(header::HOST, "api.example.com")
                .header("x-forwarded-proto", "https")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get(header::LINK).unwrap(),
        "<https://api.example.com/schemas/ErrorModel.json>; rel=\"describedBy\""
    );
    let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["$schema"], "https://api.example.com/schemas/ErrorModel.json");
    assert_eq!(json["detail"], "resource not found");
}

#[tokio::test]
async fn cors_headers_when_enabled() {
    let response = test_app(true)
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "https://app.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));

    let response = test_app(false)
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "https://app.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(!response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
