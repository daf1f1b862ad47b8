//! Serving a loaded route table through axum

use std::sync::Arc;

use axum::body::Body;
use http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_REQUEST_METHOD, ORIGIN};
use http::{Method, Request, StatusCode};
use oauthmux_core::EndpointKind;
use oauthmux_gateway::{DefaultManagerFactory, InMemoryRouteTable, LoaderConfig, OAuthLoader};
use oauthmux_storage::InMemoryOAuthServerRepository;
use pretty_assertions::assert_eq;
use tests::fixtures;
use tower::ServiceExt;

use super::echo_handler;

async fn loaded_table() -> Arc<InMemoryRouteTable> {
    let table = Arc::new(InMemoryRouteTable::new());
    let config = fixtures::default_server("default")
        .with_secret("app", "s3cret")
        .with_endpoint(
            EndpointKind::Token,
            Some(fixtures::endpoint("/default/token").with_methods(["POST"])),
        );
    let repo = InMemoryOAuthServerRepository::with_servers(vec![config]);

    OAuthLoader::new(
        table.clone(),
        Arc::new(DefaultManagerFactory::new()),
        &LoaderConfig::default(),
    )
    .load(&repo)
    .await
    .unwrap();
    table
}

#[tokio::test]
async fn test_router_serves_registered_routes() {
    let router = loaded_table().await.into_router(|_| echo_handler());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/default/token?client_id=app")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = Request::builder()
        .uri("/default/authorize")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = Request::builder()
        .uri("/default/unknown")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_router_enforces_endpoint_methods() {
    let router = loaded_table().await.into_router(|_| echo_handler());

    let request = Request::builder()
        .method(Method::GET)
        .uri("/default/token?client_id=app")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_router_answers_preflight_on_restricted_endpoint() {
    let router = loaded_table().await.into_router(|_| echo_handler());

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/default/token")
        .header(ORIGIN, "https://app.example.com")
        .header(ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://app.example.com"
    );
}
