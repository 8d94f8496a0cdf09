//! End-to-end checks through the router: tenant header extraction, the
//! health probe and error mapping, without binding a socket.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use optica_api::{
    api_v1_routes, config::AppConfig, db, handlers, tenant::TENANT_HEADER, AppState,
};

async fn test_app() -> axum::Router {
    let pool = db::establish_connection("sqlite::memory:")
        .await
        .expect("db connect");
    db::run_migrations(&pool).await.expect("migrations");

    let cfg = AppConfig {
        database_url: "sqlite::memory:".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        log_level: "info".to_string(),
        log_json: false,
        auto_migrate: false,
        cors_allowed_origins: None,
    };

    let state = AppState::new(Arc::new(pool), cfg);
    axum::Router::new()
        .nest("/health", handlers::health::health_routes())
        .nest("/api/v1", api_v1_routes())
        .with_state(state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn missing_tenant_header_is_a_client_error() {
    let app = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/clients")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains(TENANT_HEADER));
}

#[tokio::test]
async fn health_performs_a_store_round_trip() {
    let app = test_app().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "up");
    assert_eq!(body["database"]["status"], "up");
}

#[tokio::test]
async fn suppliers_are_created_and_listed_per_tenant() {
    let app = test_app().await;
    let tenant_a = Uuid::new_v4().to_string();
    let tenant_b = Uuid::new_v4().to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/suppliers")
                .header(CONTENT_TYPE, "application/json")
                .header(TENANT_HEADER, &tenant_a)
                .body(Body::from(r#"{"name":"Laboratorio Sur"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // The owning tenant sees it...
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/suppliers")
                .header(TENANT_HEADER, &tenant_a)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    // ...and any other tenant does not.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/suppliers")
                .header(TENANT_HEADER, &tenant_b)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_sort_column_maps_to_bad_request() {
    let app = test_app().await;
    let tenant = Uuid::new_v4().to_string();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/purchases/advanced?order_by=supplier_name")
                .header(TENANT_HEADER, &tenant)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn conflict_maps_to_409() {
    let app = test_app().await;
    let tenant = Uuid::new_v4().to_string();

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/suppliers")
                    .header(CONTENT_TYPE, "application/json")
                    .header(TENANT_HEADER, &tenant)
                    .body(Body::from(r#"{"name":"Laboratorio Sur"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        if response.status() == StatusCode::CREATED {
            continue;
        }
        assert_eq!(response.status(), StatusCode::CONFLICT);
        return;
    }
    panic!("duplicate supplier was not rejected");
}
