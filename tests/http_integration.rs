//! Integration tests for the HTTP layer.
//!
//! Drives the assembled router with `tower::ServiceExt::oneshot` and
//! asserts the envelope convention and status-code mapping.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use cardpilot::adapters::http::api_router;
use cardpilot::adapters::notify::InMemoryNotifier;
use cardpilot::adapters::providers::{MockProvider, ProviderAdapter, ProviderFactory};
use cardpilot::adapters::storage::{
    InMemoryBudgetStore, InMemoryFundingSourceStore, InMemoryIntegrationStore,
};
use cardpilot::application::{BudgetService, IntegrationRegistry, OAuthStateSigner};
use cardpilot::domain::foundation::DomainError;
use cardpilot::domain::integration::IntegrationConfig;

// =============================================================================
// Test Infrastructure
// =============================================================================

struct MockFactory;

impl ProviderFactory for MockFactory {
    fn create(&self, config: &IntegrationConfig) -> Result<ProviderAdapter, DomainError> {
        let mut mock = MockProvider::new(config.provider);
        if config
            .settings
            .get("fail_connect")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
        {
            mock = mock.with_failing_connect();
        }
        Ok(ProviderAdapter::Mock(mock))
    }
}

fn app() -> Router {
    let notifier = Arc::new(InMemoryNotifier::new());
    let registry = Arc::new(IntegrationRegistry::new(
        Arc::new(InMemoryIntegrationStore::new()),
        Arc::new(InMemoryFundingSourceStore::new()),
        Arc::new(MockFactory),
        OAuthStateSigner::new("http-test-secret"),
        HashMap::new(),
    ));
    let budgets = Arc::new(BudgetService::new(
        Arc::new(InMemoryBudgetStore::new()),
        notifier.clone(),
    ));
    api_router(registry, budgets, notifier)
}

fn request(method: &str, uri: &str, user: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", user));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn missing_bearer_token_is_401_with_envelope() {
    let response = app()
        .oneshot(request("GET", "/api/v1/budgets", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "UNAUTHORIZED");
}

// =============================================================================
// Budgets
// =============================================================================

async fn create_budget(app: &Router, user: &str, target: f64) -> String {
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/budgets",
            Some(user),
            Some(serde_json::json!({
                "category": "groceries",
                "target_amount": target,
                "period": "monthly",
                "thresholds": [50.0, 75.0, 90.0, 100.0],
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    json["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn budget_lifecycle_over_http() {
    let app = app();
    let id = create_budget(&app, "user-1", 5000.0).await;

    // Spending at 92% trips three thresholds in one pass.
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/v1/budgets/{}/spending", id),
            Some("user-1"),
            Some(serde_json::json!({ "amount": 4600.0 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["alerts"].as_array().unwrap().len(), 3);

    // Re-evaluating the same spending emits nothing further.
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/v1/budgets/{}/spending", id),
            Some("user-1"),
            Some(serde_json::json!({ "amount": 4600.0 })),
        ))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"]["alerts"].as_array().unwrap().len(), 0);

    // The notification feed carries the three alerts.
    let response = app
        .clone()
        .oneshot(request("GET", "/api/v1/notifications", Some("user-1"), None))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 3);

    // Another user sees no notifications and cannot read the budget.
    let response = app
        .clone()
        .oneshot(request("GET", "/api/v1/notifications", Some("user-2"), None))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 0);

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/v1/budgets/{}", id),
            Some("user-2"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "BUDGET_NOT_FOUND");
}

#[tokio::test]
async fn invalid_budget_body_is_400() {
    let app = app();
    let response = app
        .oneshot(request(
            "POST",
            "/api/v1/budgets",
            Some("user-1"),
            Some(serde_json::json!({
                "category": "",
                "target_amount": -1.0,
                "period": "monthly",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "VALIDATION_FAILED");
}

// =============================================================================
// Integrations
// =============================================================================

#[tokio::test]
async fn integration_endpoints_map_statuses() {
    let app = app();

    // Unknown provider tag.
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/integrations",
            Some("user-1"),
            Some(serde_json::json!({
                "id": "x",
                "name": "X",
                "provider": "stripe",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "UNSUPPORTED_PROVIDER");

    // Successful add.
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/integrations",
            Some("user-1"),
            Some(serde_json::json!({
                "id": "plaid-main",
                "name": "Plaid",
                "provider": "plaid",
                "credentials": { "client_id": "cid", "secret": "sec" },
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "active");

    // Status endpoint for the stored integration.
    let response = app
        .clone()
        .oneshot(request(
            "GET",
            "/api/v1/integrations/plaid-main/status",
            Some("user-1"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "active");

    // Unknown integration id is 404.
    let response = app
        .clone()
        .oneshot(request(
            "GET",
            "/api/v1/integrations/ghost/status",
            Some("user-1"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "INTEGRATION_NOT_FOUND");
}

#[tokio::test]
async fn failed_connect_surfaces_as_bad_gateway_with_error_status() {
    let app = app();

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/integrations",
            Some("user-1"),
            Some(serde_json::json!({
                "id": "pp-x",
                "name": "PayPal",
                "provider": "paypal",
                "settings": { "fail_connect": true },
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "CONNECTION_FAILED");

    // The configuration landed with status Error.
    let response = app
        .clone()
        .oneshot(request(
            "GET",
            "/api/v1/integrations/pp-x/status",
            Some("user-1"),
            None,
        ))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "error");
}

#[tokio::test]
async fn sync_endpoint_returns_merged_result() {
    let app = app();
    app.clone()
        .oneshot(request(
            "POST",
            "/api/v1/integrations",
            Some("user-1"),
            Some(serde_json::json!({
                "id": "ex-1",
                "name": "Expensify",
                "provider": "expensify",
            })),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/integrations/ex-1/sync",
            Some("user-1"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["success"], true);
    assert_eq!(json["data"]["synced_items"], 0);

    // Malformed watermark.
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/integrations/ex-1/sync?since=yesterday",
            Some("user-1"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Funding
// =============================================================================

#[tokio::test]
async fn unconfigured_wallet_provider_is_bad_gateway() {
    // No wallet credentials were configured in this fixture.
    let app = app();
    let response = app
        .oneshot(request(
            "POST",
            "/api/v1/funding/sources/connect/paypal",
            Some("user-1"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "CONNECTION_FAILED");
}

#[tokio::test]
async fn connect_with_unknown_provider_is_400() {
    let app = app();
    let response = app
        .oneshot(request(
            "POST",
            "/api/v1/funding/sources/connect/stripe",
            Some("user-1"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "UNSUPPORTED_PROVIDER");
}

#[tokio::test]
async fn callback_without_params_is_400() {
    let app = app();
    let response = app
        .oneshot(request(
            "GET",
            "/api/v1/funding/sources/callback/paypal",
            Some("user-1"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn funding_sources_start_empty() {
    let app = app();
    let response = app
        .oneshot(request("GET", "/api/v1/funding/sources", Some("user-1"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"].as_array().unwrap().len(), 0);
}
