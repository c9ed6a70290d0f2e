//! Axum router configuration for integration endpoints.

use axum::routing::{delete, get, post};
use axum::Router;

use super::handlers::{
    add_integration, create_report, get_report, integration_status, list_integrations,
    plaid_account_balance, plaid_link_token, remove_integration, sync_integration, update_report,
    IntegrationsAppState,
};

/// Create the integrations API router.
///
/// # Routes
///
/// - `POST /` - Add an integration
/// - `GET /` - List integrations
/// - `DELETE /{id}` - Remove an integration
/// - `POST /{id}/sync?since=` - Run expense + category sync
/// - `GET /{id}/status` - Lifecycle status
/// - `POST /{id}/reports` - Create an expense report
/// - `GET /{id}/reports/{report_id}` - Fetch an expense report
/// - `PUT /{id}/reports/{report_id}` - Update an expense report
/// - `GET /{id}/plaid/link-token` - Plaid Link token (Plaid integrations)
/// - `GET /{id}/plaid/accounts/{account_id}/balance` - Plaid balance
pub fn integration_routes() -> Router<IntegrationsAppState> {
    Router::new()
        .route("/", post(add_integration).get(list_integrations))
        .route("/:id", delete(remove_integration))
        .route("/:id/sync", post(sync_integration))
        .route("/:id/status", get(integration_status))
        .route("/:id/reports", post(create_report))
        .route("/:id/reports/:report_id", get(get_report).put(update_report))
        .route("/:id/plaid/link-token", get(plaid_link_token))
        .route(
            "/:id/plaid/accounts/:account_id/balance",
            get(plaid_account_balance),
        )
}
