//! Axum router configuration for budget and notification endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{
    create_budget, delete_budget, get_budget, list_budgets, list_notifications, record_spending,
    BudgetsAppState,
};

/// Create the budgets API router.
///
/// # Routes
///
/// - `POST /` - Create a budget
/// - `GET /` - List the user's budgets
/// - `GET /{id}` - Fetch a budget
/// - `DELETE /{id}` - Delete a budget
/// - `POST /{id}/spending` - Evaluate spending and emit threshold alerts
pub fn budget_routes() -> Router<BudgetsAppState> {
    Router::new()
        .route("/", post(create_budget).get(list_budgets))
        .route("/:id", get(get_budget).delete(delete_budget))
        .route("/:id/spending", post(record_spending))
}

/// Create the notifications router.
///
/// # Routes
///
/// - `GET /` - Budget alerts recorded for the current user
pub fn notification_routes() -> Router<BudgetsAppState> {
    Router::new().route("/", get(list_notifications))
}
