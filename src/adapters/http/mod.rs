//! HTTP adapters - REST API implementations.
//!
//! Each domain module has its own HTTP adapter (`dto` / `handlers` /
//! `routes`); [`api_router`] assembles them under `/api/v1`. Every route
//! answers with the `{ success, data?, error? }` envelope and a status
//! code matched to the error kind.

pub mod auth;
pub mod budgets;
pub mod error;
pub mod funding;
pub mod integrations;

use std::sync::Arc;

use axum::Router;

use crate::adapters::notify::InMemoryNotifier;
use crate::application::{BudgetService, IntegrationRegistry};

pub use auth::AuthenticatedUser;
pub use budgets::BudgetsAppState;
pub use error::{ApiError, ApiResponse, ErrorBody};
pub use funding::FundingAppState;
pub use integrations::IntegrationsAppState;

/// Assembles the full API router.
pub fn api_router(
    registry: Arc<IntegrationRegistry>,
    budgets: Arc<BudgetService>,
    notifications: Arc<InMemoryNotifier>,
) -> Router {
    let integrations_state = IntegrationsAppState {
        registry: registry.clone(),
    };
    let funding_state = FundingAppState { registry };
    let budgets_state = BudgetsAppState {
        service: budgets,
        notifications,
    };

    Router::new().nest(
        "/api/v1",
        Router::new()
            .nest(
                "/integrations",
                integrations::integration_routes().with_state(integrations_state),
            )
            .nest(
                "/funding",
                funding::funding_routes().with_state(funding_state),
            )
            .nest(
                "/budgets",
                budgets::budget_routes().with_state(budgets_state.clone()),
            )
            .nest(
                "/notifications",
                budgets::notification_routes().with_state(budgets_state),
            ),
    )
}
