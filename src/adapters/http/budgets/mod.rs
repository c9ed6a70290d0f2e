//! HTTP adapter for budget and notification endpoints.

mod dto;
mod handlers;
mod routes;

pub use handlers::BudgetsAppState;
pub use routes::{budget_routes, notification_routes};
