//! HTTP adapter for integration endpoints.

mod dto;
mod handlers;
mod routes;

pub use handlers::IntegrationsAppState;
pub use routes::integration_routes;
