//! Application layer - orchestration over the domain and ports.

mod budget_service;
mod oauth_state;
mod registry;

pub use budget_service::{BudgetService, SpendingEvaluation};
pub use oauth_state::OAuthStateSigner;
pub use registry::{IntegrationRegistry, IntegrationView, PlaidHandle, WalletCredentials};
