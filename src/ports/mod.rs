//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Provider Ports
//!
//! - `IntegrationProvider` - Shared capability contract every provider
//!   adapter implements (connect, sync, expense reports)
//! - `WalletProvider` - Payment-link/balance extensions for the consumer
//!   wallets (PayPal, Venmo, Cash App)
//! - `OAuthWallet` - Authorization-url/code-exchange flow for connecting
//!   wallet funding sources
//!
//! ## Storage Ports
//!
//! - `IntegrationStore` - Integration configuration persistence
//! - `FundingSourceStore` - Per-user funding source lists
//! - `BudgetStore` - Budget persistence
//!
//! ## Notification Ports
//!
//! - `AlertNotifier` - Delivery of budget threshold alerts

mod budget_store;
mod funding_store;
mod integration_provider;
mod integration_store;
mod notifier;
mod wallet;

pub(crate) use integration_provider::sync_watermark;

pub use budget_store::BudgetStore;
pub use funding_store::FundingSourceStore;
pub use integration_provider::{IntegrationProvider, ProviderError, ProviderErrorCode};
pub use integration_store::IntegrationStore;
pub use notifier::AlertNotifier;
pub use wallet::{CaptureResult, OAuthWallet, PaymentLink, WalletBalance, WalletProvider};
