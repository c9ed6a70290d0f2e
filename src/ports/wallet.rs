//! Wallet capability ports - provider extensions outside the common
//! integration contract.
//!
//! The three consumer wallets (PayPal, Venmo, Cash App) offer payment
//! links, balances, and recipient validation; connecting them as funding
//! sources goes through the OAuth flow in [`OAuthWallet`]. Plaid- and
//! PayPal-only extensions live on their concrete adapters and are reached
//! through typed handles, not through these traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;
use crate::domain::integration::ExternalAccount;

use super::ProviderError;

/// A shareable payment link for adding funds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentLink {
    /// URL the payer opens to complete the payment.
    pub url: String,
    /// Provider-side reference (order id), when the provider issues one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub amount: f64,
    pub currency: String,
}

/// A wallet balance snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletBalance {
    pub available: f64,
    pub currency: String,
    pub as_of: Timestamp,
}

/// Outcome of capturing a previously-approved payment order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureResult {
    pub order_id: String,
    /// Provider-side status, e.g. `COMPLETED`.
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// Payment-link, balance, and recipient-validation capability.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Creates a shareable payment link for the given amount.
    async fn create_payment_link(
        &self,
        amount: f64,
        currency: &str,
        note: Option<&str>,
    ) -> Result<PaymentLink, ProviderError>;

    /// Fetches the wallet's available balance.
    async fn get_balance(&self) -> Result<WalletBalance, ProviderError>;

    /// Validates a recipient handle (cashtag, username, email).
    ///
    /// Returns `Ok(false)` for a well-formed query about an invalid
    /// recipient; errors are reserved for provider faults.
    async fn validate_recipient(&self, handle: &str) -> Result<bool, ProviderError>;
}

/// OAuth connect flow for wallet funding sources.
#[async_trait]
pub trait OAuthWallet: Send + Sync {
    /// Builds the provider authorization URL carrying the signed state.
    fn authorization_url(&self, state: &str) -> String;

    /// Exchanges an authorization code for the external account identity.
    async fn exchange_code(&self, code: &str) -> Result<ExternalAccount, ProviderError>;
}
