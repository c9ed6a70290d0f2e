//! Wallet provider credentials for the OAuth funding flows.
//!
//! Integration credentials (Plaid, Expensify, token-based wallets) arrive
//! per-integration through the add-integration API; this section carries
//! only the app-level OAuth clients the funding flows need.

use serde::Deserialize;

use super::error::ValidationError;

/// OAuth/API credentials for one wallet provider.
#[derive(Debug, Clone, Deserialize)]
pub struct WalletProviderConfig {
    /// OAuth client id.
    pub client_id: String,

    /// OAuth client secret.
    pub client_secret: String,

    /// Registered OAuth redirect target.
    #[serde(default)]
    pub redirect_uri: Option<String>,

    /// Platform access token / API key for wallet API calls.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Platform receiving handle (Venmo username or cashtag).
    #[serde(default)]
    pub handle: Option<String>,
}

impl WalletProviderConfig {
    fn validate(&self, section: &'static str) -> Result<(), ValidationError> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(ValidationError::invalid(
                section,
                "client_id and client_secret must both be set",
            ));
        }
        Ok(())
    }
}

/// Wallet provider configuration; each section is optional and its flows
/// are unavailable when absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub paypal: Option<WalletProviderConfig>,

    #[serde(default)]
    pub venmo: Option<WalletProviderConfig>,

    #[serde(default)]
    pub cashapp: Option<WalletProviderConfig>,
}

impl ProvidersConfig {
    /// Validates every configured wallet section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(paypal) = &self.paypal {
            paypal.validate("PROVIDERS__PAYPAL")?;
        }
        if let Some(venmo) = &self.venmo {
            venmo.validate("PROVIDERS__VENMO")?;
        }
        if let Some(cashapp) = &self.cashapp {
            cashapp.validate("PROVIDERS__CASHAPP")?;
        }
        Ok(())
    }
}
