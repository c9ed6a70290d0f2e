//! Integration configuration and lifecycle status.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{DomainError, IntegrationId, Timestamp};

/// External provider backing an integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    PayPal,
    Venmo,
    CashApp,
    Plaid,
    Expensify,
}

impl ProviderKind {
    /// Returns the canonical lowercase tag used in URLs and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::PayPal => "paypal",
            ProviderKind::Venmo => "venmo",
            ProviderKind::CashApp => "cashapp",
            ProviderKind::Plaid => "plaid",
            ProviderKind::Expensify => "expensify",
        }
    }

    /// Returns the human-readable provider name.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::PayPal => "PayPal",
            ProviderKind::Venmo => "Venmo",
            ProviderKind::CashApp => "Cash App",
            ProviderKind::Plaid => "Plaid",
            ProviderKind::Expensify => "Expensify",
        }
    }

    /// Whether this provider is a consumer wallet (OAuth funding flows,
    /// payment links, balances).
    pub fn is_wallet(&self) -> bool {
        matches!(
            self,
            ProviderKind::PayPal | ProviderKind::Venmo | ProviderKind::CashApp
        )
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "paypal" => Ok(ProviderKind::PayPal),
            "venmo" => Ok(ProviderKind::Venmo),
            "cashapp" | "cash_app" => Ok(ProviderKind::CashApp),
            "plaid" => Ok(ProviderKind::Plaid),
            "expensify" => Ok(ProviderKind::Expensify),
            other => Err(DomainError::unsupported_provider(other)),
        }
    }
}

/// Lifecycle status of a configured integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationStatus {
    Active,
    Inactive,
    Error,
    Configuring,
}

impl fmt::Display for IntegrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IntegrationStatus::Active => "active",
            IntegrationStatus::Inactive => "inactive",
            IntegrationStatus::Error => "error",
            IntegrationStatus::Configuring => "configuring",
        };
        write!(f, "{}", s)
    }
}

/// Configuration for one integration instance.
///
/// Credentials are provider-specific secrets and never serialize; settings
/// carry non-secret provider options (cashtag, username, access tokens for
/// sandbox overrides, etc.).
#[derive(Debug, Clone)]
pub struct IntegrationConfig {
    pub id: IntegrationId,
    pub name: String,
    pub provider: ProviderKind,
    pub credentials: HashMap<String, SecretString>,
    pub settings: HashMap<String, serde_json::Value>,
    pub status: IntegrationStatus,
    pub last_sync_time: Option<Timestamp>,
}

impl IntegrationConfig {
    /// Creates a configuration in the `Configuring` state.
    pub fn new(id: IntegrationId, name: impl Into<String>, provider: ProviderKind) -> Self {
        Self {
            id,
            name: name.into(),
            provider,
            credentials: HashMap::new(),
            settings: HashMap::new(),
            status: IntegrationStatus::Configuring,
            last_sync_time: None,
        }
    }

    /// Adds a credential entry.
    pub fn with_credential(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.credentials
            .insert(key.into(), SecretString::new(value.into()));
        self
    }

    /// Adds a settings entry.
    pub fn with_setting(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.settings.insert(key.into(), value);
        self
    }

    /// Looks up a credential by key.
    pub fn credential(&self, key: &str) -> Option<&SecretString> {
        self.credentials.get(key)
    }

    /// Looks up a string-valued setting by key.
    pub fn setting_str(&self, key: &str) -> Option<&str> {
        self.settings.get(key).and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_parses_known_tags() {
        assert_eq!("paypal".parse::<ProviderKind>().unwrap(), ProviderKind::PayPal);
        assert_eq!("CashApp".parse::<ProviderKind>().unwrap(), ProviderKind::CashApp);
        assert_eq!("plaid".parse::<ProviderKind>().unwrap(), ProviderKind::Plaid);
    }

    #[test]
    fn provider_kind_rejects_unknown_tags() {
        let err = "stripe".parse::<ProviderKind>().unwrap_err();
        assert!(err.message.contains("stripe"));
    }

    #[test]
    fn wallet_classification() {
        assert!(ProviderKind::PayPal.is_wallet());
        assert!(ProviderKind::Venmo.is_wallet());
        assert!(ProviderKind::CashApp.is_wallet());
        assert!(!ProviderKind::Plaid.is_wallet());
        assert!(!ProviderKind::Expensify.is_wallet());
    }

    #[test]
    fn new_config_starts_configuring() {
        let config = IntegrationConfig::new(
            IntegrationId::new("x").unwrap(),
            "My PayPal",
            ProviderKind::PayPal,
        );
        assert_eq!(config.status, IntegrationStatus::Configuring);
        assert!(config.last_sync_time.is_none());
    }

    #[test]
    fn settings_lookup_returns_strings() {
        let config = IntegrationConfig::new(
            IntegrationId::new("x").unwrap(),
            "Cash App",
            ProviderKind::CashApp,
        )
        .with_setting("cashtag", serde_json::json!("$alice"));

        assert_eq!(config.setting_str("cashtag"), Some("$alice"));
        assert_eq!(config.setting_str("missing"), None);
    }
}
