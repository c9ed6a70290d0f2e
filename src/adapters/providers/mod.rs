//! Provider adapters - one per external payment/expense API.
//!
//! Each adapter implements the `IntegrationProvider` port; the wallets
//! additionally implement `WalletProvider` and `OAuthWallet`. The
//! [`ProviderAdapter`] enum is the tagged-variant surface the registry
//! stores: provider-specific extensions (PayPal capture, Plaid link
//! tokens) are reached through typed accessors, never downcasts.

mod cashapp;
mod expensify;
mod mock;
mod paypal;
mod plaid;
mod venmo;

pub use cashapp::CashAppProvider;
pub use expensify::ExpensifyProvider;
pub use mock::{failed_sync, MockProvider};
pub use paypal::PayPalProvider;
pub use plaid::{AccountBalance, LinkToken, PlaidProvider};
pub use venmo::VenmoProvider;

use secrecy::{ExposeSecret, SecretString};

use crate::domain::foundation::DomainError;
use crate::domain::integration::{IntegrationConfig, ProviderKind};
use crate::ports::{IntegrationProvider, OAuthWallet, ProviderError, WalletProvider};

/// A live provider adapter, tagged by variant.
pub enum ProviderAdapter {
    PayPal(PayPalProvider),
    Venmo(VenmoProvider),
    CashApp(CashAppProvider),
    Plaid(PlaidProvider),
    Expensify(ExpensifyProvider),
    /// Scripted adapter for tests and development.
    Mock(MockProvider),
}

impl ProviderAdapter {
    /// The common integration contract.
    pub fn provider(&self) -> &dyn IntegrationProvider {
        match self {
            ProviderAdapter::PayPal(p) => p,
            ProviderAdapter::Venmo(p) => p,
            ProviderAdapter::CashApp(p) => p,
            ProviderAdapter::Plaid(p) => p,
            ProviderAdapter::Expensify(p) => p,
            ProviderAdapter::Mock(p) => p,
        }
    }

    /// Wallet capabilities, when this variant offers them.
    pub fn wallet(&self) -> Option<&dyn WalletProvider> {
        match self {
            ProviderAdapter::PayPal(p) => Some(p),
            ProviderAdapter::Venmo(p) => Some(p),
            ProviderAdapter::CashApp(p) => Some(p),
            ProviderAdapter::Mock(p) => Some(p),
            _ => None,
        }
    }

    /// OAuth funding-source flow, when this variant offers it.
    pub fn oauth(&self) -> Option<&dyn OAuthWallet> {
        match self {
            ProviderAdapter::PayPal(p) => Some(p),
            ProviderAdapter::Venmo(p) => Some(p),
            ProviderAdapter::CashApp(p) => Some(p),
            ProviderAdapter::Mock(p) => Some(p),
            _ => None,
        }
    }

    /// Typed PayPal handle for capture operations.
    pub fn paypal(&self) -> Option<&PayPalProvider> {
        match self {
            ProviderAdapter::PayPal(p) => Some(p),
            _ => None,
        }
    }

    /// Typed Plaid handle for link tokens and account balances.
    pub fn plaid(&self) -> Option<&PlaidProvider> {
        match self {
            ProviderAdapter::Plaid(p) => Some(p),
            _ => None,
        }
    }

    /// The provider this adapter fronts.
    pub fn kind(&self) -> ProviderKind {
        self.provider().kind()
    }

    /// Stores credentials without probing connectivity.
    ///
    /// The OAuth funding flows use this: building an authorization URL
    /// must not hit the provider.
    pub async fn configure(&self, config: &IntegrationConfig) -> Result<(), ProviderError> {
        match self {
            ProviderAdapter::PayPal(p) => p.configure(config).await,
            ProviderAdapter::Venmo(p) => p.configure(config).await,
            ProviderAdapter::CashApp(p) => p.configure(config).await,
            ProviderAdapter::Plaid(p) => p.configure(config).await,
            ProviderAdapter::Expensify(p) => p.configure(config).await,
            ProviderAdapter::Mock(p) => p.configure(config).await,
        }
    }
}

/// Constructs the adapter variant matching a configuration's provider.
///
/// This is the single dispatch point from provider tag to concrete
/// adapter; implementations beyond [`HttpProviderFactory`] exist so tests
/// can hand the registry scripted adapters.
pub trait ProviderFactory: Send + Sync {
    fn create(&self, config: &IntegrationConfig) -> Result<ProviderAdapter, DomainError>;
}

/// Factory producing real HTTP-backed adapters.
///
/// Honors an `api_base_url` settings override so tests and sandbox
/// deployments can point an adapter at a different host.
#[derive(Debug, Clone, Default)]
pub struct HttpProviderFactory;

impl HttpProviderFactory {
    pub fn new() -> Self {
        Self
    }
}

impl ProviderFactory for HttpProviderFactory {
    fn create(&self, config: &IntegrationConfig) -> Result<ProviderAdapter, DomainError> {
        let base_url = config.setting_str("api_base_url").map(str::to_string);
        let adapter = match config.provider {
            ProviderKind::PayPal => {
                let mut p = PayPalProvider::new();
                if let Some(url) = base_url {
                    p = p.with_base_url(url);
                }
                ProviderAdapter::PayPal(p)
            }
            ProviderKind::Venmo => {
                let mut p = VenmoProvider::new();
                if let Some(url) = base_url {
                    p = p.with_base_url(url);
                }
                ProviderAdapter::Venmo(p)
            }
            ProviderKind::CashApp => {
                let mut p = CashAppProvider::new();
                if let Some(url) = base_url {
                    p = p.with_base_url(url);
                }
                ProviderAdapter::CashApp(p)
            }
            ProviderKind::Plaid => {
                let mut p = PlaidProvider::new();
                if let Some(url) = base_url {
                    p = p.with_base_url(url);
                }
                ProviderAdapter::Plaid(p)
            }
            ProviderKind::Expensify => {
                let mut p = ExpensifyProvider::new();
                if let Some(url) = base_url {
                    p = p.with_base_url(url);
                }
                ProviderAdapter::Expensify(p)
            }
        };
        Ok(adapter)
    }
}

/// Builds the shared HTTP client used by every adapter.
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .expect("HTTP client construction cannot fail with static options")
}

/// Extracts a required credential from an integration configuration.
pub(crate) fn require_credential(
    config: &IntegrationConfig,
    key: &str,
) -> Result<SecretString, ProviderError> {
    config
        .credential(key)
        .cloned()
        .ok_or_else(|| ProviderError::authentication(format!("missing credential '{}'", key)))
}

/// Extracts a required credential as a plain string (for non-secret
/// identifiers like OAuth client ids that travel in URLs).
pub(crate) fn require_credential_str(
    config: &IntegrationConfig,
    key: &str,
) -> Result<String, ProviderError> {
    Ok(require_credential(config, key)?.expose_secret().clone())
}

/// Minimal percent-encoding for URL query values.
pub(crate) fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{:02X}", other)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::IntegrationId;

    fn config(provider: ProviderKind) -> IntegrationConfig {
        IntegrationConfig::new(IntegrationId::new("it-1").unwrap(), "Test", provider)
    }

    #[test]
    fn factory_builds_matching_variant() {
        let factory = HttpProviderFactory::new();
        for provider in [
            ProviderKind::PayPal,
            ProviderKind::Venmo,
            ProviderKind::CashApp,
            ProviderKind::Plaid,
            ProviderKind::Expensify,
        ] {
            let adapter = factory.create(&config(provider)).unwrap();
            assert_eq!(adapter.kind(), provider);
        }
    }

    #[test]
    fn typed_accessors_match_variants() {
        let factory = HttpProviderFactory::new();
        let paypal = factory.create(&config(ProviderKind::PayPal)).unwrap();
        assert!(paypal.paypal().is_some());
        assert!(paypal.plaid().is_none());
        assert!(paypal.wallet().is_some());
        assert!(paypal.oauth().is_some());

        let plaid = factory.create(&config(ProviderKind::Plaid)).unwrap();
        assert!(plaid.plaid().is_some());
        assert!(plaid.wallet().is_none());
        assert!(plaid.oauth().is_none());

        let expensify = factory.create(&config(ProviderKind::Expensify)).unwrap();
        assert!(expensify.wallet().is_none());
        assert!(expensify.paypal().is_none());
    }

    #[test]
    fn percent_encode_escapes_reserved_characters() {
        assert_eq!(percent_encode("abc-123_~.ok"), "abc-123_~.ok");
        assert_eq!(
            percent_encode("https://app.example/cb?x=1"),
            "https%3A%2F%2Fapp.example%2Fcb%3Fx%3D1"
        );
    }
}
