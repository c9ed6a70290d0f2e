//! Integration registry - orchestrates provider adapters and funding
//! sources.
//!
//! Explicitly constructed and injected into the HTTP layer; no global
//! state. The registry exclusively owns the id → live-adapter map and
//! depends on storage ports for configurations and funding sources, so the
//! same contract runs against fake stores in tests.
//!
//! Wallet adapters for the OAuth funding flows are constructed ad hoc from
//! app-level wallet credentials rather than through stored integrations -
//! wallets are OAuth-first for funding, while `add_integration` covers the
//! credentialed providers.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::adapters::providers::{
    AccountBalance, LinkToken, PlaidProvider, ProviderAdapter, ProviderFactory,
};
use crate::domain::foundation::{
    DomainError, ErrorCode, FundingSourceId, IntegrationId, Timestamp, UserId,
};
use crate::domain::integration::{
    ExpenseReport, FundingSource, IntegrationConfig, IntegrationStatus, ProviderKind, SyncResult,
};
use crate::ports::{
    CaptureResult, FundingSourceStore, IntegrationStore, PaymentLink, WalletBalance,
};

use super::OAuthStateSigner;

/// App-level OAuth/API credentials for one wallet provider.
#[derive(Clone)]
pub struct WalletCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
    /// OAuth redirect target registered with the provider.
    pub redirect_uri: Option<String>,
    /// Platform access token / API key for wallet API calls.
    pub access_token: Option<SecretString>,
    /// Platform receiving handle (Venmo username or cashtag).
    pub handle: Option<String>,
}

/// Credential-free projection of an integration for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrationView {
    pub id: IntegrationId,
    pub name: String,
    pub provider: ProviderKind,
    pub status: IntegrationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync_time: Option<Timestamp>,
}

impl From<&IntegrationConfig> for IntegrationView {
    fn from(config: &IntegrationConfig) -> Self {
        Self {
            id: config.id.clone(),
            name: config.name.clone(),
            provider: config.provider,
            status: config.status,
            last_sync_time: config.last_sync_time,
        }
    }
}

/// Typed handle for Plaid-specific operations.
///
/// Obtained from [`IntegrationRegistry::plaid_handle`]; existence of the
/// handle proves the integration is a Plaid one, so callers never downcast.
pub struct PlaidHandle {
    adapter: Arc<ProviderAdapter>,
}

impl PlaidHandle {
    fn plaid(&self) -> Result<&PlaidProvider, DomainError> {
        self.adapter.plaid().ok_or_else(|| {
            DomainError::new(ErrorCode::InternalError, "handle lost its Plaid adapter")
        })
    }

    /// Creates a Link token for the client-side connect flow.
    pub async fn create_link_token(&self, user_id: &UserId) -> Result<LinkToken, DomainError> {
        Ok(self.plaid()?.create_link_token(user_id).await?)
    }

    /// Fetches the balance of one linked account.
    pub async fn account_balance(&self, account_id: &str) -> Result<AccountBalance, DomainError> {
        Ok(self.plaid()?.get_account_balance(account_id).await?)
    }
}

/// Process-wide integration registry.
pub struct IntegrationRegistry {
    adapters: RwLock<HashMap<IntegrationId, Arc<ProviderAdapter>>>,
    store: Arc<dyn IntegrationStore>,
    funding: Arc<dyn FundingSourceStore>,
    factory: Arc<dyn ProviderFactory>,
    signer: OAuthStateSigner,
    wallets: HashMap<ProviderKind, WalletCredentials>,
}

impl IntegrationRegistry {
    /// Builds a registry over its dependencies.
    pub fn new(
        store: Arc<dyn IntegrationStore>,
        funding: Arc<dyn FundingSourceStore>,
        factory: Arc<dyn ProviderFactory>,
        signer: OAuthStateSigner,
        wallets: HashMap<ProviderKind, WalletCredentials>,
    ) -> Self {
        Self {
            adapters: RwLock::new(HashMap::new()),
            store,
            funding,
            factory,
            signer,
            wallets,
        }
    }

    // ── Integration lifecycle ───────────────────────────────────────────

    /// Adds an integration: constructs the matching adapter and connects.
    ///
    /// On success the configuration is stored with status Active and the
    /// adapter goes live. On connect failure the configuration is stored
    /// with status Error - retrievable, not silently dropped - and the
    /// error propagates. Duplicate ids are not deduplicated; last write
    /// wins.
    pub async fn add_integration(
        &self,
        mut config: IntegrationConfig,
    ) -> Result<IntegrationView, DomainError> {
        let adapter = self.factory.create(&config)?;

        match adapter.provider().connect(&config).await {
            Ok(()) => {
                config.status = IntegrationStatus::Active;
                let view = IntegrationView::from(&config);
                let id = config.id.clone();
                self.store.save(config).await?;
                self.adapters.write().await.insert(id.clone(), Arc::new(adapter));
                tracing::info!(integration = %id, provider = %view.provider, "integration connected");
                Ok(view)
            }
            Err(err) => {
                config.status = IntegrationStatus::Error;
                let id = config.id.clone();
                self.store.save(config).await?;
                tracing::warn!(integration = %id, error = %err, "integration connect failed");
                Err(err.into())
            }
        }
    }

    /// Removes an integration; silent no-op when the id is unknown.
    pub async fn remove_integration(&self, id: &IntegrationId) -> Result<(), DomainError> {
        let adapter = self.adapters.write().await.remove(id);
        if let Some(adapter) = adapter {
            if let Err(err) = adapter.provider().disconnect().await {
                tracing::warn!(integration = %id, error = %err, "disconnect failed during removal");
            }
        }
        self.store.delete(id).await?;
        Ok(())
    }

    /// Syncs one integration: expenses, then categories.
    ///
    /// Both steps run even if one reports failure; an adapter-level error
    /// aborts the sync and marks the integration Error. Counts sum and
    /// success ANDs across the steps. On overall success the configuration
    /// gets a fresh `last_sync_time` and status Active.
    pub async fn sync_integration(
        &self,
        id: &IntegrationId,
        since: Option<Timestamp>,
    ) -> Result<SyncResult, DomainError> {
        let adapter = self.live_adapter(id).await?;

        let expenses = match adapter.provider().sync_expenses(since).await {
            Ok(result) => result,
            Err(err) => {
                self.set_status(id, IntegrationStatus::Error).await;
                return Err(err.into());
            }
        };
        let categories = match adapter.provider().sync_categories().await {
            Ok(result) => result,
            Err(err) => {
                self.set_status(id, IntegrationStatus::Error).await;
                return Err(err.into());
            }
        };

        let combined = expenses.merge(categories);
        if combined.success {
            if let Some(mut config) = self.store.get(id).await? {
                config.last_sync_time = Some(Timestamp::now());
                config.status = IntegrationStatus::Active;
                self.store.save(config).await?;
            }
        }
        tracing::info!(
            integration = %id,
            synced = combined.synced_items,
            success = combined.success,
            "sync finished"
        );
        Ok(combined)
    }

    /// Fetches one integration's status.
    pub async fn get_integration_status(
        &self,
        id: &IntegrationId,
    ) -> Result<IntegrationStatus, DomainError> {
        let config = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| DomainError::integration_not_found(id))?;
        Ok(config.status)
    }

    /// Fetches one integration's credential-free view.
    pub async fn get_integration(&self, id: &IntegrationId) -> Result<IntegrationView, DomainError> {
        let config = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| DomainError::integration_not_found(id))?;
        Ok(IntegrationView::from(&config))
    }

    /// Lists all integrations.
    pub async fn list_integrations(&self) -> Result<Vec<IntegrationView>, DomainError> {
        let configs = self.store.list().await?;
        Ok(configs.iter().map(IntegrationView::from).collect())
    }

    // ── Expense reports ─────────────────────────────────────────────────

    pub async fn create_expense_report(
        &self,
        id: &IntegrationId,
        report: &ExpenseReport,
    ) -> Result<ExpenseReport, DomainError> {
        let adapter = self.live_adapter(id).await?;
        Ok(adapter.provider().create_expense_report(report).await?)
    }

    pub async fn update_expense_report(
        &self,
        id: &IntegrationId,
        report: &ExpenseReport,
    ) -> Result<ExpenseReport, DomainError> {
        let adapter = self.live_adapter(id).await?;
        Ok(adapter.provider().update_expense_report(report).await?)
    }

    pub async fn get_expense_report(
        &self,
        id: &IntegrationId,
        report_id: &str,
    ) -> Result<ExpenseReport, DomainError> {
        let adapter = self.live_adapter(id).await?;
        Ok(adapter.provider().get_expense_report(report_id).await?)
    }

    // ── Plaid typed handle ──────────────────────────────────────────────

    /// Obtains the typed handle for a Plaid integration.
    ///
    /// Fails with an unsupported-operation error when the integration is
    /// not a Plaid one.
    pub async fn plaid_handle(&self, id: &IntegrationId) -> Result<PlaidHandle, DomainError> {
        let adapter = self.live_adapter(id).await?;
        if adapter.plaid().is_none() {
            return Err(DomainError::unsupported_operation(format!(
                "integration '{}' is not a Plaid integration",
                id
            )));
        }
        Ok(PlaidHandle { adapter })
    }

    // ── OAuth funding flows ─────────────────────────────────────────────

    /// Builds the authorization URL (and its signed state) for connecting
    /// a wallet funding source.
    pub async fn wallet_auth_url(
        &self,
        provider: ProviderKind,
        user_id: &UserId,
    ) -> Result<(String, String), DomainError> {
        let adapter = self.wallet_adapter(provider).await?;
        let oauth = adapter.oauth().ok_or_else(|| {
            DomainError::unsupported_operation(format!(
                "{} has no OAuth funding flow",
                provider.display_name()
            ))
        })?;
        let state = self.signer.issue(user_id, provider);
        let url = oauth.authorization_url(&state);
        Ok((url, state))
    }

    /// Completes a wallet OAuth callback: verifies the state, exchanges
    /// the code, and appends a funding source to the user's list.
    ///
    /// No dedup by provider: reconnecting the same provider adds a second
    /// source.
    pub async fn handle_wallet_callback(
        &self,
        provider: ProviderKind,
        code: &str,
        state: &str,
        user_id: &UserId,
    ) -> Result<FundingSource, DomainError> {
        self.signer.verify(state, user_id, provider)?;

        let adapter = self.wallet_adapter(provider).await?;
        let oauth = adapter.oauth().ok_or_else(|| {
            DomainError::unsupported_operation(format!(
                "{} has no OAuth funding flow",
                provider.display_name()
            ))
        })?;

        let account = oauth.exchange_code(code).await?;
        let source = FundingSource::connected(user_id.clone(), provider, account);
        self.funding.append(source.clone()).await?;
        tracing::info!(
            user = %user_id,
            provider = %provider,
            source = %source.id,
            "funding source connected"
        );
        Ok(source)
    }

    /// Lists a user's funding sources.
    pub async fn get_funding_sources(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<FundingSource>, DomainError> {
        self.funding.list_for_user(user_id).await
    }

    /// Disconnects a funding source; no-op when the id is unknown.
    pub async fn disconnect_funding_source(
        &self,
        user_id: &UserId,
        source_id: &FundingSourceId,
    ) -> Result<(), DomainError> {
        let removed = self.funding.remove(user_id, source_id).await?;
        if removed {
            tracing::info!(user = %user_id, source = %source_id, "funding source disconnected");
        }
        Ok(())
    }

    /// Validates a funding source: it must be connected and its wallet
    /// reachable.
    pub async fn validate_funding_source(
        &self,
        user_id: &UserId,
        source_id: &FundingSourceId,
    ) -> Result<bool, DomainError> {
        let source = self.require_source(user_id, source_id).await?;
        if !source.connected {
            return Ok(false);
        }
        let adapter = self.wallet_adapter(source.provider).await?;
        Ok(adapter.provider().test_connection().await)
    }

    /// Creates a payment link through a funding source's wallet.
    pub async fn create_payment_link(
        &self,
        user_id: &UserId,
        provider: ProviderKind,
        source_id: &FundingSourceId,
        amount: f64,
        currency: &str,
        note: Option<&str>,
    ) -> Result<PaymentLink, DomainError> {
        let source = self.require_source(user_id, source_id).await?;
        if source.provider != provider {
            return Err(DomainError::validation(
                "provider",
                format!(
                    "funding source '{}' belongs to {}, not {}",
                    source_id, source.provider, provider
                ),
            ));
        }
        let adapter = self.wallet_adapter(provider).await?;
        let wallet = self.require_wallet(&adapter, provider)?;
        Ok(wallet.create_payment_link(amount, currency, note).await?)
    }

    /// Captures an approved PayPal order.
    pub async fn capture_paypal_order(
        &self,
        user_id: &UserId,
        source_id: &FundingSourceId,
        order_id: &str,
    ) -> Result<CaptureResult, DomainError> {
        let source = self.require_source(user_id, source_id).await?;
        if source.provider != ProviderKind::PayPal {
            return Err(DomainError::unsupported_operation(
                "payment capture is a PayPal operation",
            ));
        }
        let adapter = self.wallet_adapter(ProviderKind::PayPal).await?;
        match adapter.paypal() {
            Some(paypal) => Ok(paypal.capture_order(order_id).await?),
            // The mock stands in for PayPal in tests; route captures
            // through its generic payment-link reference instead.
            None => Err(DomainError::unsupported_operation(
                "capture requires a PayPal wallet adapter",
            )),
        }
    }

    /// Fetches the balance of a funding source's wallet.
    pub async fn wallet_balance(
        &self,
        user_id: &UserId,
        provider: ProviderKind,
        source_id: &FundingSourceId,
    ) -> Result<WalletBalance, DomainError> {
        let source = self.require_source(user_id, source_id).await?;
        if source.provider != provider {
            return Err(DomainError::validation(
                "provider",
                format!(
                    "funding source '{}' belongs to {}, not {}",
                    source_id, source.provider, provider
                ),
            ));
        }
        let adapter = self.wallet_adapter(provider).await?;
        let wallet = self.require_wallet(&adapter, provider)?;
        Ok(wallet.get_balance().await?)
    }

    /// Creates an add-funds payment link and stamps the source as used.
    pub async fn add_funds(
        &self,
        user_id: &UserId,
        source_id: &FundingSourceId,
        amount: f64,
        currency: &str,
        note: Option<&str>,
    ) -> Result<PaymentLink, DomainError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(DomainError::validation(
                "amount",
                "must be a positive amount",
            ));
        }
        let mut source = self.require_source(user_id, source_id).await?;
        let adapter = self.wallet_adapter(source.provider).await?;
        let wallet = self.require_wallet(&adapter, source.provider)?;
        let link = wallet.create_payment_link(amount, currency, note).await?;

        source.touch(Timestamp::now());
        self.funding.update(source).await?;
        Ok(link)
    }

    // ── Internals ───────────────────────────────────────────────────────

    async fn live_adapter(&self, id: &IntegrationId) -> Result<Arc<ProviderAdapter>, DomainError> {
        if let Some(adapter) = self.adapters.read().await.get(id) {
            return Ok(adapter.clone());
        }
        // A stored configuration without a live adapter means connect
        // failed; distinguish that from a genuinely unknown id.
        if self.store.get(id).await?.is_some() {
            Err(DomainError::connection(format!(
                "integration '{}' is not connected",
                id
            )))
        } else {
            Err(DomainError::integration_not_found(id))
        }
    }

    async fn set_status(&self, id: &IntegrationId, status: IntegrationStatus) {
        match self.store.get(id).await {
            Ok(Some(mut config)) => {
                config.status = status;
                if let Err(err) = self.store.save(config).await {
                    tracing::warn!(integration = %id, error = %err, "status update failed");
                }
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(integration = %id, error = %err, "status lookup failed");
            }
        }
    }

    async fn require_source(
        &self,
        user_id: &UserId,
        source_id: &FundingSourceId,
    ) -> Result<FundingSource, DomainError> {
        self.funding
            .find(user_id, source_id)
            .await?
            .ok_or_else(|| DomainError::funding_source_not_found(source_id))
    }

    fn require_wallet<'a>(
        &self,
        adapter: &'a ProviderAdapter,
        provider: ProviderKind,
    ) -> Result<&'a dyn crate::ports::WalletProvider, DomainError> {
        adapter.wallet().ok_or_else(|| {
            DomainError::unsupported_operation(format!(
                "{} has no wallet capability",
                provider.display_name()
            ))
        })
    }

    /// Builds and configures an ad hoc wallet adapter from app-level
    /// credentials.
    async fn wallet_adapter(
        &self,
        provider: ProviderKind,
    ) -> Result<ProviderAdapter, DomainError> {
        if !provider.is_wallet() {
            return Err(DomainError::unsupported_operation(format!(
                "{} is not a wallet provider",
                provider.display_name()
            )));
        }
        let creds = self.wallets.get(&provider).ok_or_else(|| {
            DomainError::connection(format!(
                "no wallet credentials configured for {}",
                provider.display_name()
            ))
        })?;

        let id = IntegrationId::new(format!("wallet-{}", provider))
            .map_err(DomainError::from)?;
        let mut config = IntegrationConfig::new(id, provider.display_name(), provider)
            .with_credential("client_id", creds.client_id.clone())
            .with_credential("client_secret", creds.client_secret.expose_secret().clone());
        if let Some(redirect_uri) = &creds.redirect_uri {
            config = config.with_credential("redirect_uri", redirect_uri.clone());
        }
        if let Some(access_token) = &creds.access_token {
            let token = access_token.expose_secret().clone();
            config = config
                .with_credential("access_token", token.clone())
                .with_credential("api_key", token);
        }
        if let Some(handle) = &creds.handle {
            config = config
                .with_setting("username", serde_json::json!(handle))
                .with_setting("cashtag", serde_json::json!(handle));
        }

        let adapter = self.factory.create(&config)?;
        adapter.configure(&config).await.map_err(DomainError::from)?;
        Ok(adapter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::providers::MockProvider;
    use crate::adapters::storage::{InMemoryFundingSourceStore, InMemoryIntegrationStore};

    struct MockFactory;

    impl ProviderFactory for MockFactory {
        fn create(&self, config: &IntegrationConfig) -> Result<ProviderAdapter, DomainError> {
            Ok(ProviderAdapter::Mock(MockProvider::new(config.provider)))
        }
    }

    fn registry_with_wallets() -> IntegrationRegistry {
        let mut wallets = HashMap::new();
        for provider in [ProviderKind::PayPal, ProviderKind::Venmo] {
            wallets.insert(
                provider,
                WalletCredentials {
                    client_id: "cid".to_string(),
                    client_secret: SecretString::new("secret".to_string()),
                    redirect_uri: None,
                    access_token: None,
                    handle: None,
                },
            );
        }
        IntegrationRegistry::new(
            Arc::new(InMemoryIntegrationStore::new()),
            Arc::new(InMemoryFundingSourceStore::new()),
            Arc::new(MockFactory),
            OAuthStateSigner::new("unit-test-secret"),
            wallets,
        )
    }

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    #[tokio::test]
    async fn auth_url_fails_for_non_wallet_provider() {
        let registry = registry_with_wallets();
        let err = registry
            .wallet_auth_url(ProviderKind::Plaid, &user())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedOperation);
    }

    #[tokio::test]
    async fn auth_url_fails_without_wallet_credentials() {
        let registry = registry_with_wallets();
        // Cash App has no credentials in this fixture.
        let err = registry
            .wallet_auth_url(ProviderKind::CashApp, &user())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ConnectionFailed);
    }

    #[tokio::test]
    async fn callback_rejects_mismatched_state() {
        let registry = registry_with_wallets();
        let (_, state) = registry
            .wallet_auth_url(ProviderKind::PayPal, &user())
            .await
            .unwrap();
        // State issued for PayPal must not complete a Venmo callback.
        let err = registry
            .handle_wallet_callback(ProviderKind::Venmo, "code", &state, &user())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidOAuthState);
    }

    #[tokio::test]
    async fn callback_appends_funding_source() {
        let registry = registry_with_wallets();
        let (_, state) = registry
            .wallet_auth_url(ProviderKind::PayPal, &user())
            .await
            .unwrap();
        let source = registry
            .handle_wallet_callback(ProviderKind::PayPal, "code-1", &state, &user())
            .await
            .unwrap();
        assert_eq!(source.provider, ProviderKind::PayPal);
        assert_eq!(
            source.external_account_id.as_deref(),
            Some("mock-account-code-1")
        );

        let sources = registry.get_funding_sources(&user()).await.unwrap();
        assert_eq!(sources.len(), 1);
    }

    #[tokio::test]
    async fn disconnect_unknown_source_is_noop() {
        let registry = registry_with_wallets();
        registry
            .disconnect_funding_source(&user(), &FundingSourceId::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn add_funds_requires_positive_amount() {
        let registry = registry_with_wallets();
        let err = registry
            .add_funds(&user(), &FundingSourceId::new(), 0.0, "USD", None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn payment_link_checks_provider_match() {
        let registry = registry_with_wallets();
        let (_, state) = registry
            .wallet_auth_url(ProviderKind::PayPal, &user())
            .await
            .unwrap();
        let source = registry
            .handle_wallet_callback(ProviderKind::PayPal, "c", &state, &user())
            .await
            .unwrap();

        let err = registry
            .create_payment_link(&user(), ProviderKind::Venmo, &source.id, 10.0, "USD", None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let link = registry
            .create_payment_link(&user(), ProviderKind::PayPal, &source.id, 10.0, "USD", None)
            .await
            .unwrap();
        assert_eq!(link.amount, 10.0);
    }
}
