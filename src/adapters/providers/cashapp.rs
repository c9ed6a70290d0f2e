//! Cash App provider adapter.
//!
//! Wraps the Cash App API: API-key auth, cash.app payment pages for
//! payment links, cashtag validation, and the OAuth flow for connecting a
//! Cash App funding source.
//!
//! Cash App is a payment-only provider: expense-report operations fail
//! with an unsupported-operation error.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::Timestamp;
use crate::domain::integration::{
    ExpenseReport, ExternalAccount, IntegrationConfig, ProviderKind, SyncIssue, SyncResult,
};
use crate::ports::{
    sync_watermark, IntegrationProvider, OAuthWallet, PaymentLink, ProviderError, WalletBalance,
    WalletProvider,
};

use super::{http_client, percent_encode};

const DEFAULT_API_BASE_URL: &str = "https://api.cash.app/v1";
const PAYMENT_PAGE_BASE_URL: &str = "https://cash.app";

const WALLET_CATEGORIES: &[&str] = &["Payments", "Cash Card", "Transfers"];

struct CashAppCredentials {
    api_key: Option<SecretString>,
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    cashtag: Option<String>,
}

/// Cash App adapter.
pub struct CashAppProvider {
    http: reqwest::Client,
    api_base_url: String,
    credentials: RwLock<Option<CashAppCredentials>>,
}

impl CashAppProvider {
    /// Creates an unconfigured adapter against the live API.
    pub fn new() -> Self {
        Self {
            http: http_client(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            credentials: RwLock::new(None),
        }
    }

    /// Overrides the API base URL (sandbox, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Stores credentials without probing.
    ///
    /// Accepts an `api_key` credential for API access and/or a
    /// `client_id`/`client_secret` pair for the OAuth funding flow; the
    /// `cashtag` setting feeds payment-link generation.
    pub async fn configure(&self, config: &IntegrationConfig) -> Result<(), ProviderError> {
        let api_key = config.credential("api_key").cloned();
        let client_id = config
            .credential("client_id")
            .map(|s| s.expose_secret().clone());
        let client_secret = config.credential("client_secret").cloned();

        if api_key.is_none() && client_id.is_none() {
            return Err(ProviderError::authentication(
                "Cash App requires an api_key or an OAuth client_id/client_secret pair",
            ));
        }

        *self.credentials.write().await = Some(CashAppCredentials {
            api_key,
            client_id,
            client_secret,
            cashtag: config.setting_str("cashtag").map(str::to_string),
        });
        Ok(())
    }

    async fn api_key(&self) -> Result<String, ProviderError> {
        let guard = self.credentials.read().await;
        let creds = guard
            .as_ref()
            .ok_or_else(|| ProviderError::not_connected(ProviderKind::CashApp))?;
        creds
            .api_key
            .as_ref()
            .map(|k| k.expose_secret().clone())
            .ok_or_else(|| ProviderError::authentication("no Cash App API key configured"))
    }

    async fn cashtag(&self) -> Result<Option<String>, ProviderError> {
        let guard = self.credentials.read().await;
        let creds = guard
            .as_ref()
            .ok_or_else(|| ProviderError::not_connected(ProviderKind::CashApp))?;
        Ok(creds.cashtag.clone())
    }

    /// Cashtag shape rules: optional `$`, then 1-20 characters starting
    /// with a letter, alphanumeric throughout.
    pub fn cashtag_shape_ok(handle: &str) -> bool {
        let body = handle.strip_prefix('$').unwrap_or(handle);
        let len = body.chars().count();
        (1..=20).contains(&len)
            && body.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
            && body.chars().all(|c| c.is_ascii_alphanumeric())
    }
}

impl Default for CashAppProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IntegrationProvider for CashAppProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::CashApp
    }

    async fn connect(&self, config: &IntegrationConfig) -> Result<(), ProviderError> {
        self.configure(config).await?;
        if self.test_connection().await {
            Ok(())
        } else {
            Err(ProviderError::connection(
                "Cash App connectivity probe failed",
            ))
        }
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        *self.credentials.write().await = None;
        Ok(())
    }

    async fn test_connection(&self) -> bool {
        let Ok(key) = self.api_key().await else {
            return false;
        };
        match self
            .http
            .get(format!("{}/profile", self.api_base_url))
            .bearer_auth(&key)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn sync_expenses(&self, since: Option<Timestamp>) -> Result<SyncResult, ProviderError> {
        let key = match self.api_key().await {
            Ok(key) => key,
            Err(err) if err.code == crate::ports::ProviderErrorCode::NotConnected => {
                return Err(err)
            }
            Err(err) => {
                return Ok(SyncResult::failed(SyncIssue::new(
                    "CASHAPP_AUTH",
                    err.message,
                )))
            }
        };

        let watermark = sync_watermark(since);
        let response = match self
            .http
            .get(format!("{}/payments", self.api_base_url))
            .bearer_auth(&key)
            .query(&[("since", watermark.to_rfc3339())])
            .send()
            .await
        {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                return Ok(SyncResult::failed(SyncIssue::new(
                    "CASHAPP_SYNC",
                    format!("payments listing returned {}", r.status()),
                )))
            }
            Err(err) => {
                return Ok(SyncResult::failed(SyncIssue::new(
                    "CASHAPP_NETWORK",
                    err.to_string(),
                )))
            }
        };

        let body: PaymentsResponse = match response.json().await {
            Ok(body) => body,
            Err(err) => {
                return Ok(SyncResult::failed(SyncIssue::new(
                    "CASHAPP_DECODE",
                    err.to_string(),
                )))
            }
        };

        let records: Vec<serde_json::Value> = body
            .payments
            .iter()
            .map(|p| {
                serde_json::json!({
                    "id": p.id,
                    "amount": p.amount.amount,
                    "currency": p.amount.currency,
                    "date": p.created_at,
                    "description": p.note,
                })
            })
            .collect();

        let count = records.len() as u32;
        Ok(SyncResult::ok_with_details(
            count,
            serde_json::json!({ "transactions": records }),
        ))
    }

    async fn sync_categories(&self) -> Result<SyncResult, ProviderError> {
        let guard = self.credentials.read().await;
        if guard.is_none() {
            return Err(ProviderError::not_connected(ProviderKind::CashApp));
        }
        Ok(SyncResult::ok_with_details(
            WALLET_CATEGORIES.len() as u32,
            serde_json::json!({ "categories": WALLET_CATEGORIES }),
        ))
    }

    async fn create_expense_report(
        &self,
        _report: &ExpenseReport,
    ) -> Result<ExpenseReport, ProviderError> {
        Err(ProviderError::unsupported(
            "expense reports",
            ProviderKind::CashApp,
        ))
    }

    async fn update_expense_report(
        &self,
        _report: &ExpenseReport,
    ) -> Result<ExpenseReport, ProviderError> {
        Err(ProviderError::unsupported(
            "expense reports",
            ProviderKind::CashApp,
        ))
    }

    async fn get_expense_report(&self, _report_id: &str) -> Result<ExpenseReport, ProviderError> {
        Err(ProviderError::unsupported(
            "expense reports",
            ProviderKind::CashApp,
        ))
    }

    async fn get_categories(&self) -> Result<Vec<String>, ProviderError> {
        Ok(WALLET_CATEGORIES.iter().map(|s| s.to_string()).collect())
    }

    fn get_mapping_fields(&self) -> HashMap<String, String> {
        HashMap::from([
            ("id".to_string(), "id".to_string()),
            ("amount".to_string(), "amount.amount".to_string()),
            ("date".to_string(), "created_at".to_string()),
            ("description".to_string(), "note".to_string()),
        ])
    }
}

#[async_trait]
impl WalletProvider for CashAppProvider {
    async fn create_payment_link(
        &self,
        amount: f64,
        currency: &str,
        _note: Option<&str>,
    ) -> Result<PaymentLink, ProviderError> {
        let cashtag = self.cashtag().await?.ok_or_else(|| {
            ProviderError::invalid_response("no cashtag configured for payment links")
        })?;
        if !Self::cashtag_shape_ok(&cashtag) {
            return Err(ProviderError::invalid_response(format!(
                "configured cashtag '{}' is malformed",
                cashtag
            )));
        }
        let body = cashtag.strip_prefix('$').unwrap_or(&cashtag);

        Ok(PaymentLink {
            url: format!("{}/${}/{:.2}", PAYMENT_PAGE_BASE_URL, body, amount),
            reference: None,
            amount,
            currency: currency.to_string(),
        })
    }

    async fn get_balance(&self) -> Result<WalletBalance, ProviderError> {
        let key = self.api_key().await?;
        let response = self
            .http
            .get(format!("{}/balance", self.api_base_url))
            .bearer_auth(&key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::invalid_response(format!(
                "balance lookup failed with {}",
                response.status()
            )));
        }

        let body: BalanceResponse = response.json().await?;
        Ok(WalletBalance {
            available: body.available.amount,
            currency: body.available.currency,
            as_of: Timestamp::now(),
        })
    }

    async fn validate_recipient(&self, handle: &str) -> Result<bool, ProviderError> {
        // Cashtag validation is a local shape check.
        Ok(Self::cashtag_shape_ok(handle))
    }
}

#[async_trait]
impl OAuthWallet for CashAppProvider {
    fn authorization_url(&self, state: &str) -> String {
        let client_id = match self.credentials.try_read() {
            Ok(guard) => guard
                .as_ref()
                .and_then(|c| c.client_id.clone())
                .unwrap_or_default(),
            Err(_) => String::new(),
        };
        format!(
            "{}/oauth/authorize?client_id={}&response_type=code&state={}",
            PAYMENT_PAGE_BASE_URL,
            percent_encode(&client_id),
            state
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<ExternalAccount, ProviderError> {
        let (client_id, client_secret) = {
            let guard = self.credentials.read().await;
            let creds = guard
                .as_ref()
                .ok_or_else(|| ProviderError::not_connected(ProviderKind::CashApp))?;
            let client_id = creds.client_id.clone().ok_or_else(|| {
                ProviderError::authentication("no Cash App OAuth client configured")
            })?;
            let client_secret = creds
                .client_secret
                .as_ref()
                .map(|s| s.expose_secret().clone())
                .ok_or_else(|| {
                    ProviderError::authentication("no Cash App OAuth client secret configured")
                })?;
            (client_id, client_secret)
        };

        let response = self
            .http
            .post(format!("{}/oauth/token", self.api_base_url))
            .json(&serde_json::json!({
                "client_id": client_id,
                "client_secret": client_secret,
                "grant_type": "authorization_code",
                "code": code,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::authentication(format!(
                "authorization code exchange failed with {}",
                response.status()
            )));
        }

        let body: OAuthTokenResponse = response.json().await?;
        Ok(ExternalAccount {
            account_id: body.customer_id,
            display_name: body.cashtag,
        })
    }
}

// ── Wire types ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PaymentsResponse {
    #[serde(default)]
    payments: Vec<Payment>,
}

#[derive(Debug, Deserialize)]
struct Payment {
    id: String,
    amount: MoneyAmount,
    #[serde(default)]
    note: Option<String>,
    created_at: String,
}

#[derive(Debug, Deserialize)]
struct MoneyAmount {
    amount: f64,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    available: MoneyAmount,
}

#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    customer_id: String,
    #[serde(default)]
    cashtag: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::IntegrationId;

    fn config() -> IntegrationConfig {
        IntegrationConfig::new(
            IntegrationId::new("ca-1").unwrap(),
            "Cash App",
            ProviderKind::CashApp,
        )
        .with_credential("api_key", "key")
        .with_setting("cashtag", serde_json::json!("$alice"))
    }

    #[test]
    fn cashtag_shape_rules() {
        assert!(CashAppProvider::cashtag_shape_ok("$alice"));
        assert!(CashAppProvider::cashtag_shape_ok("alice2"));
        assert!(!CashAppProvider::cashtag_shape_ok("$2alice"));
        assert!(!CashAppProvider::cashtag_shape_ok("$"));
        assert!(!CashAppProvider::cashtag_shape_ok("$has space"));
        assert!(!CashAppProvider::cashtag_shape_ok(&format!(
            "${}",
            "x".repeat(21)
        )));
    }

    #[tokio::test]
    async fn payment_link_normalizes_cashtag() {
        let provider = CashAppProvider::new();
        provider.configure(&config()).await.unwrap();
        let link = provider.create_payment_link(42.0, "USD", None).await.unwrap();
        assert_eq!(link.url, "https://cash.app/$alice/42.00");
    }

    #[tokio::test]
    async fn validate_recipient_is_local() {
        let provider = CashAppProvider::new();
        assert!(provider.validate_recipient("$bob").await.unwrap());
        assert!(!provider.validate_recipient("$99problems").await.unwrap());
    }

    #[tokio::test]
    async fn configure_rejects_empty_credentials() {
        let provider = CashAppProvider::new();
        let empty = IntegrationConfig::new(
            IntegrationId::new("ca-1").unwrap(),
            "Cash App",
            ProviderKind::CashApp,
        );
        assert!(provider.configure(&empty).await.is_err());
    }

    #[tokio::test]
    async fn expense_reports_are_unsupported() {
        let provider = CashAppProvider::new();
        provider.configure(&config()).await.unwrap();
        assert!(provider.get_expense_report("r1").await.is_err());
    }
}
