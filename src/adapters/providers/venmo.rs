//! Venmo provider adapter.
//!
//! Wraps the Venmo API: bearer-token auth against `/me`, payment pages for
//! payment links, username validation, and the OAuth flow for connecting a
//! Venmo funding source.
//!
//! Venmo is a payment-only provider: expense-report operations fail with
//! an unsupported-operation error.

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

const DEFAULT_API_BASE_URL: &str = "https://api.venmo.com/v1";
const PAYMENT_PAGE_BASE_URL: &str = "https://venmo.com";

const WALLET_CATEGORIES: &[&str] = &["Payments", "Transfers"];

struct VenmoCredentials {
    access_token: Option<SecretString>,
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    username: Option<String>,
}

/// Venmo adapter.
pub struct VenmoProvider {
    http: reqwest::Client,
    api_base_url: String,
    credentials: RwLock<Option<VenmoCredentials>>,
}

impl VenmoProvider {
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
    /// Accepts an `access_token` credential for API access and/or a
    /// `client_id`/`client_secret` pair for the OAuth funding flow; the
    /// `username` setting feeds payment-link generation.
    pub async fn configure(&self, config: &IntegrationConfig) -> Result<(), ProviderError> {
        let access_token = config.credential("access_token").cloned();
        let client_id = config
            .credential("client_id")
            .map(|s| s.expose_secret().clone());
        let client_secret = config.credential("client_secret").cloned();

        if access_token.is_none() && client_id.is_none() {
            return Err(ProviderError::authentication(
                "Venmo requires an access_token or an OAuth client_id/client_secret pair",
            ));
        }

        *self.credentials.write().await = Some(VenmoCredentials {
            access_token,
            client_id,
            client_secret,
            username: config.setting_str("username").map(str::to_string),
        });
        Ok(())
    }

    async fn token(&self) -> Result<String, ProviderError> {
        let guard = self.credentials.read().await;
        let creds = guard
            .as_ref()
            .ok_or_else(|| ProviderError::not_connected(ProviderKind::Venmo))?;
        creds
            .access_token
            .as_ref()
            .map(|t| t.expose_secret().clone())
            .ok_or_else(|| ProviderError::authentication("no Venmo access token configured"))
    }

    async fn username(&self) -> Result<Option<String>, ProviderError> {
        let guard = self.credentials.read().await;
        let creds = guard
            .as_ref()
            .ok_or_else(|| ProviderError::not_connected(ProviderKind::Venmo))?;
        Ok(creds.username.clone())
    }

    fn username_shape_ok(handle: &str) -> bool {
        let len = handle.chars().count();
        (5..=30).contains(&len)
            && handle
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl Default for VenmoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IntegrationProvider for VenmoProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Venmo
    }

    async fn connect(&self, config: &IntegrationConfig) -> Result<(), ProviderError> {
        self.configure(config).await?;
        if self.test_connection().await {
            Ok(())
        } else {
            Err(ProviderError::connection("Venmo connectivity probe failed"))
        }
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        *self.credentials.write().await = None;
        Ok(())
    }

    async fn test_connection(&self) -> bool {
        let Ok(token) = self.token().await else {
            return false;
        };
        match self
            .http
            .get(format!("{}/me", self.api_base_url))
            .bearer_auth(&token)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn sync_expenses(&self, since: Option<Timestamp>) -> Result<SyncResult, ProviderError> {
        let token = match self.token().await {
            Ok(token) => token,
            Err(err) if err.code == crate::ports::ProviderErrorCode::NotConnected => {
                return Err(err)
            }
            Err(err) => {
                return Ok(SyncResult::failed(SyncIssue::new(
                    "VENMO_AUTH",
                    err.message,
                )))
            }
        };

        let response = match self
            .http
            .get(format!("{}/payments", self.api_base_url))
            .bearer_auth(&token)
            .query(&[("limit", "100")])
            .send()
            .await
        {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                return Ok(SyncResult::failed(SyncIssue::new(
                    "VENMO_SYNC",
                    format!("payments listing returned {}", r.status()),
                )))
            }
            Err(err) => {
                return Ok(SyncResult::failed(SyncIssue::new(
                    "VENMO_NETWORK",
                    err.to_string(),
                )))
            }
        };

        let body: PaymentsResponse = match response.json().await {
            Ok(body) => body,
            Err(err) => {
                return Ok(SyncResult::failed(SyncIssue::new(
                    "VENMO_DECODE",
                    err.to_string(),
                )))
            }
        };

        // The payments listing has no server-side watermark; filter here.
        let watermark = sync_watermark(since);
        let records: Vec<serde_json::Value> = body
            .data
            .iter()
            .filter(|p| {
                Timestamp::parse_rfc3339(&p.date_created)
                    .map(|created| !created.is_before(&watermark))
                    .unwrap_or(true)
            })
            .map(|p| {
                serde_json::json!({
                    "id": p.id,
                    "amount": p.amount,
                    "date": p.date_created,
                    "description": p.note,
                    "status": p.status,
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
            return Err(ProviderError::not_connected(ProviderKind::Venmo));
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
            ProviderKind::Venmo,
        ))
    }

    async fn update_expense_report(
        &self,
        _report: &ExpenseReport,
    ) -> Result<ExpenseReport, ProviderError> {
        Err(ProviderError::unsupported(
            "expense reports",
            ProviderKind::Venmo,
        ))
    }

    async fn get_expense_report(&self, _report_id: &str) -> Result<ExpenseReport, ProviderError> {
        Err(ProviderError::unsupported(
            "expense reports",
            ProviderKind::Venmo,
        ))
    }

    async fn get_categories(&self) -> Result<Vec<String>, ProviderError> {
        Ok(WALLET_CATEGORIES.iter().map(|s| s.to_string()).collect())
    }

    fn get_mapping_fields(&self) -> HashMap<String, String> {
        HashMap::from([
            ("id".to_string(), "id".to_string()),
            ("amount".to_string(), "amount".to_string()),
            ("date".to_string(), "date_created".to_string()),
            ("description".to_string(), "note".to_string()),
        ])
    }
}

#[async_trait]
impl WalletProvider for VenmoProvider {
    async fn create_payment_link(
        &self,
        amount: f64,
        currency: &str,
        note: Option<&str>,
    ) -> Result<PaymentLink, ProviderError> {
        let username = self.username().await?.ok_or_else(|| {
            ProviderError::invalid_response("no Venmo username configured for payment links")
        })?;

        let mut url = format!(
            "{}/{}?txn=pay&amount={:.2}",
            PAYMENT_PAGE_BASE_URL,
            percent_encode(&username),
            amount
        );
        if let Some(note) = note {
            url.push_str("&note=");
            url.push_str(&percent_encode(note));
        }

        Ok(PaymentLink {
            url,
            reference: None,
            amount,
            currency: currency.to_string(),
        })
    }

    async fn get_balance(&self) -> Result<WalletBalance, ProviderError> {
        let token = self.token().await?;
        let response = self
            .http
            .get(format!("{}/me", self.api_base_url))
            .bearer_auth(&token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::invalid_response(format!(
                "profile lookup failed with {}",
                response.status()
            )));
        }

        let body: MeResponse = response.json().await?;
        let available = body
            .data
            .balance
            .parse()
            .map_err(|_| ProviderError::invalid_response("balance value is not a number"))?;

        Ok(WalletBalance {
            available,
            currency: "USD".to_string(),
            as_of: Timestamp::now(),
        })
    }

    async fn validate_recipient(&self, handle: &str) -> Result<bool, ProviderError> {
        if !Self::username_shape_ok(handle) {
            return Ok(false);
        }
        // Confirm the username exists when we hold a token; shape-only
        // validation otherwise.
        let Ok(token) = self.token().await else {
            return Ok(true);
        };
        let response = self
            .http
            .get(format!("{}/users/{}", self.api_base_url, handle))
            .bearer_auth(&token)
            .send()
            .await?;
        Ok(response.status().is_success())
    }
}

#[async_trait]
impl OAuthWallet for VenmoProvider {
    fn authorization_url(&self, state: &str) -> String {
        let client_id = match self.credentials.try_read() {
            Ok(guard) => guard
                .as_ref()
                .and_then(|c| c.client_id.clone())
                .unwrap_or_default(),
            Err(_) => String::new(),
        };
        format!(
            "{}/oauth/authorize?client_id={}&scope=make_payments%20access_profile&response_type=code&state={}",
            self.api_base_url,
            percent_encode(&client_id),
            state
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<ExternalAccount, ProviderError> {
        let (client_id, client_secret) = {
            let guard = self.credentials.read().await;
            let creds = guard
                .as_ref()
                .ok_or_else(|| ProviderError::not_connected(ProviderKind::Venmo))?;
            let client_id = creds.client_id.clone().ok_or_else(|| {
                ProviderError::authentication("no Venmo OAuth client configured")
            })?;
            let client_secret = creds
                .client_secret
                .as_ref()
                .map(|s| s.expose_secret().clone())
                .ok_or_else(|| {
                    ProviderError::authentication("no Venmo OAuth client secret configured")
                })?;
            (client_id, client_secret)
        };

        let response = self
            .http
            .post(format!("{}/oauth/access_token", self.api_base_url))
            .json(&serde_json::json!({
                "client_id": client_id,
                "client_secret": client_secret,
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

        let body: AccessTokenResponse = response.json().await?;
        Ok(ExternalAccount {
            account_id: body.user.id,
            display_name: Some(body.user.username),
        })
    }
}

// ── Wire types ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PaymentsResponse {
    #[serde(default)]
    data: Vec<Payment>,
}

#[derive(Debug, Deserialize)]
struct Payment {
    id: String,
    amount: f64,
    #[serde(default)]
    note: Option<String>,
    date_created: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    data: Profile,
}

#[derive(Debug, Deserialize)]
struct Profile {
    balance: String,
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    user: VenmoUser,
}

#[derive(Debug, Deserialize)]
struct VenmoUser {
    id: String,
    username: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::IntegrationId;

    fn oauth_config() -> IntegrationConfig {
        IntegrationConfig::new(
            IntegrationId::new("vm-1").unwrap(),
            "Venmo",
            ProviderKind::Venmo,
        )
        .with_credential("client_id", "cid")
        .with_credential("client_secret", "secret")
    }

    fn token_config() -> IntegrationConfig {
        IntegrationConfig::new(
            IntegrationId::new("vm-1").unwrap(),
            "Venmo",
            ProviderKind::Venmo,
        )
        .with_credential("access_token", "tok")
        .with_setting("username", serde_json::json!("alice-pays"))
    }

    #[tokio::test]
    async fn configure_rejects_empty_credentials() {
        let provider = VenmoProvider::new();
        let empty = IntegrationConfig::new(
            IntegrationId::new("vm-1").unwrap(),
            "Venmo",
            ProviderKind::Venmo,
        );
        assert!(provider.configure(&empty).await.is_err());
    }

    #[tokio::test]
    async fn payment_link_uses_configured_username() {
        let provider = VenmoProvider::new();
        provider.configure(&token_config()).await.unwrap();
        let link = provider
            .create_payment_link(25.5, "USD", Some("card top-up"))
            .await
            .unwrap();
        assert_eq!(
            link.url,
            "https://venmo.com/alice-pays?txn=pay&amount=25.50&note=card%20top-up"
        );
        assert!(link.reference.is_none());
    }

    #[tokio::test]
    async fn payment_link_without_username_fails() {
        let provider = VenmoProvider::new();
        provider.configure(&oauth_config()).await.unwrap();
        assert!(provider.create_payment_link(10.0, "USD", None).await.is_err());
    }

    #[test]
    fn username_shape_rules() {
        assert!(VenmoProvider::username_shape_ok("alice-pays"));
        assert!(VenmoProvider::username_shape_ok("bob_2024"));
        assert!(!VenmoProvider::username_shape_ok("ab"));
        assert!(!VenmoProvider::username_shape_ok("has space"));
        assert!(!VenmoProvider::username_shape_ok(&"x".repeat(31)));
    }

    #[tokio::test]
    async fn authorization_url_carries_state() {
        let provider = VenmoProvider::new();
        provider.configure(&oauth_config()).await.unwrap();
        let url = provider.authorization_url("st4te");
        assert!(url.contains("state=st4te"));
        assert!(url.contains("client_id=cid"));
        assert!(url.contains("response_type=code"));
    }

    #[tokio::test]
    async fn expense_reports_are_unsupported() {
        let provider = VenmoProvider::new();
        provider.configure(&token_config()).await.unwrap();
        let report = ExpenseReport::draft("r", "a@b.c", 1.0, "USD");
        assert!(provider.update_expense_report(&report).await.is_err());
    }
}
