//! Plaid provider adapter.
//!
//! Wraps the Plaid API: client-id/secret auth in request bodies, link
//! tokens for account connection, transaction and category sync, and
//! per-account balance lookups.
//!
//! Plaid is an account-data provider: expense-report operations fail with
//! an unsupported-operation error, and it takes no part in the wallet
//! OAuth funding flows.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::integration::{
    ExpenseReport, IntegrationConfig, ProviderKind, SyncIssue, SyncResult,
};
use crate::ports::{sync_watermark, IntegrationProvider, ProviderError};

use super::http_client;

const DEFAULT_API_BASE_URL: &str = "https://production.plaid.com";
const LINK_CLIENT_NAME: &str = "Cardpilot";

struct PlaidCredentials {
    client_id: String,
    secret: SecretString,
    /// Item access token; present once an account is linked.
    access_token: Option<SecretString>,
}

/// A Plaid Link token for the client-side connect flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkToken {
    pub link_token: String,
    pub expiration: String,
}

/// Balance snapshot for one linked account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountBalance {
    pub account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<f64>,
    pub current: f64,
    pub currency: String,
}

/// Plaid adapter.
pub struct PlaidProvider {
    http: reqwest::Client,
    api_base_url: String,
    credentials: RwLock<Option<PlaidCredentials>>,
}

impl PlaidProvider {
    /// Creates an unconfigured adapter against the production environment.
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
    /// Expects `client_id` and `secret` credentials; an optional
    /// `access_token` credential unlocks transaction and balance calls for
    /// an already-linked item.
    pub async fn configure(&self, config: &IntegrationConfig) -> Result<(), ProviderError> {
        let client_id = config
            .credential("client_id")
            .map(|s| s.expose_secret().clone())
            .ok_or_else(|| ProviderError::authentication("missing credential 'client_id'"))?;
        let secret = config
            .credential("secret")
            .cloned()
            .ok_or_else(|| ProviderError::authentication("missing credential 'secret'"))?;

        *self.credentials.write().await = Some(PlaidCredentials {
            client_id,
            secret,
            access_token: config.credential("access_token").cloned(),
        });
        Ok(())
    }

    async fn auth_body(&self) -> Result<(String, String, Option<String>), ProviderError> {
        let guard = self.credentials.read().await;
        let creds = guard
            .as_ref()
            .ok_or_else(|| ProviderError::not_connected(ProviderKind::Plaid))?;
        Ok((
            creds.client_id.clone(),
            creds.secret.expose_secret().clone(),
            creds
                .access_token
                .as_ref()
                .map(|t| t.expose_secret().clone()),
        ))
    }

    async fn post(
        &self,
        path: &str,
        mut body: serde_json::Value,
    ) -> Result<reqwest::Response, ProviderError> {
        let (client_id, secret, _) = self.auth_body().await?;
        body["client_id"] = serde_json::json!(client_id);
        body["secret"] = serde_json::json!(secret);

        let response = self
            .http
            .post(format!("{}{}", self.api_base_url, path))
            .json(&body)
            .send()
            .await?;
        Ok(response)
    }

    async fn decode_error(response: reqwest::Response) -> ProviderError {
        let status = response.status();
        match response.json::<PlaidError>().await {
            Ok(err) => {
                let base = if err.error_type == "INVALID_INPUT"
                    || err.error_type == "INVALID_API_KEYS"
                {
                    ProviderError::authentication(err.error_message)
                } else {
                    ProviderError::invalid_response(err.error_message)
                };
                base.with_provider_code(err.error_code)
            }
            Err(_) => ProviderError::invalid_response(format!("Plaid returned {}", status)),
        }
    }

    /// Creates a Link token for the client-side account connect flow.
    ///
    /// Plaid-specific extension outside the common contract, reached
    /// through the registry's typed handle.
    pub async fn create_link_token(&self, user_id: &UserId) -> Result<LinkToken, ProviderError> {
        let body = serde_json::json!({
            "client_name": LINK_CLIENT_NAME,
            "language": "en",
            "country_codes": ["US"],
            "user": { "client_user_id": user_id.as_str() },
            "products": ["transactions"],
        });
        let response = self.post("/link/token/create", body).await?;
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }
        let token: LinkToken = response.json().await?;
        Ok(token)
    }

    /// Fetches the balance of one linked account.
    pub async fn get_account_balance(
        &self,
        account_id: &str,
    ) -> Result<AccountBalance, ProviderError> {
        let (_, _, access_token) = self.auth_body().await?;
        let access_token = access_token.ok_or_else(|| {
            ProviderError::authentication("no Plaid access_token configured for balance lookups")
        })?;

        let body = serde_json::json!({
            "access_token": access_token,
            "options": { "account_ids": [account_id] },
        });
        let response = self.post("/accounts/balance/get", body).await?;
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }

        let parsed: AccountsResponse = response.json().await?;
        let account = parsed
            .accounts
            .into_iter()
            .find(|a| a.account_id == account_id)
            .ok_or_else(|| ProviderError::not_found("account"))?;

        Ok(AccountBalance {
            account_id: account.account_id,
            available: account.balances.available,
            current: account.balances.current,
            currency: account
                .balances
                .iso_currency_code
                .unwrap_or_else(|| "USD".to_string()),
        })
    }
}

impl Default for PlaidProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IntegrationProvider for PlaidProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Plaid
    }

    async fn connect(&self, config: &IntegrationConfig) -> Result<(), ProviderError> {
        self.configure(config).await?;
        if self.test_connection().await {
            Ok(())
        } else {
            Err(ProviderError::connection("Plaid connectivity probe failed"))
        }
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        *self.credentials.write().await = None;
        Ok(())
    }

    async fn test_connection(&self) -> bool {
        let Ok((_, _, access_token)) = self.auth_body().await else {
            return false;
        };
        // Probe the item when one is linked, the institutions catalog
        // otherwise - both exercise the credentials.
        let result = if access_token.is_some() {
            let body = serde_json::json!({
                "access_token": access_token,
            });
            self.post("/item/get", body).await
        } else {
            let body = serde_json::json!({
                "count": 1,
                "offset": 0,
                "country_codes": ["US"],
            });
            self.post("/institutions/get", body).await
        };
        matches!(result, Ok(response) if response.status().is_success())
    }

    async fn sync_expenses(&self, since: Option<Timestamp>) -> Result<SyncResult, ProviderError> {
        let (_, _, access_token) = self.auth_body().await?;
        let Some(access_token) = access_token else {
            return Ok(SyncResult::failed(SyncIssue::new(
                "PLAID_NO_ITEM",
                "no access_token configured; link an account first",
            )));
        };

        let start = sync_watermark(since);
        let end = Timestamp::now();
        let body = serde_json::json!({
            "access_token": access_token,
            "start_date": start.to_date_string(),
            "end_date": end.to_date_string(),
            "options": { "count": 500 },
        });

        let response = match self.post("/transactions/get", body).await {
            Ok(r) => r,
            Err(err) if err.code == crate::ports::ProviderErrorCode::NotConnected => {
                return Err(err)
            }
            Err(err) => {
                return Ok(SyncResult::failed(SyncIssue::new(
                    "PLAID_NETWORK",
                    err.message,
                )))
            }
        };

        if !response.status().is_success() {
            let err = Self::decode_error(response).await;
            return Ok(SyncResult::failed(
                SyncIssue::new("PLAID_SYNC", err.message).with_details(serde_json::json!({
                    "provider_code": err.provider_code,
                })),
            ));
        }

        let parsed: TransactionsResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(err) => {
                return Ok(SyncResult::failed(SyncIssue::new(
                    "PLAID_DECODE",
                    err.to_string(),
                )))
            }
        };

        let records: Vec<serde_json::Value> = parsed
            .transactions
            .iter()
            .map(|t| {
                serde_json::json!({
                    "id": t.transaction_id,
                    "amount": t.amount,
                    "currency": t.iso_currency_code,
                    "date": t.date,
                    "description": t.name,
                    "category": t.category,
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
        let response = match self.post("/categories/get", serde_json::json!({})).await {
            Ok(r) => r,
            Err(err) if err.code == crate::ports::ProviderErrorCode::NotConnected => {
                return Err(err)
            }
            Err(err) => {
                return Ok(SyncResult::failed(SyncIssue::new(
                    "PLAID_NETWORK",
                    err.message,
                )))
            }
        };

        if !response.status().is_success() {
            let err = Self::decode_error(response).await;
            return Ok(SyncResult::failed(SyncIssue::new(
                "PLAID_CATEGORIES",
                err.message,
            )));
        }

        let parsed: CategoriesResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(err) => {
                return Ok(SyncResult::failed(SyncIssue::new(
                    "PLAID_DECODE",
                    err.to_string(),
                )))
            }
        };

        let names: Vec<String> = parsed
            .categories
            .iter()
            .map(|c| c.hierarchy.join(" > "))
            .collect();
        let count = names.len() as u32;
        Ok(SyncResult::ok_with_details(
            count,
            serde_json::json!({ "categories": names }),
        ))
    }

    async fn create_expense_report(
        &self,
        _report: &ExpenseReport,
    ) -> Result<ExpenseReport, ProviderError> {
        Err(ProviderError::unsupported(
            "expense reports",
            ProviderKind::Plaid,
        ))
    }

    async fn update_expense_report(
        &self,
        _report: &ExpenseReport,
    ) -> Result<ExpenseReport, ProviderError> {
        Err(ProviderError::unsupported(
            "expense reports",
            ProviderKind::Plaid,
        ))
    }

    async fn get_expense_report(&self, _report_id: &str) -> Result<ExpenseReport, ProviderError> {
        Err(ProviderError::unsupported(
            "expense reports",
            ProviderKind::Plaid,
        ))
    }

    async fn get_categories(&self) -> Result<Vec<String>, ProviderError> {
        let response = self.post("/categories/get", serde_json::json!({})).await?;
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }
        let parsed: CategoriesResponse = response.json().await?;
        Ok(parsed
            .categories
            .iter()
            .map(|c| c.hierarchy.join(" > "))
            .collect())
    }

    fn get_mapping_fields(&self) -> HashMap<String, String> {
        HashMap::from([
            ("id".to_string(), "transaction_id".to_string()),
            ("amount".to_string(), "amount".to_string()),
            ("date".to_string(), "date".to_string()),
            ("description".to_string(), "name".to_string()),
            ("category".to_string(), "category".to_string()),
        ])
    }
}

// ── Wire types ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PlaidError {
    error_type: String,
    error_code: String,
    error_message: String,
}

#[derive(Debug, Deserialize)]
struct TransactionsResponse {
    #[serde(default)]
    transactions: Vec<Transaction>,
}

#[derive(Debug, Deserialize)]
struct Transaction {
    transaction_id: String,
    amount: f64,
    #[serde(default)]
    iso_currency_code: Option<String>,
    date: String,
    name: String,
    #[serde(default)]
    category: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct CategoriesResponse {
    #[serde(default)]
    categories: Vec<Category>,
}

#[derive(Debug, Deserialize)]
struct Category {
    #[serde(default)]
    hierarchy: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AccountsResponse {
    #[serde(default)]
    accounts: Vec<Account>,
}

#[derive(Debug, Deserialize)]
struct Account {
    account_id: String,
    balances: Balances,
}

#[derive(Debug, Deserialize)]
struct Balances {
    #[serde(default)]
    available: Option<f64>,
    current: f64,
    #[serde(default)]
    iso_currency_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::IntegrationId;

    fn config() -> IntegrationConfig {
        IntegrationConfig::new(
            IntegrationId::new("pl-1").unwrap(),
            "Plaid",
            ProviderKind::Plaid,
        )
        .with_credential("client_id", "cid")
        .with_credential("secret", "sec")
    }

    #[tokio::test]
    async fn configure_requires_client_id_and_secret() {
        let provider = PlaidProvider::new();
        let incomplete = IntegrationConfig::new(
            IntegrationId::new("pl-1").unwrap(),
            "Plaid",
            ProviderKind::Plaid,
        )
        .with_credential("client_id", "cid");
        assert!(provider.configure(&incomplete).await.is_err());
        assert!(provider.configure(&config()).await.is_ok());
    }

    #[tokio::test]
    async fn sync_without_item_fails_inside_the_result() {
        let provider = PlaidProvider::new();
        provider.configure(&config()).await.unwrap();
        let result = provider.sync_expenses(None).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.errors[0].code, "PLAID_NO_ITEM");
    }

    #[tokio::test]
    async fn unconfigured_sync_is_an_adapter_fault() {
        let provider = PlaidProvider::new();
        let err = provider.sync_expenses(None).await.unwrap_err();
        assert_eq!(err.code, crate::ports::ProviderErrorCode::NotConnected);
    }

    #[tokio::test]
    async fn balance_requires_access_token() {
        let provider = PlaidProvider::new();
        provider.configure(&config()).await.unwrap();
        let err = provider.get_account_balance("acc-1").await.unwrap_err();
        assert_eq!(
            err.code,
            crate::ports::ProviderErrorCode::AuthenticationError
        );
    }

    #[tokio::test]
    async fn expense_reports_are_unsupported() {
        let provider = PlaidProvider::new();
        provider.configure(&config()).await.unwrap();
        let report = ExpenseReport::draft("r", "a@b.c", 1.0, "USD");
        assert!(provider.create_expense_report(&report).await.is_err());
    }
}
