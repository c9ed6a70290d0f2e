//! PayPal provider adapter.
//!
//! Wraps the PayPal REST API: client-credentials auth, checkout orders for
//! payment links, order capture, transaction reporting for expense sync,
//! and the identity endpoints backing the OAuth funding flow.
//!
//! PayPal is a payment-only provider: expense-report operations fail with
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
    sync_watermark, CaptureResult, IntegrationProvider, OAuthWallet, PaymentLink, ProviderError,
    WalletBalance, WalletProvider,
};

use super::{http_client, percent_encode, require_credential, require_credential_str};

const DEFAULT_API_BASE_URL: &str = "https://api-m.paypal.com";
const DEFAULT_CONNECT_BASE_URL: &str = "https://www.paypal.com";

const WALLET_CATEGORIES: &[&str] = &["Payments", "Refunds", "Transfers"];

struct PayPalCredentials {
    client_id: String,
    client_secret: SecretString,
    redirect_uri: Option<String>,
}

/// PayPal adapter.
pub struct PayPalProvider {
    http: reqwest::Client,
    api_base_url: String,
    connect_base_url: String,
    credentials: RwLock<Option<PayPalCredentials>>,
}

impl PayPalProvider {
    /// Creates an unconfigured adapter against the live API.
    pub fn new() -> Self {
        Self {
            http: http_client(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            connect_base_url: DEFAULT_CONNECT_BASE_URL.to_string(),
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
    /// Expects `client_id` and `client_secret` credentials; an optional
    /// `redirect_uri` credential feeds the OAuth funding flow.
    pub async fn configure(&self, config: &IntegrationConfig) -> Result<(), ProviderError> {
        let client_id = require_credential_str(config, "client_id")?;
        let client_secret = require_credential(config, "client_secret")?;
        let redirect_uri = config
            .credential("redirect_uri")
            .map(|s| s.expose_secret().clone());

        *self.credentials.write().await = Some(PayPalCredentials {
            client_id,
            client_secret,
            redirect_uri,
        });
        Ok(())
    }

    async fn with_credentials<T>(
        &self,
        f: impl FnOnce(&PayPalCredentials) -> T,
    ) -> Result<T, ProviderError> {
        let guard = self.credentials.read().await;
        match guard.as_ref() {
            Some(creds) => Ok(f(creds)),
            None => Err(ProviderError::not_connected(ProviderKind::PayPal)),
        }
    }

    /// Fetches a client-credentials access token.
    async fn access_token(&self) -> Result<String, ProviderError> {
        let (client_id, client_secret) = self
            .with_credentials(|c| (c.client_id.clone(), c.client_secret.expose_secret().clone()))
            .await?;

        let response = self
            .http
            .post(format!("{}/v1/oauth2/token", self.api_base_url))
            .basic_auth(&client_id, Some(&client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::authentication(
                "PayPal rejected the client credentials",
            ));
        }
        if !response.status().is_success() {
            return Err(ProviderError::connection(format!(
                "PayPal token endpoint returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    /// Captures a previously-approved checkout order.
    ///
    /// PayPal-specific extension outside the common contract, reached
    /// through the registry's typed handle.
    pub async fn capture_order(&self, order_id: &str) -> Result<CaptureResult, ProviderError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .post(format!(
                "{}/v2/checkout/orders/{}/capture",
                self.api_base_url, order_id
            ))
            .bearer_auth(&token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::not_found("order"));
        }
        if !response.status().is_success() {
            return Err(ProviderError::invalid_response(format!(
                "capture failed with {}",
                response.status()
            )));
        }

        let body: OrderResponse = response.json().await?;
        let capture = body
            .purchase_units
            .iter()
            .filter_map(|u| u.payments.as_ref())
            .flat_map(|p| p.captures.iter())
            .next();

        Ok(CaptureResult {
            order_id: body.id,
            status: body.status,
            amount: capture.and_then(|c| c.amount.value.parse().ok()),
            currency: capture.map(|c| c.amount.currency_code.clone()),
        })
    }
}

impl Default for PayPalProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IntegrationProvider for PayPalProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::PayPal
    }

    async fn connect(&self, config: &IntegrationConfig) -> Result<(), ProviderError> {
        self.configure(config).await?;
        if self.test_connection().await {
            Ok(())
        } else {
            Err(ProviderError::connection(
                "PayPal connectivity probe failed",
            ))
        }
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        *self.credentials.write().await = None;
        Ok(())
    }

    async fn test_connection(&self) -> bool {
        self.access_token().await.is_ok()
    }

    async fn sync_expenses(&self, since: Option<Timestamp>) -> Result<SyncResult, ProviderError> {
        // Missing credentials abort the sync; provider-side failures come
        // back inside the result.
        self.with_credentials(|_| ()).await?;

        let token = match self.access_token().await {
            Ok(token) => token,
            Err(err) => {
                return Ok(SyncResult::failed(
                    SyncIssue::new("PAYPAL_AUTH", err.message.clone())
                        .with_details(serde_json::json!({"code": err.code.to_string()})),
                ))
            }
        };

        let start = sync_watermark(since);
        let end = Timestamp::now();
        let response = self
            .http
            .get(format!("{}/v1/reporting/transactions", self.api_base_url))
            .bearer_auth(&token)
            .query(&[
                ("start_date", start.to_rfc3339()),
                ("end_date", end.to_rfc3339()),
            ])
            .send()
            .await;

        let response = match response {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                return Ok(SyncResult::failed(SyncIssue::new(
                    "PAYPAL_SYNC",
                    format!("transaction search returned {}", r.status()),
                )))
            }
            Err(err) => {
                return Ok(SyncResult::failed(SyncIssue::new(
                    "PAYPAL_NETWORK",
                    err.to_string(),
                )))
            }
        };

        let body: TransactionSearchResponse = match response.json().await {
            Ok(body) => body,
            Err(err) => {
                return Ok(SyncResult::failed(SyncIssue::new(
                    "PAYPAL_DECODE",
                    err.to_string(),
                )))
            }
        };

        let records: Vec<serde_json::Value> = body
            .transaction_details
            .iter()
            .map(|t| {
                serde_json::json!({
                    "id": t.transaction_info.transaction_id,
                    "amount": t.transaction_info.transaction_amount.value,
                    "currency": t.transaction_info.transaction_amount.currency_code,
                    "date": t.transaction_info.transaction_initiation_date,
                    "description": t.transaction_info.transaction_subject,
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
        self.with_credentials(|_| ()).await?;
        // PayPal exposes no category API; the static wallet set stands in.
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
            ProviderKind::PayPal,
        ))
    }

    async fn update_expense_report(
        &self,
        _report: &ExpenseReport,
    ) -> Result<ExpenseReport, ProviderError> {
        Err(ProviderError::unsupported(
            "expense reports",
            ProviderKind::PayPal,
        ))
    }

    async fn get_expense_report(&self, _report_id: &str) -> Result<ExpenseReport, ProviderError> {
        Err(ProviderError::unsupported(
            "expense reports",
            ProviderKind::PayPal,
        ))
    }

    async fn get_categories(&self) -> Result<Vec<String>, ProviderError> {
        Ok(WALLET_CATEGORIES.iter().map(|s| s.to_string()).collect())
    }

    fn get_mapping_fields(&self) -> HashMap<String, String> {
        HashMap::from([
            ("id".to_string(), "transaction_id".to_string()),
            ("amount".to_string(), "transaction_amount.value".to_string()),
            (
                "date".to_string(),
                "transaction_initiation_date".to_string(),
            ),
            ("description".to_string(), "transaction_subject".to_string()),
        ])
    }
}

#[async_trait]
impl WalletProvider for PayPalProvider {
    async fn create_payment_link(
        &self,
        amount: f64,
        currency: &str,
        note: Option<&str>,
    ) -> Result<PaymentLink, ProviderError> {
        let token = self.access_token().await?;
        let body = serde_json::json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "amount": {
                    "currency_code": currency,
                    "value": format!("{:.2}", amount),
                },
                "description": note,
            }],
        });

        let response = self
            .http
            .post(format!("{}/v2/checkout/orders", self.api_base_url))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::invalid_response(format!(
                "order creation failed with {}",
                response.status()
            )));
        }

        let order: OrderResponse = response.json().await?;
        let approve = order
            .links
            .iter()
            .find(|l| l.rel == "approve" || l.rel == "payer-action")
            .ok_or_else(|| ProviderError::invalid_response("order carries no approve link"))?;

        Ok(PaymentLink {
            url: approve.href.clone(),
            reference: Some(order.id),
            amount,
            currency: currency.to_string(),
        })
    }

    async fn get_balance(&self) -> Result<WalletBalance, ProviderError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .get(format!("{}/v1/reporting/balances", self.api_base_url))
            .bearer_auth(&token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::invalid_response(format!(
                "balance lookup failed with {}",
                response.status()
            )));
        }

        let body: BalancesResponse = response.json().await?;
        let first = body
            .balances
            .first()
            .ok_or_else(|| ProviderError::invalid_response("no balances returned"))?;

        Ok(WalletBalance {
            available: first.total_balance.value.parse().map_err(|_| {
                ProviderError::invalid_response("balance value is not a number")
            })?,
            currency: first.total_balance.currency_code.clone(),
            as_of: Timestamp::now(),
        })
    }

    async fn validate_recipient(&self, handle: &str) -> Result<bool, ProviderError> {
        // PayPal recipients are email addresses; shape check only.
        let valid = handle.contains('@')
            && handle.split('@').nth(1).is_some_and(|d| d.contains('.'))
            && !handle.contains(char::is_whitespace);
        Ok(valid)
    }
}

#[async_trait]
impl OAuthWallet for PayPalProvider {
    fn authorization_url(&self, state: &str) -> String {
        // Credentials are configured before this is called; fall back to
        // an empty client id rather than panicking if they are not.
        let (client_id, redirect_uri) = match self.credentials.try_read() {
            Ok(guard) => guard
                .as_ref()
                .map(|c| (c.client_id.clone(), c.redirect_uri.clone().unwrap_or_default()))
                .unwrap_or_default(),
            Err(_) => Default::default(),
        };
        format!(
            "{}/connect?flowEntry=static&client_id={}&scope=openid%20email&redirect_uri={}&state={}",
            self.connect_base_url,
            percent_encode(&client_id),
            percent_encode(&redirect_uri),
            state
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<ExternalAccount, ProviderError> {
        let (client_id, client_secret) = self
            .with_credentials(|c| (c.client_id.clone(), c.client_secret.expose_secret().clone()))
            .await?;

        let response = self
            .http
            .post(format!("{}/v1/oauth2/token", self.api_base_url))
            .basic_auth(&client_id, Some(&client_secret))
            .form(&[("grant_type", "authorization_code"), ("code", code)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::authentication(format!(
                "authorization code exchange failed with {}",
                response.status()
            )));
        }
        let token: TokenResponse = response.json().await?;

        let response = self
            .http
            .get(format!(
                "{}/v1/identity/oauth2/userinfo?schema=paypalv1.1",
                self.api_base_url
            ))
            .bearer_auth(&token.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::invalid_response(format!(
                "userinfo lookup failed with {}",
                response.status()
            )));
        }

        let info: UserInfoResponse = response.json().await?;
        let email = info
            .emails
            .iter()
            .find(|e| e.primary)
            .or_else(|| info.emails.first())
            .map(|e| e.value.clone());

        Ok(ExternalAccount {
            account_id: info.payer_id,
            display_name: email,
        })
    }
}

// ── Wire types ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
    status: String,
    #[serde(default)]
    links: Vec<OrderLink>,
    #[serde(default)]
    purchase_units: Vec<PurchaseUnit>,
}

#[derive(Debug, Deserialize)]
struct OrderLink {
    rel: String,
    href: String,
}

#[derive(Debug, Deserialize)]
struct PurchaseUnit {
    #[serde(default)]
    payments: Option<Payments>,
}

#[derive(Debug, Deserialize)]
struct Payments {
    #[serde(default)]
    captures: Vec<Capture>,
}

#[derive(Debug, Deserialize)]
struct Capture {
    amount: Money,
}

#[derive(Debug, Deserialize)]
struct Money {
    currency_code: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct BalancesResponse {
    #[serde(default)]
    balances: Vec<BalanceEntry>,
}

#[derive(Debug, Deserialize)]
struct BalanceEntry {
    total_balance: Money,
}

#[derive(Debug, Deserialize)]
struct TransactionSearchResponse {
    #[serde(default)]
    transaction_details: Vec<TransactionDetail>,
}

#[derive(Debug, Deserialize)]
struct TransactionDetail {
    transaction_info: TransactionInfo,
}

#[derive(Debug, Deserialize)]
struct TransactionInfo {
    transaction_id: String,
    transaction_amount: Money,
    transaction_initiation_date: String,
    #[serde(default)]
    transaction_subject: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    payer_id: String,
    #[serde(default)]
    emails: Vec<EmailEntry>,
}

#[derive(Debug, Deserialize)]
struct EmailEntry {
    value: String,
    #[serde(default)]
    primary: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::IntegrationId;

    fn config() -> IntegrationConfig {
        IntegrationConfig::new(
            IntegrationId::new("pp-1").unwrap(),
            "PayPal",
            ProviderKind::PayPal,
        )
        .with_credential("client_id", "cid")
        .with_credential("client_secret", "secret")
        .with_credential("redirect_uri", "https://app.example/cb")
    }

    #[tokio::test]
    async fn configure_requires_client_credentials() {
        let provider = PayPalProvider::new();
        let incomplete = IntegrationConfig::new(
            IntegrationId::new("pp-1").unwrap(),
            "PayPal",
            ProviderKind::PayPal,
        )
        .with_credential("client_id", "cid");

        let err = provider.configure(&incomplete).await.unwrap_err();
        assert_eq!(err.code, crate::ports::ProviderErrorCode::AuthenticationError);
    }

    #[tokio::test]
    async fn unconfigured_sync_is_an_adapter_fault() {
        let provider = PayPalProvider::new();
        let err = provider.sync_expenses(None).await.unwrap_err();
        assert_eq!(err.code, crate::ports::ProviderErrorCode::NotConnected);
    }

    #[tokio::test]
    async fn expense_reports_are_unsupported() {
        let provider = PayPalProvider::new();
        provider.configure(&config()).await.unwrap();
        let report = ExpenseReport::draft("r", "a@b.c", 1.0, "USD");
        let err = provider.create_expense_report(&report).await.unwrap_err();
        assert_eq!(
            err.code,
            crate::ports::ProviderErrorCode::UnsupportedOperation
        );
    }

    #[tokio::test]
    async fn authorization_url_carries_state_and_client_id() {
        let provider = PayPalProvider::new();
        provider.configure(&config()).await.unwrap();
        let url = provider.authorization_url("abc123");
        assert!(url.contains("state=abc123"));
        assert!(url.contains("client_id=cid"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fapp.example%2Fcb"));
    }

    #[tokio::test]
    async fn recipient_validation_checks_email_shape() {
        let provider = PayPalProvider::new();
        assert!(provider.validate_recipient("a@b.com").await.unwrap());
        assert!(!provider.validate_recipient("not-an-email").await.unwrap());
        assert!(!provider.validate_recipient("a b@c.com").await.unwrap());
    }

    #[tokio::test]
    async fn disconnect_clears_credentials() {
        let provider = PayPalProvider::new();
        provider.configure(&config()).await.unwrap();
        provider.disconnect().await.unwrap();
        let err = provider.sync_expenses(None).await.unwrap_err();
        assert_eq!(err.code, crate::ports::ProviderErrorCode::NotConnected);
    }
}
