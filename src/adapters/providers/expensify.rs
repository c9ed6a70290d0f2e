//! Expensify provider adapter.
//!
//! Wraps the Expensify Integration Server: every call posts a
//! `requestJobDescription` form payload carrying partner credentials. This
//! is the only adapter with real expense-report behavior - reports
//! transform bidirectionally between the common shape and Expensify's
//! field names.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::Timestamp;
use crate::domain::integration::{
    ExpenseReport, IntegrationConfig, ProviderKind, ReportStatus, SyncIssue, SyncResult,
};
use crate::ports::{sync_watermark, IntegrationProvider, ProviderError};

use super::http_client;

const DEFAULT_API_BASE_URL: &str =
    "https://integrations.expensify.com/Integration-Server/ExpensifyIntegrations";

/// Common-shape field → Expensify field.
static FIELD_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("id", "reportID"),
        ("title", "reportName"),
        ("description", "comment"),
        ("status", "status"),
        ("submitter", "employeeEmail"),
        ("submitted_at", "created"),
        ("total_amount", "total"),
        ("currency", "currency"),
        ("transaction_ids", "transactionIDList"),
        ("receipt_ids", "receiptIDList"),
    ])
});

struct ExpensifyCredentials {
    partner_user_id: String,
    partner_user_secret: SecretString,
    policy_id: Option<String>,
}

/// Expensify adapter.
pub struct ExpensifyProvider {
    http: reqwest::Client,
    api_base_url: String,
    credentials: RwLock<Option<ExpensifyCredentials>>,
}

impl ExpensifyProvider {
    /// Creates an unconfigured adapter against the live API.
    pub fn new() -> Self {
        Self {
            http: http_client(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            credentials: RwLock::new(None),
        }
    }

    /// Overrides the API base URL (tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Stores credentials without probing.
    ///
    /// Expects `partner_user_id` and `partner_user_secret` credentials;
    /// the `policy_id` setting scopes category sync.
    pub async fn configure(&self, config: &IntegrationConfig) -> Result<(), ProviderError> {
        let partner_user_id = config
            .credential("partner_user_id")
            .map(|s| s.expose_secret().clone())
            .ok_or_else(|| {
                ProviderError::authentication("missing credential 'partner_user_id'")
            })?;
        let partner_user_secret = config
            .credential("partner_user_secret")
            .cloned()
            .ok_or_else(|| {
                ProviderError::authentication("missing credential 'partner_user_secret'")
            })?;

        *self.credentials.write().await = Some(ExpensifyCredentials {
            partner_user_id,
            partner_user_secret,
            policy_id: config.setting_str("policy_id").map(str::to_string),
        });
        Ok(())
    }

    /// Posts one job description and decodes the JSON response.
    async fn call(
        &self,
        job_type: &str,
        input_settings: serde_json::Value,
        extra: Option<(&str, serde_json::Value)>,
    ) -> Result<serde_json::Value, ProviderError> {
        let (partner_user_id, partner_user_secret) = {
            let guard = self.credentials.read().await;
            let creds = guard
                .as_ref()
                .ok_or_else(|| ProviderError::not_connected(ProviderKind::Expensify))?;
            (
                creds.partner_user_id.clone(),
                creds.partner_user_secret.expose_secret().clone(),
            )
        };

        let mut job = serde_json::json!({
            "type": job_type,
            "credentials": {
                "partnerUserID": partner_user_id,
                "partnerUserSecret": partner_user_secret,
            },
            "inputSettings": input_settings,
        });
        if let Some((key, value)) = extra {
            job[key] = value;
        }

        let response = self
            .http
            .post(&self.api_base_url)
            .form(&[("requestJobDescription", job.to_string())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::invalid_response(format!(
                "Expensify returned {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response.json().await?;
        // The Integration Server signals failures in-band.
        if let Some(code) = body.get("responseCode").and_then(|c| c.as_i64()) {
            if code != 200 {
                let message = body
                    .get("responseMessage")
                    .and_then(|m| m.as_str())
                    .unwrap_or("Expensify job failed")
                    .to_string();
                let err = if code == 401 || code == 403 {
                    ProviderError::authentication(message)
                } else {
                    ProviderError::invalid_response(message)
                };
                return Err(err.with_provider_code(code.to_string()));
            }
        }
        Ok(body)
    }

    async fn policy_id(&self) -> Result<Option<String>, ProviderError> {
        let guard = self.credentials.read().await;
        let creds = guard
            .as_ref()
            .ok_or_else(|| ProviderError::not_connected(ProviderKind::Expensify))?;
        Ok(creds.policy_id.clone())
    }

    /// Common shape → Expensify report payload.
    fn to_expensify(report: &ExpenseReport) -> serde_json::Value {
        serde_json::json!({
            "reportID": if report.id.is_empty() { serde_json::Value::Null } else { serde_json::json!(report.id) },
            "reportName": report.title,
            "comment": report.description,
            "status": status_to_expensify(report.status),
            "employeeEmail": report.submitter,
            "created": report.submitted_at.map(|t| t.to_rfc3339()),
            "total": (report.total_amount * 100.0).round() as i64,
            "currency": report.currency,
            "transactionIDList": report.transaction_ids,
            "receiptIDList": report.receipt_ids,
            "customFields": report.metadata,
        })
    }

    /// Expensify report payload → common shape.
    fn from_expensify(value: &serde_json::Value) -> Result<ExpenseReport, ProviderError> {
        let wire: WireReport = serde_json::from_value(value.clone())
            .map_err(|e| ProviderError::invalid_response(format!("malformed report: {}", e)))?;

        let submitted_at = wire
            .created
            .as_deref()
            .and_then(|s| Timestamp::parse_rfc3339(s).ok());

        Ok(ExpenseReport {
            id: wire.report_id,
            title: wire.report_name,
            description: wire.comment.unwrap_or_default(),
            status: status_from_expensify(&wire.status),
            submitter: wire.employee_email,
            submitted_at,
            total_amount: wire.total as f64 / 100.0,
            currency: wire.currency,
            transaction_ids: wire.transaction_id_list,
            receipt_ids: wire.receipt_id_list,
            metadata: wire.custom_fields,
        })
    }
}

impl Default for ExpensifyProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn status_to_expensify(status: ReportStatus) -> &'static str {
    match status {
        ReportStatus::Open => "OPEN",
        ReportStatus::Submitted => "SUBMITTED",
        ReportStatus::Approved => "APPROVED",
        ReportStatus::Reimbursed => "REIMBURSED",
        ReportStatus::Archived => "ARCHIVED",
    }
}

fn status_from_expensify(status: &str) -> ReportStatus {
    match status {
        "SUBMITTED" => ReportStatus::Submitted,
        "APPROVED" => ReportStatus::Approved,
        "REIMBURSED" => ReportStatus::Reimbursed,
        "ARCHIVED" => ReportStatus::Archived,
        _ => ReportStatus::Open,
    }
}

#[async_trait]
impl IntegrationProvider for ExpensifyProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Expensify
    }

    async fn connect(&self, config: &IntegrationConfig) -> Result<(), ProviderError> {
        self.configure(config).await?;
        if self.test_connection().await {
            Ok(())
        } else {
            Err(ProviderError::connection(
                "Expensify connectivity probe failed",
            ))
        }
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        *self.credentials.write().await = None;
        Ok(())
    }

    async fn test_connection(&self) -> bool {
        self.call("get", serde_json::json!({ "type": "policyList" }), None)
            .await
            .is_ok()
    }

    async fn sync_expenses(&self, since: Option<Timestamp>) -> Result<SyncResult, ProviderError> {
        // Credential presence is an adapter fault; everything after that
        // reports failure inside the result.
        self.policy_id().await?;

        let start = sync_watermark(since);
        let result = self
            .call(
                "get",
                serde_json::json!({
                    "type": "expenses",
                    "startDate": start.to_date_string(),
                }),
                None,
            )
            .await;

        let body = match result {
            Ok(body) => body,
            Err(err) => {
                return Ok(SyncResult::failed(
                    SyncIssue::new("EXPENSIFY_SYNC", err.message).with_details(
                        serde_json::json!({ "provider_code": err.provider_code }),
                    ),
                ))
            }
        };

        let expenses: Vec<WireExpense> = body
            .get("expenses")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .unwrap_or_default()
            .unwrap_or_default();

        let records: Vec<serde_json::Value> = expenses
            .iter()
            .map(|e| {
                serde_json::json!({
                    "id": e.transaction_id,
                    "amount": e.amount as f64 / 100.0,
                    "currency": e.currency,
                    "date": e.created,
                    "description": e.merchant,
                    "category": e.category,
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
        let policy_id = self.policy_id().await?;
        let Some(policy_id) = policy_id else {
            return Ok(SyncResult::failed(SyncIssue::new(
                "EXPENSIFY_NO_POLICY",
                "no policy_id configured; category sync needs one",
            )));
        };

        let result = self
            .call(
                "get",
                serde_json::json!({
                    "type": "policy",
                    "policyIDList": [policy_id],
                    "fields": ["categories"],
                }),
                None,
            )
            .await;

        let body = match result {
            Ok(body) => body,
            Err(err) => {
                return Ok(SyncResult::failed(SyncIssue::new(
                    "EXPENSIFY_CATEGORIES",
                    err.message,
                )))
            }
        };

        let names: Vec<String> = body
            .get("categories")
            .and_then(|c| c.as_array())
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|e| e.get("name").and_then(|n| n.as_str()))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let count = names.len() as u32;
        Ok(SyncResult::ok_with_details(
            count,
            serde_json::json!({ "categories": names }),
        ))
    }

    async fn create_expense_report(
        &self,
        report: &ExpenseReport,
    ) -> Result<ExpenseReport, ProviderError> {
        let body = self
            .call(
                "create",
                serde_json::json!({ "type": "report" }),
                Some(("report", Self::to_expensify(report))),
            )
            .await?;

        let report_id = body
            .get("reportID")
            .and_then(|id| id.as_str())
            .ok_or_else(|| ProviderError::invalid_response("create returned no reportID"))?;

        let mut created = report.clone();
        created.id = report_id.to_string();
        Ok(created)
    }

    async fn update_expense_report(
        &self,
        report: &ExpenseReport,
    ) -> Result<ExpenseReport, ProviderError> {
        if report.id.is_empty() {
            return Err(ProviderError::invalid_response(
                "report has no id; create it first",
            ));
        }
        self.call(
            "update",
            serde_json::json!({ "type": "report", "reportID": report.id }),
            Some(("report", Self::to_expensify(report))),
        )
        .await?;
        Ok(report.clone())
    }

    async fn get_expense_report(&self, report_id: &str) -> Result<ExpenseReport, ProviderError> {
        let body = self
            .call(
                "get",
                serde_json::json!({ "type": "report", "reportID": report_id }),
                None,
            )
            .await?;

        let report = body
            .get("report")
            .ok_or_else(|| ProviderError::not_found("report"))?;
        Self::from_expensify(report)
    }

    async fn get_categories(&self) -> Result<Vec<String>, ProviderError> {
        let result = self.sync_categories().await?;
        Ok(result
            .details
            .as_ref()
            .and_then(|d| d.get("categories"))
            .and_then(|c| c.as_array())
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|e| e.as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get_mapping_fields(&self) -> HashMap<String, String> {
        FIELD_MAP
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

// ── Wire types ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WireReport {
    #[serde(rename = "reportID")]
    report_id: String,
    #[serde(rename = "reportName")]
    report_name: String,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    status: String,
    #[serde(rename = "employeeEmail")]
    employee_email: String,
    #[serde(default)]
    created: Option<String>,
    /// Amount in cents.
    total: i64,
    currency: String,
    #[serde(rename = "transactionIDList", default)]
    transaction_id_list: Vec<String>,
    #[serde(rename = "receiptIDList", default)]
    receipt_id_list: Vec<String>,
    #[serde(rename = "customFields", default)]
    custom_fields: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Default)]
struct WireExpense {
    #[serde(rename = "transactionID")]
    transaction_id: String,
    /// Amount in cents.
    amount: i64,
    currency: String,
    created: String,
    #[serde(default)]
    merchant: Option<String>,
    #[serde(default)]
    category: Option<String>,
}
