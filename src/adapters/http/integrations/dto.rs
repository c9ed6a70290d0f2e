//! HTTP DTOs for integration endpoints.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::domain::foundation::{DomainError, IntegrationId, Timestamp};
use crate::domain::integration::{
    ExpenseReport, IntegrationConfig, IntegrationStatus, ProviderKind, ReportStatus,
};

/// Request to add an integration.
#[derive(Debug, Clone, Deserialize)]
pub struct AddIntegrationRequest {
    /// Caller-chosen integration id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Provider tag (`paypal`, `venmo`, `cashapp`, `plaid`, `expensify`).
    pub provider: String,
    /// Provider-specific secrets.
    #[serde(default)]
    pub credentials: HashMap<String, String>,
    /// Non-secret provider options.
    #[serde(default)]
    pub settings: HashMap<String, serde_json::Value>,
}

impl AddIntegrationRequest {
    /// Converts into the domain configuration.
    pub fn into_config(self) -> Result<IntegrationConfig, DomainError> {
        let provider = ProviderKind::from_str(&self.provider)?;
        let id = IntegrationId::new(self.id)?;
        let mut config = IntegrationConfig::new(id, self.name, provider);
        for (key, value) in self.credentials {
            config = config.with_credential(key, value);
        }
        config.settings = self.settings;
        Ok(config)
    }
}

/// Query parameters for the sync endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncQuery {
    /// RFC 3339 watermark; defaults to 30 days back when absent.
    #[serde(default)]
    pub since: Option<String>,
}

impl SyncQuery {
    /// Parses the watermark.
    pub fn since(&self) -> Result<Option<Timestamp>, DomainError> {
        self.since
            .as_deref()
            .map(|s| {
                Timestamp::parse_rfc3339(s).map_err(|_| {
                    DomainError::validation("since", "must be an RFC 3339 timestamp")
                })
            })
            .transpose()
    }
}

/// Integration status response.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub id: IntegrationId,
    pub status: IntegrationStatus,
}

/// Request body for creating or updating an expense report.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Option<ReportStatus>,
    pub submitter: String,
    pub total_amount: f64,
    pub currency: String,
    #[serde(default)]
    pub transaction_ids: Vec<String>,
    #[serde(default)]
    pub receipt_ids: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl ReportRequest {
    /// Converts into the common report shape with the given id (empty for
    /// creation).
    pub fn into_report(self, id: String) -> ExpenseReport {
        ExpenseReport {
            id,
            title: self.title,
            description: self.description,
            status: self.status.unwrap_or(ReportStatus::Open),
            submitter: self.submitter,
            submitted_at: None,
            total_amount: self.total_amount,
            currency: self.currency,
            transaction_ids: self.transaction_ids,
            receipt_ids: self.receipt_ids,
            metadata: self.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;

    #[test]
    fn add_request_converts_to_config() {
        let request: AddIntegrationRequest = serde_json::from_value(serde_json::json!({
            "id": "plaid-main",
            "name": "Plaid",
            "provider": "plaid",
            "credentials": { "client_id": "cid", "secret": "sec" },
            "settings": { "api_base_url": "https://sandbox.plaid.com" },
        }))
        .unwrap();

        let config = request.into_config().unwrap();
        assert_eq!(config.provider, ProviderKind::Plaid);
        assert!(config.credential("client_id").is_some());
        assert_eq!(
            config.setting_str("api_base_url"),
            Some("https://sandbox.plaid.com")
        );
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let request: AddIntegrationRequest = serde_json::from_value(serde_json::json!({
            "id": "x",
            "name": "X",
            "provider": "stripe",
        }))
        .unwrap();
        let err = request.into_config().unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedProvider);
    }

    #[test]
    fn sync_query_parses_watermark() {
        let query = SyncQuery {
            since: Some("2024-01-01T00:00:00Z".to_string()),
        };
        assert!(query.since().unwrap().is_some());

        let bad = SyncQuery {
            since: Some("yesterday".to_string()),
        };
        assert!(bad.since().is_err());

        let absent = SyncQuery { since: None };
        assert!(absent.since().unwrap().is_none());
    }
}
