//! Expense report shape shared across providers.
//!
//! Only Expensify implements real report behavior; the payment providers
//! reject report operations as unsupported. The common shape round-trips
//! through provider-specific field transforms.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::domain::foundation::Timestamp;

/// Lifecycle status of an expense report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Open,
    Submitted,
    Approved,
    Reimbursed,
    Archived,
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReportStatus::Open => "open",
            ReportStatus::Submitted => "submitted",
            ReportStatus::Approved => "approved",
            ReportStatus::Reimbursed => "reimbursed",
            ReportStatus::Archived => "archived",
        };
        write!(f, "{}", s)
    }
}

/// Provider-agnostic expense report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseReport {
    /// Provider-side report id; empty until the provider assigns one.
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: ReportStatus,
    /// Submitter identity as the provider knows it (usually an email).
    pub submitter: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<Timestamp>,
    pub total_amount: f64,
    pub currency: String,
    #[serde(default)]
    pub transaction_ids: Vec<String>,
    #[serde(default)]
    pub receipt_ids: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl ExpenseReport {
    /// Creates a draft report with the minimum required fields.
    pub fn draft(
        title: impl Into<String>,
        submitter: impl Into<String>,
        total_amount: f64,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            description: String::new(),
            status: ReportStatus::Open,
            submitter: submitter.into(),
            submitted_at: None,
            total_amount,
            currency: currency.into(),
            transaction_ids: Vec::new(),
            receipt_ids: Vec::new(),
            metadata: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_report_starts_open_without_id() {
        let report = ExpenseReport::draft("Q1 travel", "alice@example.com", 1250.0, "USD");
        assert_eq!(report.status, ReportStatus::Open);
        assert!(report.id.is_empty());
        assert!(report.submitted_at.is_none());
    }

    #[test]
    fn report_serializes_round_trip() {
        let mut report = ExpenseReport::draft("Team lunch", "bob@example.com", 86.40, "USD");
        report.transaction_ids.push("txn_1".to_string());
        let json = serde_json::to_string(&report).unwrap();
        let back: ExpenseReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.title, "Team lunch");
        assert_eq!(back.transaction_ids, vec!["txn_1"]);
    }
}
