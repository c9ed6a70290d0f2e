//! HTTP DTOs for budget endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::budget::{BudgetAlert, BudgetPeriod};
use crate::domain::foundation::{DomainError, Timestamp};

/// Request to create a budget.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBudgetRequest {
    pub category: String,
    pub target_amount: f64,
    pub period: BudgetPeriod,
    /// RFC 3339; defaults to now.
    #[serde(default)]
    pub start_date: Option<String>,
    /// RFC 3339; defaults to the period length after the start.
    #[serde(default)]
    pub end_date: Option<String>,
    /// Alert threshold percentages; order does not matter.
    #[serde(default = "default_thresholds")]
    pub thresholds: Vec<f64>,
    #[serde(default = "default_alerts_enabled")]
    pub alerts_enabled: bool,
}

fn default_thresholds() -> Vec<f64> {
    vec![50.0, 75.0, 90.0, 100.0]
}

fn default_alerts_enabled() -> bool {
    true
}

impl CreateBudgetRequest {
    /// Resolves the budget period dates.
    pub fn dates(&self) -> Result<(Timestamp, Timestamp), DomainError> {
        let start = match self.start_date.as_deref() {
            Some(s) => Timestamp::parse_rfc3339(s).map_err(|_| {
                DomainError::validation("start_date", "must be an RFC 3339 timestamp")
            })?,
            None => Timestamp::now(),
        };
        let end = match self.end_date.as_deref() {
            Some(s) => Timestamp::parse_rfc3339(s).map_err(|_| {
                DomainError::validation("end_date", "must be an RFC 3339 timestamp")
            })?,
            None => start.add_days(period_days(self.period)),
        };
        Ok((start, end))
    }
}

fn period_days(period: BudgetPeriod) -> i64 {
    match period {
        BudgetPeriod::Monthly => 30,
        BudgetPeriod::Quarterly => 90,
        BudgetPeriod::Yearly => 365,
    }
}

/// Request to record spending against a budget.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordSpendingRequest {
    pub amount: f64,
}

/// Response for a spending evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct SpendingResponse {
    pub spending_percentage: f64,
    pub alerts: Vec<BudgetAlert>,
}
