//! Budget aggregate with ascending alert thresholds.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{BudgetId, Timestamp, UserId, ValidationError};

/// Budget reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Monthly,
    Quarterly,
    Yearly,
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BudgetPeriod::Monthly => "monthly",
            BudgetPeriod::Quarterly => "quarterly",
            BudgetPeriod::Yearly => "yearly",
        };
        write!(f, "{}", s)
    }
}

/// One spending-percentage alert threshold.
///
/// A threshold transitions triggered=false→true exactly once per budget
/// period and never re-arms within it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThreshold {
    pub percentage: f64,
    pub triggered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_triggered_at: Option<Timestamp>,
}

impl AlertThreshold {
    fn new(percentage: f64) -> Self {
        Self {
            percentage,
            triggered: false,
            last_triggered_at: None,
        }
    }
}

/// A per-category spending budget with alert thresholds.
///
/// Thresholds are sorted ascending by percentage at construction; that
/// ordering is an invariant the monitor relies on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,
    pub user_id: UserId,
    pub category: String,
    pub target_amount: f64,
    pub period: BudgetPeriod,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    thresholds: Vec<AlertThreshold>,
    pub alerts_enabled: bool,
}

impl Budget {
    /// Creates a budget, validating inputs and sorting thresholds ascending.
    ///
    /// Threshold percentages must be in `(0, 1000]` - crossing 100 is
    /// legitimate (overspend alerts), but wildly large values are rejected
    /// as configuration mistakes.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: UserId,
        category: impl Into<String>,
        target_amount: f64,
        period: BudgetPeriod,
        start_date: Timestamp,
        end_date: Timestamp,
        threshold_percentages: Vec<f64>,
        alerts_enabled: bool,
    ) -> Result<Self, ValidationError> {
        let category = category.into();
        if category.trim().is_empty() {
            return Err(ValidationError::empty_field("category"));
        }
        if !target_amount.is_finite() || target_amount <= 0.0 {
            return Err(ValidationError::invalid_format(
                "target_amount",
                "must be a positive amount",
            ));
        }
        if !start_date.is_before(&end_date) {
            return Err(ValidationError::invalid_format(
                "end_date",
                "must be after start_date",
            ));
        }
        for &pct in &threshold_percentages {
            if !pct.is_finite() || pct <= 0.0 || pct > 1000.0 {
                return Err(ValidationError::out_of_range("threshold", 0.0, 1000.0, pct));
            }
        }

        let mut thresholds: Vec<AlertThreshold> = threshold_percentages
            .into_iter()
            .map(AlertThreshold::new)
            .collect();
        thresholds.sort_by(|a, b| {
            a.percentage
                .partial_cmp(&b.percentage)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(Self {
            id: BudgetId::new(),
            user_id,
            category,
            target_amount,
            period,
            start_date,
            end_date,
            thresholds,
            alerts_enabled,
        })
    }

    /// Returns the thresholds in ascending percentage order.
    pub fn thresholds(&self) -> &[AlertThreshold] {
        &self.thresholds
    }

    /// Mutable threshold access for the monitor.
    pub(crate) fn thresholds_mut(&mut self) -> &mut [AlertThreshold] {
        &mut self.thresholds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    fn period() -> (Timestamp, Timestamp) {
        let start = Timestamp::now();
        (start, start.add_days(30))
    }

    #[test]
    fn thresholds_sort_ascending() {
        let (start, end) = period();
        let budget = Budget::new(
            user(),
            "groceries",
            500.0,
            BudgetPeriod::Monthly,
            start,
            end,
            vec![90.0, 50.0, 75.0],
            true,
        )
        .unwrap();

        let percentages: Vec<f64> = budget.thresholds().iter().map(|t| t.percentage).collect();
        assert_eq!(percentages, vec![50.0, 75.0, 90.0]);
        assert!(budget.thresholds().iter().all(|t| !t.triggered));
    }

    #[test]
    fn rejects_empty_category() {
        let (start, end) = period();
        let result = Budget::new(
            user(),
            "  ",
            500.0,
            BudgetPeriod::Monthly,
            start,
            end,
            vec![50.0],
            true,
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_non_positive_target() {
        let (start, end) = period();
        let result = Budget::new(
            user(),
            "travel",
            0.0,
            BudgetPeriod::Monthly,
            start,
            end,
            vec![50.0],
            true,
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_inverted_dates() {
        let (start, end) = period();
        let result = Budget::new(
            user(),
            "travel",
            100.0,
            BudgetPeriod::Monthly,
            end,
            start,
            vec![50.0],
            true,
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let (start, end) = period();
        for bad in [0.0, -10.0, 1001.0] {
            let result = Budget::new(
                user(),
                "travel",
                100.0,
                BudgetPeriod::Monthly,
                start,
                end,
                vec![bad],
                true,
            );
            assert!(result.is_err(), "threshold {} should be rejected", bad);
        }
    }
}
