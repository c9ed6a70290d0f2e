//! Budget alert notification payload.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{BudgetId, Timestamp, UserId};

/// Notification emitted when spending crosses a budget threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetAlert {
    pub budget_id: BudgetId,
    pub user_id: UserId,
    pub category: String,
    /// The threshold percentage that was crossed.
    pub threshold_percentage: f64,
    /// Actual spending as a percentage of the target.
    pub spending_percentage: f64,
    pub spent_amount: f64,
    pub target_amount: f64,
    pub triggered_at: Timestamp,
}
