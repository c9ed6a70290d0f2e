//! Budget threshold monitor.
//!
//! A pure pass over a budget's thresholds: computes the spending
//! percentage, trips every untriggered threshold at or below it in
//! ascending order, and returns one alert per newly-tripped threshold.
//! Thresholds never re-arm within a period - repeated evaluations at the
//! same spending level produce no further alerts.

use crate::domain::foundation::Timestamp;

use super::{Budget, BudgetAlert};

/// Evaluates spending against a budget's thresholds.
///
/// Returns the alerts for thresholds newly crossed by this evaluation, in
/// ascending percentage order. A single call that jumps past several
/// thresholds trips all of them. Returns nothing when alerts are disabled.
pub fn evaluate(budget: &mut Budget, spent_amount: f64, now: Timestamp) -> Vec<BudgetAlert> {
    if !budget.alerts_enabled {
        return Vec::new();
    }

    let spending_percentage = spent_amount / budget.target_amount * 100.0;

    let budget_id = budget.id;
    let user_id = budget.user_id.clone();
    let category = budget.category.clone();
    let target_amount = budget.target_amount;

    let mut alerts = Vec::new();
    for threshold in budget.thresholds_mut() {
        if threshold.triggered || spending_percentage < threshold.percentage {
            continue;
        }
        threshold.triggered = true;
        threshold.last_triggered_at = Some(now);
        alerts.push(BudgetAlert {
            budget_id,
            user_id: user_id.clone(),
            category: category.clone(),
            threshold_percentage: threshold.percentage,
            spending_percentage,
            spent_amount,
            target_amount,
            triggered_at: now,
        });
    }
    alerts
}
