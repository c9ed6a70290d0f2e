//! Tracing-backed alert notifier.

use async_trait::async_trait;

use crate::domain::budget::BudgetAlert;
use crate::domain::foundation::DomainError;
use crate::ports::AlertNotifier;

/// Notifier that emits each alert as a structured log event.
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

impl TracingNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AlertNotifier for TracingNotifier {
    async fn notify(&self, alert: &BudgetAlert) -> Result<(), DomainError> {
        tracing::warn!(
            budget_id = %alert.budget_id,
            user_id = %alert.user_id,
            category = %alert.category,
            threshold = alert.threshold_percentage,
            spending_pct = alert.spending_percentage,
            spent = alert.spent_amount,
            target = alert.target_amount,
            "budget threshold crossed"
        );
        Ok(())
    }
}
