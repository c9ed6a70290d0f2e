//! Notification port for budget alerts.

use async_trait::async_trait;

use crate::domain::budget::BudgetAlert;
use crate::domain::foundation::DomainError;

/// Port for delivering budget threshold alerts.
///
/// The monitor guarantees at-most-once emission per threshold per period;
/// implementations only deliver, they never filter.
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    /// Delivers one alert.
    async fn notify(&self, alert: &BudgetAlert) -> Result<(), DomainError>;
}
