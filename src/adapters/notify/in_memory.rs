//! In-memory alert notifier.
//!
//! Records every alert it receives. Backs the notifications feed endpoint
//! and doubles as the assertion point in tests.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::budget::BudgetAlert;
use crate::domain::foundation::{DomainError, UserId};
use crate::ports::AlertNotifier;

/// Notifier that records alerts in memory.
#[derive(Clone, Default)]
pub struct InMemoryNotifier {
    alerts: Arc<RwLock<Vec<BudgetAlert>>>,
}

impl InMemoryNotifier {
    /// Creates an empty notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded alerts, oldest first.
    pub async fn recorded(&self) -> Vec<BudgetAlert> {
        self.alerts.read().await.clone()
    }

    /// Recorded alerts for one user, oldest first.
    pub async fn recorded_for_user(&self, user_id: &UserId) -> Vec<BudgetAlert> {
        self.alerts
            .read()
            .await
            .iter()
            .filter(|a| &a.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Clears recorded alerts (useful for tests).
    pub async fn clear(&self) {
        self.alerts.write().await.clear();
    }
}

#[async_trait]
impl AlertNotifier for InMemoryNotifier {
    async fn notify(&self, alert: &BudgetAlert) -> Result<(), DomainError> {
        self.alerts.write().await.push(alert.clone());
        Ok(())
    }
}
