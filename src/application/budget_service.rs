//! Budget service - budget CRUD and spending evaluation.

use std::sync::Arc;

use crate::domain::budget::{monitor, Budget, BudgetAlert, BudgetPeriod};
use crate::domain::foundation::{BudgetId, DomainError, Timestamp, UserId};
use crate::ports::{AlertNotifier, BudgetStore};

/// Outcome of one spending evaluation.
#[derive(Debug, Clone)]
pub struct SpendingEvaluation {
    pub spending_percentage: f64,
    /// Alerts newly emitted by this evaluation, ascending by threshold.
    pub alerts: Vec<BudgetAlert>,
}

/// Application service over budgets and the threshold monitor.
pub struct BudgetService {
    store: Arc<dyn BudgetStore>,
    notifier: Arc<dyn AlertNotifier>,
}

impl BudgetService {
    /// Builds a service over its dependencies.
    pub fn new(store: Arc<dyn BudgetStore>, notifier: Arc<dyn AlertNotifier>) -> Self {
        Self { store, notifier }
    }

    /// Creates and stores a budget.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_budget(
        &self,
        user_id: UserId,
        category: String,
        target_amount: f64,
        period: BudgetPeriod,
        start_date: Timestamp,
        end_date: Timestamp,
        thresholds: Vec<f64>,
        alerts_enabled: bool,
    ) -> Result<Budget, DomainError> {
        let budget = Budget::new(
            user_id,
            category,
            target_amount,
            period,
            start_date,
            end_date,
            thresholds,
            alerts_enabled,
        )?;
        self.store.save(budget.clone()).await?;
        tracing::info!(budget = %budget.id, category = %budget.category, "budget created");
        Ok(budget)
    }

    /// Fetches one of a user's budgets.
    pub async fn get_budget(&self, user_id: &UserId, id: &BudgetId) -> Result<Budget, DomainError> {
        let budget = self
            .store
            .get(id)
            .await?
            .filter(|b| &b.user_id == user_id)
            .ok_or_else(|| DomainError::budget_not_found(id))?;
        Ok(budget)
    }

    /// Lists a user's budgets.
    pub async fn list_budgets(&self, user_id: &UserId) -> Result<Vec<Budget>, DomainError> {
        self.store.list_for_user(user_id).await
    }

    /// Deletes one of a user's budgets.
    pub async fn delete_budget(&self, user_id: &UserId, id: &BudgetId) -> Result<(), DomainError> {
        // Ownership check before the delete; unknown ids 404.
        self.get_budget(user_id, id).await?;
        self.store.delete(id).await?;
        Ok(())
    }

    /// Evaluates spending against a budget, persists tripped thresholds,
    /// and delivers the resulting alerts.
    pub async fn record_spending(
        &self,
        user_id: &UserId,
        id: &BudgetId,
        spent_amount: f64,
    ) -> Result<SpendingEvaluation, DomainError> {
        if !spent_amount.is_finite() || spent_amount < 0.0 {
            return Err(DomainError::validation(
                "amount",
                "must be a non-negative amount",
            ));
        }

        let mut budget = self.get_budget(user_id, id).await?;
        let alerts = monitor::evaluate(&mut budget, spent_amount, Timestamp::now());
        let spending_percentage = spent_amount / budget.target_amount * 100.0;

        // Persist latched thresholds before delivery so a notifier fault
        // cannot re-arm them.
        self.store.save(budget).await?;

        for alert in &alerts {
            if let Err(err) = self.notifier.notify(alert).await {
                tracing::warn!(budget = %id, error = %err, "alert delivery failed");
            }
        }

        Ok(SpendingEvaluation {
            spending_percentage,
            alerts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::notify::InMemoryNotifier;
    use crate::adapters::storage::InMemoryBudgetStore;
    use crate::domain::foundation::ErrorCode;

    fn service() -> (BudgetService, Arc<InMemoryNotifier>) {
        let notifier = Arc::new(InMemoryNotifier::new());
        (
            BudgetService::new(Arc::new(InMemoryBudgetStore::new()), notifier.clone()),
            notifier,
        )
    }

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    async fn make_budget(service: &BudgetService) -> Budget {
        let start = Timestamp::now();
        service
            .create_budget(
                user(),
                "groceries".to_string(),
                5000.0,
                BudgetPeriod::Monthly,
                start,
                start.add_days(30),
                vec![50.0, 75.0, 90.0, 100.0],
                true,
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn spending_jump_delivers_alerts_once() {
        let (service, notifier) = service();
        let budget = make_budget(&service).await;

        let eval = service
            .record_spending(&user(), &budget.id, 4600.0)
            .await
            .unwrap();
        assert_eq!(eval.alerts.len(), 3);
        assert!((eval.spending_percentage - 92.0).abs() < 1e-9);
        assert_eq!(notifier.recorded().await.len(), 3);

        // Same spending again: thresholds stay latched across calls.
        let eval = service
            .record_spending(&user(), &budget.id, 4600.0)
            .await
            .unwrap();
        assert!(eval.alerts.is_empty());
        assert_eq!(notifier.recorded().await.len(), 3);
    }

    #[tokio::test]
    async fn spending_on_unknown_budget_is_not_found() {
        let (service, _) = service();
        let err = service
            .record_spending(&user(), &BudgetId::new(), 100.0)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BudgetNotFound);
    }

    #[tokio::test]
    async fn budgets_are_scoped_to_their_owner() {
        let (service, _) = service();
        let budget = make_budget(&service).await;

        let other = UserId::new("user-2").unwrap();
        let err = service.get_budget(&other, &budget.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BudgetNotFound);
        assert!(service.list_budgets(&other).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let (service, _) = service();
        let budget = make_budget(&service).await;
        service.delete_budget(&user(), &budget.id).await.unwrap();
        assert!(service.get_budget(&user(), &budget.id).await.is_err());
    }

    #[tokio::test]
    async fn negative_spending_is_rejected() {
        let (service, _) = service();
        let budget = make_budget(&service).await;
        let err = service
            .record_spending(&user(), &budget.id, -5.0)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}
