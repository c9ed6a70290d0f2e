//! Storage port for budgets.

use async_trait::async_trait;

use crate::domain::budget::Budget;
use crate::domain::foundation::{BudgetId, DomainError, UserId};

/// Port for budget persistence.
#[async_trait]
pub trait BudgetStore: Send + Sync {
    /// Inserts or replaces a budget.
    async fn save(&self, budget: Budget) -> Result<(), DomainError>;

    /// Fetches a budget by id.
    async fn get(&self, id: &BudgetId) -> Result<Option<Budget>, DomainError>;

    /// Deletes a budget.
    ///
    /// Returns whether anything was removed.
    async fn delete(&self, id: &BudgetId) -> Result<bool, DomainError>;

    /// Lists a user's budgets.
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Budget>, DomainError>;
}
