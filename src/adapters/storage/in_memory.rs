//! In-memory storage adapters.
//!
//! Plain map writes, no transactions: concurrent writers to the same key
//! race and the last write wins.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::budget::Budget;
use crate::domain::foundation::{
    BudgetId, DomainError, FundingSourceId, IntegrationId, UserId,
};
use crate::domain::integration::{FundingSource, IntegrationConfig};
use crate::ports::{BudgetStore, FundingSourceStore, IntegrationStore};

/// In-memory integration configuration store.
#[derive(Clone, Default)]
pub struct InMemoryIntegrationStore {
    configs: Arc<RwLock<HashMap<IntegrationId, IntegrationConfig>>>,
}

impl InMemoryIntegrationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored configurations.
    pub async fn len(&self) -> usize {
        self.configs.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.configs.read().await.is_empty()
    }
}

#[async_trait]
impl IntegrationStore for InMemoryIntegrationStore {
    async fn save(&self, config: IntegrationConfig) -> Result<(), DomainError> {
        self.configs.write().await.insert(config.id.clone(), config);
        Ok(())
    }

    async fn get(&self, id: &IntegrationId) -> Result<Option<IntegrationConfig>, DomainError> {
        Ok(self.configs.read().await.get(id).cloned())
    }

    async fn delete(&self, id: &IntegrationId) -> Result<(), DomainError> {
        self.configs.write().await.remove(id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<IntegrationConfig>, DomainError> {
        Ok(self.configs.read().await.values().cloned().collect())
    }
}

/// In-memory funding source store, keyed by owning user.
#[derive(Clone, Default)]
pub struct InMemoryFundingSourceStore {
    sources: Arc<RwLock<HashMap<UserId, Vec<FundingSource>>>>,
}

impl InMemoryFundingSourceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FundingSourceStore for InMemoryFundingSourceStore {
    async fn append(&self, source: FundingSource) -> Result<(), DomainError> {
        self.sources
            .write()
            .await
            .entry(source.user_id.clone())
            .or_default()
            .push(source);
        Ok(())
    }

    async fn update(&self, source: FundingSource) -> Result<(), DomainError> {
        let mut sources = self.sources.write().await;
        let list = sources
            .get_mut(&source.user_id)
            .ok_or_else(|| DomainError::funding_source_not_found(source.id))?;
        let entry = list
            .iter_mut()
            .find(|s| s.id == source.id)
            .ok_or_else(|| DomainError::funding_source_not_found(source.id))?;
        *entry = source;
        Ok(())
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<FundingSource>, DomainError> {
        Ok(self
            .sources
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn find(
        &self,
        user_id: &UserId,
        source_id: &FundingSourceId,
    ) -> Result<Option<FundingSource>, DomainError> {
        Ok(self
            .sources
            .read()
            .await
            .get(user_id)
            .and_then(|list| list.iter().find(|s| &s.id == source_id).cloned()))
    }

    async fn remove(
        &self,
        user_id: &UserId,
        source_id: &FundingSourceId,
    ) -> Result<bool, DomainError> {
        let mut sources = self.sources.write().await;
        let Some(list) = sources.get_mut(user_id) else {
            return Ok(false);
        };
        let before = list.len();
        list.retain(|s| &s.id != source_id);
        Ok(list.len() < before)
    }
}

/// In-memory budget store.
#[derive(Clone, Default)]
pub struct InMemoryBudgetStore {
    budgets: Arc<RwLock<HashMap<BudgetId, Budget>>>,
}

impl InMemoryBudgetStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BudgetStore for InMemoryBudgetStore {
    async fn save(&self, budget: Budget) -> Result<(), DomainError> {
        self.budgets.write().await.insert(budget.id, budget);
        Ok(())
    }

    async fn get(&self, id: &BudgetId) -> Result<Option<Budget>, DomainError> {
        Ok(self.budgets.read().await.get(id).cloned())
    }

    async fn delete(&self, id: &BudgetId) -> Result<bool, DomainError> {
        Ok(self.budgets.write().await.remove(id).is_some())
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Budget>, DomainError> {
        Ok(self
            .budgets
            .read()
            .await
            .values()
            .filter(|b| &b.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::budget::BudgetPeriod;
    use crate::domain::foundation::Timestamp;
    use crate::domain::integration::{ExternalAccount, IntegrationStatus, ProviderKind};

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    fn source(provider: ProviderKind) -> FundingSource {
        FundingSource::connected(
            user(),
            provider,
            ExternalAccount {
                account_id: "acct".to_string(),
                display_name: None,
            },
        )
    }

    #[tokio::test]
    async fn integration_store_last_write_wins() {
        let store = InMemoryIntegrationStore::new();
        let id = IntegrationId::new("x").unwrap();
        let mut config = IntegrationConfig::new(id.clone(), "First", ProviderKind::Plaid);
        store.save(config.clone()).await.unwrap();

        config.name = "Second".to_string();
        config.status = IntegrationStatus::Active;
        store.save(config).await.unwrap();

        let stored = store.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Second");
        assert_eq!(stored.status, IntegrationStatus::Active);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn integration_store_delete_unknown_is_noop() {
        let store = InMemoryIntegrationStore::new();
        store
            .delete(&IntegrationId::new("ghost").unwrap())
            .await
            .unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn funding_store_accumulates_per_user() {
        let store = InMemoryFundingSourceStore::new();
        store.append(source(ProviderKind::PayPal)).await.unwrap();
        store.append(source(ProviderKind::Venmo)).await.unwrap();

        let list = store.list_for_user(&user()).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].provider, ProviderKind::PayPal);
        assert_eq!(list[1].provider, ProviderKind::Venmo);

        let other = UserId::new("user-2").unwrap();
        assert!(store.list_for_user(&other).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn funding_store_remove_reports_outcome() {
        let store = InMemoryFundingSourceStore::new();
        let s = source(ProviderKind::PayPal);
        let id = s.id;
        store.append(s).await.unwrap();

        assert!(store.remove(&user(), &id).await.unwrap());
        assert!(!store.remove(&user(), &id).await.unwrap());
    }

    #[tokio::test]
    async fn funding_store_update_replaces_entry() {
        let store = InMemoryFundingSourceStore::new();
        let mut s = source(ProviderKind::CashApp);
        store.append(s.clone()).await.unwrap();

        s.touch(Timestamp::now());
        store.update(s.clone()).await.unwrap();

        let found = store.find(&user(), &s.id).await.unwrap().unwrap();
        assert!(found.last_used_at.is_some());
    }

    #[tokio::test]
    async fn budget_store_lists_by_owner() {
        let store = InMemoryBudgetStore::new();
        let start = Timestamp::now();
        let budget = Budget::new(
            user(),
            "groceries",
            500.0,
            BudgetPeriod::Monthly,
            start,
            start.add_days(30),
            vec![50.0],
            true,
        )
        .unwrap();
        let id = budget.id;
        store.save(budget).await.unwrap();

        assert_eq!(store.list_for_user(&user()).await.unwrap().len(), 1);
        assert!(store.delete(&id).await.unwrap());
        assert!(!store.delete(&id).await.unwrap());
    }
}
