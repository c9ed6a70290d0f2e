//! Storage port for per-user funding source lists.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, FundingSourceId, UserId};
use crate::domain::integration::FundingSource;

/// Port for funding source persistence, keyed by owning user.
#[async_trait]
pub trait FundingSourceStore: Send + Sync {
    /// Appends a source to its user's list. No dedup by provider:
    /// reconnecting the same provider adds a second entry.
    async fn append(&self, source: FundingSource) -> Result<(), DomainError>;

    /// Replaces a stored source (matched by id within the user's list).
    async fn update(&self, source: FundingSource) -> Result<(), DomainError>;

    /// Lists a user's sources in insertion order.
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<FundingSource>, DomainError>;

    /// Finds one of a user's sources by id.
    async fn find(
        &self,
        user_id: &UserId,
        source_id: &FundingSourceId,
    ) -> Result<Option<FundingSource>, DomainError>;

    /// Removes a source from its user's list.
    ///
    /// Returns whether anything was removed; absent ids are not an error.
    async fn remove(
        &self,
        user_id: &UserId,
        source_id: &FundingSourceId,
    ) -> Result<bool, DomainError>;
}
