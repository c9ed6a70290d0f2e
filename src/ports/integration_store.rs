//! Storage port for integration configurations.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, IntegrationId};
use crate::domain::integration::IntegrationConfig;

/// Port for integration configuration persistence.
///
/// The registry depends on this seam rather than owning a map directly so
/// the same contract runs against a fake store in tests and a real one in
/// production.
#[async_trait]
pub trait IntegrationStore: Send + Sync {
    /// Inserts or replaces a configuration (last write wins).
    async fn save(&self, config: IntegrationConfig) -> Result<(), DomainError>;

    /// Fetches a configuration by id.
    async fn get(&self, id: &IntegrationId) -> Result<Option<IntegrationConfig>, DomainError>;

    /// Deletes a configuration; no-op when the id is unknown.
    async fn delete(&self, id: &IntegrationId) -> Result<(), DomainError>;

    /// Lists all stored configurations.
    async fn list(&self) -> Result<Vec<IntegrationConfig>, DomainError>;
}
