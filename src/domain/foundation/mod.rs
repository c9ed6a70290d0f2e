//! Shared value objects for the domain layer.

mod errors;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{BudgetId, FundingSourceId, IntegrationId, UserId};
pub use timestamp::Timestamp;
