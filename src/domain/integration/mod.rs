//! Integration domain - configuration, sync results, expense reports, and
//! funding sources for the provider integration layer.

mod config;
mod funding;
mod report;
mod sync;

pub use config::{IntegrationConfig, IntegrationStatus, ProviderKind};
pub use funding::{ExternalAccount, FundingSource};
pub use report::{ExpenseReport, ReportStatus};
pub use sync::{SyncIssue, SyncResult};
