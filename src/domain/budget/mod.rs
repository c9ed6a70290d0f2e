//! Budget domain - spending budgets, alert thresholds, and the threshold
//! monitor.

mod alert;
mod budget;
pub mod monitor;

pub use alert::BudgetAlert;
pub use budget::{AlertThreshold, Budget, BudgetPeriod};
