//! Notification adapters for budget alerts.

mod in_memory;
mod tracing_notifier;

pub use in_memory::InMemoryNotifier;
pub use tracing_notifier::TracingNotifier;
