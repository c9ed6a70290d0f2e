//! Storage adapters.
//!
//! The deployment model is a single long-lived process with in-memory
//! state; these adapters fill the storage ports with `RwLock`-guarded
//! maps. A persistent backend would implement the same ports.

mod in_memory;

pub use in_memory::{InMemoryBudgetStore, InMemoryFundingSourceStore, InMemoryIntegrationStore};
