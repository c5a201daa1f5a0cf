// filters/mod.rs
pub mod deep;
pub mod entry;

pub use deep::DeepFilter;
pub use entry::EntryFilter;

use crate::entry::Entry;
use std::sync::Arc;

/// Shared, thread-safe predicate over traversal entries
pub type EntryPredicate = Arc<dyn Fn(&Entry) -> bool + Send + Sync>;
