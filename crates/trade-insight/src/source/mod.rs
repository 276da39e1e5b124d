//! Record Sources
//!
//! Where snapshots come from. The pipeline never talks to a database or an
//! indexer directly; a loader hands it normalized records.

mod json;
mod memory;

pub use json::JsonFileSource;
pub use memory::InMemorySource;

use async_trait::async_trait;

use crate::error::Result;
use crate::snapshot::Snapshot;

/// Record loader trait (Strategy pattern)
///
/// Implement this for each backing store: a JSON export, a warehouse query,
/// a chain indexer, etc.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Load and validate one consistent snapshot
    async fn load(&self) -> Result<Snapshot>;

    /// Source name, for logs
    fn name(&self) -> &str;
}
