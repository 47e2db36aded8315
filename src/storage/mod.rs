//! Storage abstractions for trend persistence.
//!
//! Only the most recent batch is kept. Each successful save fully replaces
//! the previous file; there is no history or append mode.

pub mod local;

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::TrendBatch;

// Re-export for convenience
pub use local::JsonFileStorage;

/// Metadata about a storage write operation.
#[derive(Debug, Clone)]
pub struct SaveMetadata {
    /// Number of records written
    pub count: usize,
    /// File that now holds the batch
    pub location: PathBuf,
    /// Timestamp of the write
    pub timestamp: DateTime<Utc>,
}

/// Trait for trend storage backends.
#[async_trait]
pub trait TrendStorage: Send + Sync {
    /// Replace the stored batch.
    async fn save(&self, batch: &TrendBatch) -> Result<SaveMetadata>;

    /// Load the stored batch, empty if nothing has been saved yet.
    async fn load(&self) -> Result<TrendBatch>;
}
