//! Trend data structures.

use std::ops::Deref;

use serde::{Deserialize, Serialize};

/// Maximum number of records kept from one retrieval.
pub const MAX_TRENDS: usize = 10;

/// Description attached when the source offers nothing richer than a title.
pub const PLACEHOLDER_DESCRIPTION: &str = "Description not available yet (selector needed)";

/// A single trending topic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrendRecord {
    /// Display label, never empty
    pub title: String,

    /// Description or the placeholder sentinel
    pub description: String,
}

impl TrendRecord {
    /// Create a record with an explicit description.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    /// Create a record carrying the placeholder description.
    pub fn with_placeholder(title: impl Into<String>) -> Self {
        Self::new(title, PLACEHOLDER_DESCRIPTION)
    }

    /// Whether the description is the placeholder sentinel.
    pub fn has_placeholder(&self) -> bool {
        self.description == PLACEHOLDER_DESCRIPTION
    }
}

/// Ordered trends produced by one pipeline run.
///
/// Serializes transparently as a JSON array of records.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct TrendBatch(Vec<TrendRecord>);

impl TrendBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a batch from arbitrary records.
    ///
    /// Records with a blank title are dropped and at most [`MAX_TRENDS`]
    /// are kept, preserving input order.
    pub fn from_records(records: impl IntoIterator<Item = TrendRecord>) -> Self {
        Self(
            records
                .into_iter()
                .filter(|r| !r.title.trim().is_empty())
                .take(MAX_TRENDS)
                .collect(),
        )
    }

    /// Append a record if the batch still has room.
    ///
    /// Returns `false` when the record was rejected.
    pub fn push(&mut self, record: TrendRecord) -> bool {
        if self.is_full() || record.title.trim().is_empty() {
            return false;
        }
        self.0.push(record);
        true
    }

    pub fn is_full(&self) -> bool {
        self.0.len() >= MAX_TRENDS
    }
}

impl Deref for TrendBatch {
    type Target = [TrendRecord];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl IntoIterator for TrendBatch {
    type Item = TrendRecord;
    type IntoIter = std::vec::IntoIter<TrendRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TrendBatch {
    type Item = &'a TrendRecord;
    type IntoIter = std::slice::Iter<'a, TrendRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
