// src/pipeline/job.rs

//! The recurring unit of work: retrieve, persist, report.

use std::sync::Arc;

use async_trait::async_trait;

use crate::models::Config;
use crate::pipeline::{RetrievalFailure, Retriever};
use crate::storage::{JsonFileStorage, TrendStorage};

/// Summary of one job cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Records produced by the pipeline
    pub fetched: usize,
    /// Whether the batch reached storage
    pub persisted: bool,
    /// Why nothing was fetched, if so
    pub failure: Option<RetrievalFailure>,
}

/// Work driven by the [`Scheduler`](crate::pipeline::Scheduler).
///
/// Implementations must absorb their own failures; the scheduler treats a
/// panic escaping `run` as fatal.
#[async_trait]
pub trait Job: Send + Sync {
    async fn run(&self) -> CycleReport;
}

/// Retrieves trends and writes them to storage.
pub struct TrendJob {
    retriever: Retriever,
    storage: Arc<dyn TrendStorage>,
}

impl TrendJob {
    pub fn new(retriever: Retriever, storage: Arc<dyn TrendStorage>) -> Self {
        Self { retriever, storage }
    }

    /// Build the production job: configured retriever plus JSON file output.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Retriever::from_config(config),
            Arc::new(JsonFileStorage::new(&config.output.path)),
        )
    }
}

#[async_trait]
impl Job for TrendJob {
    async fn run(&self) -> CycleReport {
        log::info!("Scheduler job: Initiating trend fetching...");

        let outcome = self.retriever.retrieve().await;
        let failure = outcome.failure().cloned();
        let batch = outcome.into_batch();

        if batch.is_empty() {
            let reason = failure
                .as_ref()
                .map_or_else(|| "no trends".to_string(), ToString::to_string);
            log::info!("Scheduler job: No trends fetched ({reason}). No file will be saved.");
            return CycleReport {
                fetched: 0,
                persisted: false,
                failure,
            };
        }

        log::info!("Scheduler job: Successfully fetched {} trend(s)", batch.len());

        let persisted = match self.storage.save(&batch).await {
            Ok(meta) => {
                log::info!(
                    "Scheduler job: Saved {} trends to {} at {}",
                    meta.count,
                    meta.location.display(),
                    meta.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
                );
                true
            }
            Err(e) => {
                log::error!("Scheduler job: Error saving trends: {e}");
                false
            }
        };

        for (i, record) in batch.iter().enumerate() {
            log::info!(
                "Scheduler job: Trend {} - Title: {}, Desc: {}",
                i + 1,
                record.title,
                record.description
            );
        }

        CycleReport {
            fetched: batch.len(),
            persisted,
            failure,
        }
    }
}
