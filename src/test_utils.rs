//! Fakes shared by unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{TrendBatch, TrendRecord};
use crate::services::{FetchFailure, FetchOutcome, RawContent, TrendFetcher, TrendParser};

pub fn trend(title: &str) -> TrendRecord {
    TrendRecord::with_placeholder(title)
}

/// Fetcher returning the same outcome on every call.
pub struct StaticFetcher {
    outcome: FetchOutcome,
    calls: AtomicUsize,
}

impl StaticFetcher {
    pub fn new(outcome: FetchOutcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn markup(markup: &str) -> Self {
        Self::new(FetchOutcome::Content(RawContent::Markup(markup.to_string())))
    }

    pub fn failing(failure: FetchFailure) -> Self {
        Self::new(FetchOutcome::NoContent(failure))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TrendFetcher for StaticFetcher {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn fetch(&self) -> FetchOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

/// Parser recording its inputs and returning a canned result.
#[derive(Default)]
pub struct CountingParser {
    result: Option<TrendBatch>,
    error: Option<String>,
    calls: AtomicUsize,
    last_input: Mutex<Option<String>>,
}

impl CountingParser {
    pub fn returning(batch: TrendBatch) -> Self {
        Self {
            result: Some(batch),
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_input(&self) -> Option<String> {
        self.last_input.lock().unwrap().clone()
    }
}

impl TrendParser for CountingParser {
    fn parse(&self, markup: &str) -> Result<TrendBatch> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_input.lock().unwrap() = Some(markup.to_string());
        match &self.error {
            Some(message) => Err(AppError::validation(message.clone())),
            None => Ok(self.result.clone().unwrap_or_default()),
        }
    }
}
