//! Service layer for the trend retriever.
//!
//! This module contains the strategies for:
//! - Raw content retrieval (`ApiFetcher`, `ScrapeFetcher`)
//! - Trend extraction from markup (`HeuristicParser`)

mod api;
mod parser;
mod scrape;

use async_trait::async_trait;
use thiserror::Error;

pub use api::ApiFetcher;
pub use parser::{HeuristicParser, MIN_TITLE_CHARS, TrendParser};
pub use scrape::ScrapeFetcher;

/// Content obtained by a fetch strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum RawContent {
    /// HTML document text
    Markup(String),
    /// Structured API response
    Payload(serde_json::Value),
}

/// Why a fetch produced nothing usable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("no trends URL configured")]
    MissingUrl,

    #[error("HTTP client unavailable: {0}")]
    Client(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("response body was empty")]
    EmptyBody,
}

impl FetchFailure {
    /// Classify a transport-level reqwest error.
    pub(crate) fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

/// Result of a single fetch attempt.
///
/// Strategies never return errors; every failure is folded into
/// [`FetchOutcome::NoContent`] after being logged.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Content(RawContent),
    NoContent(FetchFailure),
    /// The strategy exists but has no working implementation yet
    NotImplemented,
}

/// A way of obtaining raw trend content.
#[async_trait]
pub trait TrendFetcher: Send + Sync {
    /// Short label used in log lines.
    fn name(&self) -> &'static str;

    /// Make one attempt at retrieving current trends.
    async fn fetch(&self) -> FetchOutcome;
}
