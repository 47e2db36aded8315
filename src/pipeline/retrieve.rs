// src/pipeline/retrieve.rs

//! Retrieval pipeline: strategy dispatch, fetch, parse.

use std::sync::Arc;

use thiserror::Error;

use crate::models::{Config, FetchMethod, TrendBatch, TrendRecord};
use crate::services::{
    ApiFetcher, FetchFailure, FetchOutcome, HeuristicParser, RawContent, ScrapeFetcher,
    TrendFetcher, TrendParser,
};

/// Why a retrieval produced no trends.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetrievalFailure {
    #[error("selected strategy is not implemented")]
    NotImplemented,

    #[error("no content fetched: {0}")]
    NoContent(FetchFailure),

    #[error("parsing failed: {0}")]
    ParseFailed(String),

    #[error("invalid fetch method '{0}', choose 'API' or 'SCRAPE'")]
    InvalidMethod(String),

    #[error("no trends found in fetched content")]
    NoTrends,
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalOutcome {
    /// At least one trend was extracted
    Trends(TrendBatch),
    /// Nothing usable, with the reason
    Empty(RetrievalFailure),
}

impl RetrievalOutcome {
    fn from_batch(batch: TrendBatch) -> Self {
        if batch.is_empty() {
            Self::Empty(RetrievalFailure::NoTrends)
        } else {
            Self::Trends(batch)
        }
    }

    pub fn failure(&self) -> Option<&RetrievalFailure> {
        match self {
            Self::Trends(_) => None,
            Self::Empty(failure) => Some(failure),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Trends(batch) => batch.len(),
            Self::Empty(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The extracted batch, empty on failure.
    pub fn into_batch(self) -> TrendBatch {
        match self {
            Self::Trends(batch) => batch,
            Self::Empty(_) => TrendBatch::new(),
        }
    }
}

/// Selects a fetch strategy per run and turns its content into trends.
pub struct Retriever {
    method: FetchMethod,
    api: Arc<dyn TrendFetcher>,
    scrape: Arc<dyn TrendFetcher>,
    parser: Arc<dyn TrendParser>,
}

impl Retriever {
    pub fn new(
        method: FetchMethod,
        api: Arc<dyn TrendFetcher>,
        scrape: Arc<dyn TrendFetcher>,
        parser: Arc<dyn TrendParser>,
    ) -> Self {
        Self {
            method,
            api,
            scrape,
            parser,
        }
    }

    /// Build the production strategies from configuration.
    ///
    /// An unparsable parser selector falls back to the default one and bad
    /// HTTP settings disable scraping, so configuration mistakes cost trends,
    /// not the process.
    pub fn from_config(config: &Config) -> Self {
        let parser = HeuristicParser::from_config(&config.parser).unwrap_or_else(|e| {
            log::warn!("{e}. Falling back to the default selector.");
            HeuristicParser::default()
        });

        Self::new(
            config.retrieval.fetch_method.clone(),
            Arc::new(ApiFetcher::from_config(&config.retrieval)),
            Arc::new(ScrapeFetcher::from_config(config)),
            Arc::new(parser),
        )
    }

    /// Run the pipeline once. Never fails; failures become
    /// [`RetrievalOutcome::Empty`] with a logged cause.
    pub async fn retrieve(&self) -> RetrievalOutcome {
        let fetcher = match &self.method {
            FetchMethod::Api => {
                log::info!("API method selected");
                &self.api
            }
            FetchMethod::Scrape => {
                log::info!("SCRAPE method selected");
                &self.scrape
            }
            FetchMethod::Unknown(other) => {
                let failure = RetrievalFailure::InvalidMethod(other.clone());
                log::error!("{failure}");
                return RetrievalOutcome::Empty(failure);
            }
        };

        match fetcher.fetch().await {
            FetchOutcome::NotImplemented => {
                log::info!(
                    "The {} strategy is not implemented, no trends retrieved",
                    fetcher.name()
                );
                RetrievalOutcome::Empty(RetrievalFailure::NotImplemented)
            }
            FetchOutcome::NoContent(failure) => {
                log::warn!("Fetch failed or returned no content, so no parsing will be done");
                RetrievalOutcome::Empty(RetrievalFailure::NoContent(failure))
            }
            FetchOutcome::Content(RawContent::Markup(markup)) => {
                log::info!("Fetch successful, parsing markup...");
                match self.parser.parse(&markup) {
                    Ok(batch) => RetrievalOutcome::from_batch(batch),
                    Err(e) => {
                        log::error!("Error during parsing trends: {e}");
                        RetrievalOutcome::Empty(RetrievalFailure::ParseFailed(e.to_string()))
                    }
                }
            }
            FetchOutcome::Content(RawContent::Payload(value)) => decode_payload(value),
        }
    }
}

/// Decode a structured payload shaped as a list of `{title, description}`.
fn decode_payload(value: serde_json::Value) -> RetrievalOutcome {
    match serde_json::from_value::<Vec<TrendRecord>>(value) {
        Ok(records) => RetrievalOutcome::from_batch(TrendBatch::from_records(records)),
        Err(e) => {
            log::error!("Error decoding API payload: {e}");
            RetrievalOutcome::Empty(RetrievalFailure::ParseFailed(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MAX_TRENDS, PLACEHOLDER_DESCRIPTION};
    use crate::test_utils::{CountingParser, StaticFetcher, trend};

    const MARKUP: &str =
        "<span>This is a trend title over ten chars</span><span>Short</span>";

    fn retriever(
        method: FetchMethod,
        scrape: Arc<StaticFetcher>,
        parser: Arc<dyn TrendParser>,
    ) -> Retriever {
        Retriever::new(
            method,
            Arc::new(ApiFetcher::new(FetchMethod::Api, "")),
            scrape,
            parser,
        )
    }

    #[tokio::test]
    async fn test_api_method_yields_empty_batch() {
        let scrape = Arc::new(StaticFetcher::markup(MARKUP));
        let parser = Arc::new(CountingParser::default());
        let outcome = retriever(FetchMethod::Api, scrape.clone(), parser.clone())
            .retrieve()
            .await;

        assert_eq!(outcome, RetrievalOutcome::Empty(RetrievalFailure::NotImplemented));
        assert_eq!(scrape.calls(), 0);
        assert_eq!(parser.calls(), 0);
    }

    #[tokio::test]
    async fn test_api_method_ignores_other_configuration() {
        let mut config = Config::default();
        config.retrieval.fetch_method = FetchMethod::Api;
        config.retrieval.trends_url = String::new();
        config.retrieval.api_key = "configured".to_string();

        let outcome = Retriever::from_config(&config).retrieve().await;
        assert!(outcome.is_empty());
        assert_eq!(outcome.failure(), Some(&RetrievalFailure::NotImplemented));
    }

    #[tokio::test]
    async fn test_bad_http_settings_cost_trends_not_startup() {
        let mut config = Config::default();
        config.http.user_agent = "bad\nagent".to_string();

        config.retrieval.fetch_method = FetchMethod::Scrape;
        let outcome = Retriever::from_config(&config).retrieve().await;
        assert!(matches!(
            outcome,
            RetrievalOutcome::Empty(RetrievalFailure::NoContent(FetchFailure::Client(_)))
        ));

        config.retrieval.fetch_method = FetchMethod::Api;
        config.retrieval.api_key = "k".to_string();
        let outcome = Retriever::from_config(&config).retrieve().await;
        assert_eq!(outcome.failure(), Some(&RetrievalFailure::NotImplemented));
    }

    #[tokio::test]
    async fn test_no_content_skips_parser() {
        let scrape = Arc::new(StaticFetcher::failing(FetchFailure::Transport(
            "Test network error".to_string(),
        )));
        let parser = Arc::new(CountingParser::default());
        let outcome = retriever(FetchMethod::Scrape, scrape.clone(), parser.clone())
            .retrieve()
            .await;

        assert_eq!(scrape.calls(), 1);
        assert_eq!(parser.calls(), 0);
        assert!(matches!(
            outcome,
            RetrievalOutcome::Empty(RetrievalFailure::NoContent(FetchFailure::Transport(_)))
        ));
        assert!(outcome.into_batch().is_empty());
    }

    #[tokio::test]
    async fn test_scrape_output_equals_parser_output() {
        let expected = TrendBatch::from_records([trend("Test Trend from parser")]);
        let scrape = Arc::new(StaticFetcher::markup("<html>anything</html>"));
        let parser = Arc::new(CountingParser::returning(expected.clone()));
        let outcome = retriever(FetchMethod::Scrape, scrape, parser.clone())
            .retrieve()
            .await;

        assert_eq!(parser.calls(), 1);
        assert_eq!(parser.last_input().as_deref(), Some("<html>anything</html>"));
        assert_eq!(outcome.into_batch(), expected);
    }

    #[tokio::test]
    async fn test_scrape_with_heuristic_parser() {
        let scrape = Arc::new(StaticFetcher::markup(MARKUP));
        let outcome = retriever(
            FetchMethod::Scrape,
            scrape,
            Arc::new(HeuristicParser::default()),
        )
        .retrieve()
        .await;

        let batch = outcome.into_batch();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].title, "This is a trend title over ten chars");
        assert_eq!(batch[0].description, PLACEHOLDER_DESCRIPTION);
    }

    #[tokio::test]
    async fn test_scrape_with_nothing_extracted() {
        let scrape = Arc::new(StaticFetcher::markup("<span>Short</span>"));
        let outcome = retriever(
            FetchMethod::Scrape,
            scrape,
            Arc::new(HeuristicParser::default()),
        )
        .retrieve()
        .await;
        assert_eq!(outcome, RetrievalOutcome::Empty(RetrievalFailure::NoTrends));
    }

    #[tokio::test]
    async fn test_parse_failure_becomes_empty() {
        let scrape = Arc::new(StaticFetcher::markup(MARKUP));
        let parser = Arc::new(CountingParser::failing("malformed document"));
        let outcome = retriever(FetchMethod::Scrape, scrape, parser).retrieve().await;
        assert!(matches!(
            outcome,
            RetrievalOutcome::Empty(RetrievalFailure::ParseFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_method_yields_empty_batch() {
        let scrape = Arc::new(StaticFetcher::markup(MARKUP));
        let parser = Arc::new(CountingParser::default());
        for method in ["INVALID_METHOD", "scrape", ""] {
            let outcome = retriever(
                FetchMethod::from(method.to_string()),
                scrape.clone(),
                parser.clone(),
            )
            .retrieve()
            .await;
            assert_eq!(
                outcome,
                RetrievalOutcome::Empty(RetrievalFailure::InvalidMethod(method.to_string()))
            );
        }
        assert_eq!(scrape.calls(), 0);
        assert_eq!(parser.calls(), 0);
    }

    #[test]
    fn test_decode_payload_normalizes_records() {
        let records: Vec<_> = (0..12)
            .map(|i| serde_json::json!({ "title": format!("Payload trend {i}"), "description": "d" }))
            .chain(std::iter::once(serde_json::json!({ "title": "", "description": "d" })))
            .collect();
        let outcome = decode_payload(serde_json::Value::Array(records));
        assert_eq!(outcome.len(), MAX_TRENDS);

        let outcome = decode_payload(serde_json::json!({ "unexpected": true }));
        assert!(matches!(
            outcome,
            RetrievalOutcome::Empty(RetrievalFailure::ParseFailed(_))
        ));
    }
}
