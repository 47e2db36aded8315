//! Platform API fetch strategy.

use async_trait::async_trait;

use crate::models::{FetchMethod, RetrievalConfig};
use crate::services::{FetchOutcome, TrendFetcher};

/// Fetches trends through the platform's authenticated API.
///
/// No client exists yet, so every call reports [`FetchOutcome::NotImplemented`].
#[derive(Debug, Clone)]
pub struct ApiFetcher {
    method: FetchMethod,
    api_key: String,
}

impl ApiFetcher {
    pub fn new(method: FetchMethod, api_key: impl Into<String>) -> Self {
        Self {
            method,
            api_key: api_key.into(),
        }
    }

    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self::new(config.fetch_method.clone(), config.api_key.clone())
    }

    pub fn has_credentials(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[async_trait]
impl TrendFetcher for ApiFetcher {
    fn name(&self) -> &'static str {
        "api"
    }

    async fn fetch(&self) -> FetchOutcome {
        if self.method == FetchMethod::Scrape {
            log::warn!("API fetcher invoked, but fetch_method is SCRAPE");
        }
        if !self.has_credentials() {
            log::warn!("No API credentials configured");
        }
        log::info!("API trend retrieval is not implemented yet");
        FetchOutcome::NotImplemented
    }
}
