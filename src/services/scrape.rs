//! Trends page scrape strategy.
//!
//! Issues a single GET against the configured trends page. There is no
//! retry: a failed attempt is logged and reported as no content. A client
//! that could not be built is reported the same way on every attempt.

use async_trait::async_trait;
use reqwest::Client;

use crate::models::Config;
use crate::services::{FetchFailure, FetchOutcome, RawContent, TrendFetcher};
use crate::utils::http;

/// Fetches the trends page over HTTP.
#[derive(Debug, Clone)]
pub struct ScrapeFetcher {
    client: std::result::Result<Client, FetchFailure>,
    url: String,
}

impl ScrapeFetcher {
    /// Create a fetcher around an existing client.
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client: Ok(client),
            url: url.into(),
        }
    }

    /// Create a fetcher with a client built from the HTTP settings.
    ///
    /// Invalid settings are logged once here; the fetcher then reports
    /// [`FetchFailure::Client`] on every attempt instead of failing startup.
    pub fn from_config(config: &Config) -> Self {
        let client = http::create_client(&config.http).map_err(|e| {
            log::error!("Failed to build HTTP client, scraping is disabled: {e}");
            FetchFailure::Client(e.to_string())
        });

        Self {
            client,
            url: config.retrieval.trends_url.clone(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn try_fetch(&self) -> std::result::Result<String, FetchFailure> {
        if self.url.trim().is_empty() {
            return Err(FetchFailure::MissingUrl);
        }
        let client = self.client.as_ref().map_err(Clone::clone)?;

        let response = client
            .get(&self.url)
            .send()
            .await
            .map_err(FetchFailure::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchFailure::Timeout(e.to_string())
            } else {
                FetchFailure::Body(e.to_string())
            }
        })?;

        if body.trim().is_empty() {
            return Err(FetchFailure::EmptyBody);
        }
        Ok(body)
    }
}

#[async_trait]
impl TrendFetcher for ScrapeFetcher {
    fn name(&self) -> &'static str {
        "scrape"
    }

    async fn fetch(&self) -> FetchOutcome {
        log::info!("Attempting to scrape trends from: {}", self.url);

        match self.try_fetch().await {
            Ok(body) => {
                log::info!(
                    "Successfully fetched {} bytes from {}",
                    body.len(),
                    self.url
                );
                FetchOutcome::Content(RawContent::Markup(body))
            }
            Err(failure) => {
                log::error!("Error during request to {}: {}", self.url, failure);
                FetchOutcome::NoContent(failure)
            }
        }
    }
}
