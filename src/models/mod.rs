// src/models/mod.rs

//! Domain models for the trend retriever.

mod config;
mod trend;

// Re-export all public types
pub use config::{
    Config, ENV_API_KEY, ENV_FETCH_METHOD, ENV_OUTPUT, ENV_TRENDS_URL, FetchMethod, HttpConfig,
    OutputConfig, ParserConfig, RetrievalConfig, SchedulerConfig,
};
pub use trend::{MAX_TRENDS, PLACEHOLDER_DESCRIPTION, TrendBatch, TrendRecord};
