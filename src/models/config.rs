//! Application configuration structures.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Environment variable overriding `retrieval.fetch_method`.
pub const ENV_FETCH_METHOD: &str = "TRENDS_FETCH_METHOD";
/// Environment variable overriding `retrieval.trends_url`.
pub const ENV_TRENDS_URL: &str = "TRENDS_URL";
/// Environment variable overriding `retrieval.api_key`.
pub const ENV_API_KEY: &str = "TRENDS_API_KEY";
/// Environment variable overriding `output.path`.
pub const ENV_OUTPUT: &str = "TRENDS_OUTPUT";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Which strategy to use and where to fetch from
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// HTTP client settings for the scrape strategy
    #[serde(default)]
    pub http: HttpConfig,

    /// Markup extraction settings
    #[serde(default)]
    pub parser: ParserConfig,

    /// Recurring job settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Where the latest batch is written
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Empty values are ignored so an exported-but-blank variable does not
    /// wipe out the file setting.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(method) = lookup(ENV_FETCH_METHOD) {
            self.retrieval.fetch_method = FetchMethod::from(method);
        }
        if let Some(url) = lookup(ENV_TRENDS_URL) {
            self.retrieval.trends_url = url;
        }
        if let Some(key) = lookup(ENV_API_KEY) {
            self.retrieval.api_key = key;
        }
        if let Some(path) = lookup(ENV_OUTPUT) {
            self.output.path = PathBuf::from(path);
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        match &self.retrieval.fetch_method {
            FetchMethod::Api => {
                if self.retrieval.api_key.trim().is_empty() {
                    return Err(AppError::validation(
                        "retrieval.api_key is required when fetch_method is API",
                    ));
                }
            }
            FetchMethod::Scrape => {
                if self.retrieval.trends_url.trim().is_empty() {
                    return Err(AppError::validation(
                        "retrieval.trends_url is required when fetch_method is SCRAPE",
                    ));
                }
                url::Url::parse(&self.retrieval.trends_url)?;
            }
            FetchMethod::Unknown(other) => {
                return Err(AppError::validation(format!(
                    "retrieval.fetch_method '{other}' is invalid, choose 'API' or 'SCRAPE'"
                )));
            }
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.scheduler.interval_secs == 0 {
            return Err(AppError::validation("scheduler.interval_secs must be > 0"));
        }
        scraper::Selector::parse(&self.parser.selector)
            .map_err(|e| AppError::selector(&self.parser.selector, format!("{e:?}")))?;
        if self.output.path.as_os_str().is_empty() {
            return Err(AppError::validation("output.path is empty"));
        }
        Ok(())
    }
}

/// How trends are obtained.
///
/// Unrecognized values are preserved rather than rejected at load time, so a
/// typo in the config surfaces as a logged dispatch error instead of a crash.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FetchMethod {
    /// Authenticated platform API
    Api,
    /// HTML scraping of the trends page
    #[default]
    Scrape,
    /// Anything else found in the configuration
    Unknown(String),
}

impl FetchMethod {
    pub fn as_str(&self) -> &str {
        match self {
            FetchMethod::Api => "API",
            FetchMethod::Scrape => "SCRAPE",
            FetchMethod::Unknown(other) => other,
        }
    }
}

impl From<String> for FetchMethod {
    fn from(value: String) -> Self {
        match value.as_str() {
            "API" => FetchMethod::Api,
            "SCRAPE" => FetchMethod::Scrape,
            _ => FetchMethod::Unknown(value),
        }
    }
}

impl From<FetchMethod> for String {
    fn from(value: FetchMethod) -> Self {
        value.as_str().to_string()
    }
}

impl FromStr for FetchMethod {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(FetchMethod::from(s.to_string()))
    }
}

impl fmt::Display for FetchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategy selection and source endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// `API` or `SCRAPE`
    #[serde(default)]
    pub fetch_method: FetchMethod,

    /// Trends page fetched by the scrape strategy
    #[serde(default = "defaults::trends_url")]
    pub trends_url: String,

    /// Credentials for the API strategy
    #[serde(default)]
    pub api_key: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            fetch_method: FetchMethod::default(),
            trends_url: defaults::trends_url(),
            api_key: String::new(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Markup extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// CSS selector for candidate trend elements
    #[serde(default = "defaults::selector")]
    pub selector: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            selector: defaults::selector(),
        }
    }
}

/// Recurring job settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between scheduled runs
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
        }
    }
}

/// Output file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// JSON file holding the latest batch
    #[serde(default = "defaults::output_path")]
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: defaults::output_path(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn trends_url() -> String {
        "https://x.com/explore/tabs/trending".into()
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
            .into()
    }
    pub fn timeout() -> u64 {
        10
    }

    pub fn selector() -> String {
        "span".into()
    }

    // 30 minutes
    pub fn interval() -> u64 {
        30 * 60
    }

    pub fn output_path() -> PathBuf {
        PathBuf::from("output/trends.json")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.retrieval.fetch_method, FetchMethod::Scrape);
        assert_eq!(config.http.timeout_secs, 10);
        assert_eq!(config.scheduler.interval_secs, 1800);
        assert_eq!(config.parser.selector, "span");
        assert!(config.http.user_agent.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn fetch_method_parsing_is_exact() {
        assert_eq!("API".parse::<FetchMethod>().unwrap(), FetchMethod::Api);
        assert_eq!("SCRAPE".parse::<FetchMethod>().unwrap(), FetchMethod::Scrape);
        assert_eq!(
            "scrape".parse::<FetchMethod>().unwrap(),
            FetchMethod::Unknown("scrape".to_string())
        );
    }

    #[test]
    fn unknown_fetch_method_survives_toml_load() {
        let config: Config = toml::from_str(
            r#"
            [retrieval]
            fetch_method = "INVALID_METHOD"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.retrieval.fetch_method,
            FetchMethod::Unknown("INVALID_METHOD".to_string())
        );
        // Unspecified fields fall back to defaults
        assert_eq!(config.http.timeout_secs, 10);
        assert!(config.validate().is_err());
    }

    #[test]
    fn full_toml_round_trips() {
        let config: Config = toml::from_str(
            r#"
            [retrieval]
            fetch_method = "API"
            api_key = "secret"

            [scheduler]
            interval_secs = 60

            [output]
            path = "out/latest.json"
            "#,
        )
        .unwrap();
        assert_eq!(config.retrieval.fetch_method, FetchMethod::Api);
        assert_eq!(config.scheduler.interval_secs, 60);
        assert_eq!(config.output.path, PathBuf::from("out/latest.json"));
        assert!(config.validate().is_ok());

        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("fetch_method = \"API\""));
    }

    #[test]
    fn validate_requires_api_key_for_api() {
        let mut config = Config::default();
        config.retrieval.fetch_method = FetchMethod::Api;
        assert!(config.validate().is_err());
        config.retrieval.api_key = "key".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_scrape_url() {
        let mut config = Config::default();
        config.retrieval.trends_url = String::new();
        assert!(config.validate().is_err());
        config.retrieval.trends_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeouts_and_bad_selector() {
        let mut config = Config::default();
        config.http.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.scheduler.interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.parser.selector = "[[invalid".to_string();
        assert!(matches!(
            config.validate(),
            Err(AppError::Selector { .. })
        ));
    }

    #[test]
    fn overrides_replace_non_empty_values_only() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_FETCH_METHOD, "API"),
            (ENV_TRENDS_URL, "  "),
            (ENV_API_KEY, "token"),
            (ENV_OUTPUT, "elsewhere.json"),
        ]);
        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.retrieval.fetch_method, FetchMethod::Api);
        assert_eq!(config.retrieval.trends_url, RetrievalConfig::default().trends_url);
        assert_eq!(config.retrieval.api_key, "token");
        assert_eq!(config.output.path, PathBuf::from("elsewhere.json"));
    }

    #[test]
    fn load_or_default_falls_back_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(dir.path().join("missing.toml"));
        assert_eq!(config.retrieval.fetch_method, FetchMethod::Scrape);
    }
}
