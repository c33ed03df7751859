//! Runtime configuration from environment variables

use std::env;
use std::time::Duration;

#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVariable(var) => write!(f, "Missing environment variable: {}", var),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the asset listing / market data / price history feed
    pub market_api_url: String,

    /// Base URL of the social post feed
    pub post_api_url: String,

    /// Bearer token for the post feed (required)
    pub bearer_token: String,

    /// Directory report artifacts are written into
    pub output_dir: String,

    /// Posts per pagination request
    pub page_size: u32,

    /// Hard cap on pagination requests per analysis
    pub max_page_requests: u32,

    /// Courtesy pause between pages, in seconds
    pub page_pause_secs: u64,

    /// First rate-limit cooldown, in seconds
    pub cooldown_initial_secs: u64,

    /// Cooldown ceiling, in seconds
    pub cooldown_max_secs: u64,

    /// Cooldown attempts before giving up
    pub cooldown_max_attempts: u32,

    /// Fetch real forward prices instead of the at-post fallback
    pub enable_price_history: bool,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `MARKET_API_URL` (default: https://api.coingecko.com/api/v3)
    /// - `POST_API_URL` (default: https://api.twitter.com)
    /// - `TWITTER_BEARER_TOKEN` (required)
    /// - `REPORT_OUTPUT_DIR` (default: .)
    /// - `POST_PAGE_SIZE` (default: 25)
    /// - `MAX_PAGE_REQUESTS` (default: 3)
    /// - `PAGE_PAUSE_SECS` (default: 1)
    /// - `COOLDOWN_INITIAL_SECS` (default: 900)
    /// - `COOLDOWN_MAX_SECS` (default: 3600)
    /// - `COOLDOWN_MAX_ATTEMPTS` (default: 3)
    /// - `ENABLE_PRICE_HISTORY` (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        let market_api_url = env::var("MARKET_API_URL")
            .unwrap_or_else(|_| "https://api.coingecko.com/api/v3".to_string());
        let post_api_url =
            env::var("POST_API_URL").unwrap_or_else(|_| "https://api.twitter.com".to_string());

        for (name, url) in [
            ("MARKET_API_URL", &market_api_url),
            ("POST_API_URL", &post_api_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidValue(format!(
                    "{} must start with http:// or https://",
                    name
                )));
            }
        }

        let bearer_token = env::var("TWITTER_BEARER_TOKEN")
            .map_err(|_| ConfigError::MissingVariable("TWITTER_BEARER_TOKEN".to_string()))?;

        Ok(Self {
            market_api_url,
            post_api_url,
            bearer_token,
            output_dir: env::var("REPORT_OUTPUT_DIR").unwrap_or_else(|_| ".".to_string()),
            page_size: parse_or("POST_PAGE_SIZE", 25),
            max_page_requests: parse_or("MAX_PAGE_REQUESTS", 3),
            page_pause_secs: parse_or("PAGE_PAUSE_SECS", 1),
            cooldown_initial_secs: parse_or("COOLDOWN_INITIAL_SECS", 900),
            cooldown_max_secs: parse_or("COOLDOWN_MAX_SECS", 3600),
            cooldown_max_attempts: parse_or("COOLDOWN_MAX_ATTEMPTS", 3),
            enable_price_history: parse_or("ENABLE_PRICE_HISTORY", false),
        })
    }

    pub fn collector_config(&self) -> crate::posts::CollectorConfig {
        crate::posts::CollectorConfig {
            max_page_requests: self.max_page_requests,
            page_pause: Duration::from_secs(self.page_pause_secs),
            cooldown_initial: Duration::from_secs(self.cooldown_initial_secs),
            cooldown_max: Duration::from_secs(self.cooldown_max_secs),
            cooldown_max_attempts: self.cooldown_max_attempts,
        }
    }
}

fn parse_or<T: std::str::FromStr>(var: &str, default: T) -> T {
    env::var(var)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
