pub mod domain;
pub mod error;
pub mod features;
pub mod recommend;
pub mod similarity;
pub mod source;
pub mod universe;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub market_data_base_url: Option<String>,
        pub market_data_api_key: Option<String>,
        pub screener_base_url: Option<String>,
        pub screener_api_key: Option<String>,
        pub screener_host: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                market_data_base_url: std::env::var("MARKET_DATA_BASE_URL").ok(),
                market_data_api_key: std::env::var("MARKET_DATA_API_KEY").ok(),
                screener_base_url: std::env::var("SCREENER_BASE_URL").ok(),
                screener_api_key: std::env::var("SCREENER_API_KEY").ok(),
                screener_host: std::env::var("SCREENER_HOST").ok(),
            })
        }

        pub fn require_market_data_base_url(&self) -> anyhow::Result<&str> {
            self.market_data_base_url
                .as_deref()
                .context("MARKET_DATA_BASE_URL is required")
        }

        pub fn require_screener_api_key(&self) -> anyhow::Result<&str> {
            self.screener_api_key
                .as_deref()
                .context("SCREENER_API_KEY is required")
        }
    }

    /// Reads a numeric knob from the environment, falling back when unset or unparsable.
    pub fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
        std::env::var(key)
            .ok()
            .and_then(|s| s.trim().parse::<T>().ok())
            .unwrap_or(default)
    }
}
