use crate::config::{env_or, Settings};
use crate::domain::{normalize_ticker, MarketCapBucket};
use crate::source::ScreeningService;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://finviz-screener.p.rapidapi.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const TABLE_PATH: &str = "/table";

// Column holding the ticker in each screener row; column 0 is the row number.
const TICKER_COLUMN: usize = 1;

#[derive(Debug, Clone)]
pub struct FinvizScreener {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    host: String,
}

impl FinvizScreener {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.require_screener_api_key()?.to_string();
        let base_url = settings
            .screener_base_url
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let host = match settings.screener_host.clone() {
            Some(h) if !h.trim().is_empty() => h,
            _ => host_of(&base_url)?,
        };

        let timeout_secs = env_or("SCREENER_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS);

        Self::new(base_url, api_key, host, Duration::from_secs(timeout_secs))
    }

    pub fn new(base_url: String, api_key: String, host: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build screener http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            host,
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert("x-rapidapi-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert("x-rapidapi-host", HeaderValue::from_str(&self.host)?);
        Ok(headers)
    }
}

#[async_trait::async_trait]
impl ScreeningService for FinvizScreener {
    fn provider_name(&self) -> &'static str {
        "finviz_rapidapi"
    }

    async fn list_symbols(&self, sector: &str, bucket: MarketCapBucket) -> Result<Vec<String>> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), TABLE_PATH);
        let query: Vec<(&str, String)> = vec![
            ("order", "marketcap".to_string()),
            ("desc", "true".to_string()),
            ("filters", format!("cap_{bucket}")),
            ("filters", format!("sec_{sector}")),
        ];

        let res = self
            .http
            .get(url)
            .headers(self.headers()?)
            .query(&query)
            .send()
            .await
            .context("screener request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read screener response")?;

        if !status.is_success() {
            anyhow::bail!("screener HTTP {status}: {text}");
        }

        let raw_json = serde_json::from_str::<Value>(&text)
            .with_context(|| format!("screener response is not valid JSON: {text}"))?;
        parse_rows(&raw_json)
    }
}

/// Pulls the ticker column out of a `{"rows": [[no, ticker, ...], ...]}` payload.
pub fn parse_rows(payload: &Value) -> Result<Vec<String>> {
    let rows = payload
        .get("rows")
        .and_then(Value::as_array)
        .context("screener payload has no rows array")?;

    let mut out = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        let ticker = row
            .as_array()
            .and_then(|cells| cells.get(TICKER_COLUMN))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty());

        match ticker {
            Some(t) => out.push(normalize_ticker(t)),
            None => tracing::debug!(idx, %row, "skipping screener row without ticker"),
        }
    }

    Ok(out)
}

fn host_of(base_url: &str) -> Result<String> {
    let url = reqwest::Url::parse(base_url)
        .with_context(|| format!("invalid SCREENER_BASE_URL: {base_url}"))?;
    url.host_str()
        .map(str::to_string)
        .with_context(|| format!("SCREENER_BASE_URL has no host: {base_url}"))
}
