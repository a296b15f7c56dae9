use crate::config::{env_or, Settings};
use crate::source::MarketDataSource;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{Map, Value};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PATH: &str = "/v1/info";

#[derive(Debug, Clone)]
pub struct HttpMarketDataSource {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    path: String,
}

impl HttpMarketDataSource {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_market_data_base_url()?.to_string();
        let api_key = settings.market_data_api_key.clone();

        let timeout_secs = env_or("MARKET_DATA_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS);

        let path = std::env::var("MARKET_DATA_INFO_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PATH.to_string());

        Self::new(base_url, api_key, path, Duration::from_secs(timeout_secs))
    }

    pub fn new(
        base_url: String,
        api_key: Option<String>,
        path: String,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build market data http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            path,
        })
    }

    /// `{base}{path}/{symbol}`, with `symbol` escaped as a single path segment.
    fn url(&self, symbol: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .with_context(|| format!("invalid MARKET_DATA_BASE_URL: {}", self.base_url))?;

        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("MARKET_DATA_BASE_URL cannot take a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(self.path.split('/').filter(|s| !s.is_empty()))
            .push(symbol);

        Ok(url)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }
}

#[async_trait::async_trait]
impl MarketDataSource for HttpMarketDataSource {
    fn provider_name(&self) -> &'static str {
        "external_http_json"
    }

    async fn fetch_info(&self, symbol: &str) -> Result<Map<String, Value>> {
        let url = self.url(symbol)?;
        let headers = self.headers()?;

        let res = self
            .http
            .get(url)
            .headers(headers)
            .send()
            .await
            .context("market data request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read market data response")?;

        if !status.is_success() {
            anyhow::bail!("market data HTTP {status} for {symbol}: {text}");
        }

        let raw_json = serde_json::from_str::<Value>(&text)
            .with_context(|| format!("market data response is not valid JSON: {text}"))?;

        match raw_json {
            Value::Object(info) => Ok(info),
            other => anyhow::bail!("market data response for {symbol} is not an object: {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::serve;
    use axum::extract::Path;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    fn client(base_url: String) -> HttpMarketDataSource {
        HttpMarketDataSource::new(
            base_url,
            Some("secret".to_string()),
            "v1/info".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn url_joins_base_path_and_symbol() {
        let c = client("http://localhost:9000/".to_string());
        assert_eq!(c.url("AAPL").unwrap().as_str(), "http://localhost:9000/v1/info/AAPL");

        let prefixed = client("http://localhost:9000/api".to_string());
        assert_eq!(
            prefixed.url("MSFT").unwrap().as_str(),
            "http://localhost:9000/api/v1/info/MSFT"
        );
    }

    #[test]
    fn symbol_is_escaped_as_one_segment() {
        let c = client("http://localhost:9000".to_string());
        let url = c.url("BRK/B?x#y").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/v1/info/BRK%2FB%3Fx%23y");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[tokio::test]
    async fn slash_in_symbol_reaches_symbol_route() {
        let app = Router::new().route(
            "/v1/info/:symbol",
            get(|Path(symbol): Path<String>| async move { Json(json!({"symbol": symbol})) }),
        );
        let base = serve(app).await;

        let info = client(base).fetch_info("BRK/B").await.unwrap();
        assert_eq!(info.get("symbol"), Some(&json!("BRK/B")));
    }

    #[tokio::test]
    async fn fetches_info_object_with_api_key() {
        let app = Router::new().route(
            "/v1/info/:symbol",
            get(|Path(symbol): Path<String>, headers: AxumHeaders| async move {
                let key = headers
                    .get("x-api-key")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({"symbol": symbol, "key": key, "marketCap": 1.0e9}))
            }),
        );
        let base = serve(app).await;

        let info = client(base).fetch_info("AAPL").await.unwrap();
        assert_eq!(info.get("symbol"), Some(&json!("AAPL")));
        assert_eq!(info.get("key"), Some(&json!("secret")));
        assert_eq!(info.get("marketCap"), Some(&json!(1.0e9)));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let app = Router::new().route(
            "/v1/info/:symbol",
            get(|| async { (StatusCode::NOT_FOUND, "no such symbol") }),
        );
        let base = serve(app).await;

        let err = client(base).fetch_info("NOPE").await.unwrap_err();
        assert!(format!("{err:#}").contains("404"));
    }

    #[tokio::test]
    async fn non_object_body_is_an_error() {
        let app = Router::new().route("/v1/info/:symbol", get(|| async { Json(json!([1, 2])) }));
        let base = serve(app).await;

        assert!(client(base).fetch_info("AAPL").await.is_err());
    }
}
