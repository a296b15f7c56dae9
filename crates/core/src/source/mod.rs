//! External collaborators: the market-data service and the stock screener.

pub mod http;
pub mod screener;

use crate::domain::MarketCapBucket;
use anyhow::Result;
use serde_json::{Map, Value};

/// Read-only "info by symbol" capability of a market-data service.
#[async_trait::async_trait]
pub trait MarketDataSource: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Flat object of every field the service reports for `symbol`.
    async fn fetch_info(&self, symbol: &str) -> Result<Map<String, Value>>;
}

/// Lists symbols in a sector and market-cap bucket, largest market cap first.
#[async_trait::async_trait]
pub trait ScreeningService: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn list_symbols(&self, sector: &str, bucket: MarketCapBucket) -> Result<Vec<String>>;
}
