use crate::domain::{coerce_numeric, LiveQuote, QuoteValue};
use crate::source::MarketDataSource;
use serde_json::{Map, Value};
use std::sync::Arc;

const PRICE_KEY: &str = "regularMarketPrice";
const CHANGE_KEY: &str = "regularMarketChange";
const CHANGE_PERCENT_KEY: &str = "regularMarketChangePercent";

/// Best-effort live quote lookup used to decorate ranked tickers.
#[derive(Clone)]
pub struct QuoteLookup {
    source: Arc<dyn MarketDataSource>,
}

impl QuoteLookup {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self { source }
    }

    pub async fn quote(&self, symbol: &str) -> LiveQuote {
        match self.source.fetch_info(symbol).await {
            Ok(info) => quote_from_info(&info),
            Err(err) => {
                tracing::warn!(ticker = %symbol, error = %err, "quote lookup failed");
                LiveQuote::not_available()
            }
        }
    }
}

fn quote_from_info(info: &Map<String, Value>) -> LiveQuote {
    let field = |key: &str| QuoteValue::from(info.get(key).and_then(coerce_numeric));
    LiveQuote {
        price: field(PRICE_KEY),
        change: field(CHANGE_KEY),
        change_percent: field(CHANGE_PERCENT_KEY),
    }
}
