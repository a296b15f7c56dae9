use crate::domain::TickerRecord;
use crate::source::MarketDataSource;
use std::sync::Arc;

/// Turns the market-data capability into infallible per-ticker records.
#[derive(Clone)]
pub struct FeatureProvider {
    source: Arc<dyn MarketDataSource>,
}

impl FeatureProvider {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self { source }
    }

    /// One fetch for `symbol`. Any failure degrades to an all-zero record.
    pub async fn fetch_record(&self, symbol: &str) -> TickerRecord {
        match self.source.fetch_info(symbol).await {
            Ok(info) => TickerRecord::from_info(symbol, &info),
            Err(err) => {
                tracing::warn!(
                    ticker = %symbol,
                    provider = self.source.provider_name(),
                    error = %err,
                    "fundamentals fetch failed; using default record"
                );
                TickerRecord::unavailable(symbol)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{coerce_numeric, Fundamental};
    use crate::source::testing::StaticMarketData;
    use serde_json::json;

    #[tokio::test]
    async fn unknown_symbol_yields_defaults() {
        let source = Arc::new(StaticMarketData::default());
        let provider = FeatureProvider::new(source.clone());

        let rec = provider.fetch_record("ghost").await;
        assert_eq!(rec.ticker, "GHOST");
        assert_eq!(rec.sector, None);
        assert!(Fundamental::ALL
            .iter()
            .all(|f| rec.raw(*f).and_then(coerce_numeric) == Some(0.0)));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn reported_fields_are_extracted() {
        let source = Arc::new(StaticMarketData::default().with(
            "AAPL",
            json!({"sector": "Technology", "marketCap": 3.0e12, "beta": 1.2}),
        ));
        let provider = FeatureProvider::new(source);

        let rec = provider.fetch_record("AAPL").await;
        assert_eq!(rec.sector.as_deref(), Some("Technology"));
        assert_eq!(rec.market_cap(), 3.0e12);
        assert_eq!(rec.raw(Fundamental::Beta), Some(&json!(1.2)));
    }
}
