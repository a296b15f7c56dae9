use crate::domain::{normalize_sector, MarketCapBucket};
use crate::source::ScreeningService;
use std::sync::Arc;

/// Picks comparison candidates from the screener by sector and market-cap bucket.
#[derive(Clone)]
pub struct CandidateUniverseSelector {
    screener: Arc<dyn ScreeningService>,
}

impl CandidateUniverseSelector {
    pub fn new(screener: Arc<dyn ScreeningService>) -> Self {
        Self { screener }
    }

    /// Candidate tickers, largest market cap first. Screener failures yield an empty list.
    pub async fn select(&self, sector: &str, market_cap: f64) -> Vec<String> {
        let sector = normalize_sector(sector);
        let bucket = MarketCapBucket::classify(market_cap);

        match self.screener.list_symbols(&sector, bucket).await {
            Ok(symbols) => {
                tracing::debug!(%sector, %bucket, candidates = symbols.len(), "screened candidate universe");
                symbols
            }
            Err(err) => {
                tracing::error!(
                    %sector,
                    %bucket,
                    provider = self.screener.provider_name(),
                    error = %err,
                    "screener request failed; no candidates"
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::StaticScreener;

    #[tokio::test]
    async fn normalizes_sector_and_buckets_cap() {
        let screener = Arc::new(StaticScreener::returning(&["XOM", "CVX"]));
        let selector = CandidateUniverseSelector::new(screener.clone());

        let out = selector.select("Basic Materials", 5.0e9).await;
        assert_eq!(out, vec!["XOM", "CVX"]);

        let seen = screener.seen.lock().unwrap();
        assert_eq!(
            seen.as_slice(),
            &[("basicmaterials".to_string(), MarketCapBucket::Mid)]
        );
    }

    #[tokio::test]
    async fn screener_failure_is_empty() {
        let selector = CandidateUniverseSelector::new(Arc::new(StaticScreener::failing()));
        assert!(selector.select("Technology", 3.0e12).await.is_empty());
    }
}
