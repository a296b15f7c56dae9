use crate::config::env_or;
use crate::domain::TickerRecord;
use crate::features::matrix::FeatureMatrix;
use crate::features::provider::FeatureProvider;
use futures_util::stream::{self, StreamExt};

const DEFAULT_FETCH_CONCURRENCY: usize = 4;

#[derive(Clone)]
pub struct FeatureMatrixBuilder {
    provider: FeatureProvider,
    concurrency: usize,
}

impl FeatureMatrixBuilder {
    pub fn new(provider: FeatureProvider) -> Self {
        Self {
            provider,
            concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }

    /// Reads `FETCH_CONCURRENCY`.
    pub fn from_env(provider: FeatureProvider) -> Self {
        Self::new(provider).with_concurrency(env_or("FETCH_CONCURRENCY", DEFAULT_FETCH_CONCURRENCY))
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fetches every symbol once and returns the coerced, imputed matrix.
    pub async fn build(&self, symbols: &[String]) -> FeatureMatrix {
        let records = self.fetch_records(symbols).await;
        let matrix = FeatureMatrix::from_records(&records);
        tracing::debug!(rows = matrix.len(), "feature matrix built");
        matrix
    }

    /// Records in input order regardless of completion order.
    pub async fn fetch_records(&self, symbols: &[String]) -> Vec<TickerRecord> {
        stream::iter(symbols)
            .map(|s| self.provider.fetch_record(s))
            .buffered(self.concurrency)
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Fundamental;
    use crate::features::matrix::RowId;
    use crate::source::testing::StaticMarketData;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn symbols(s: &[&str]) -> Vec<String> {
        s.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn keeps_input_order_and_duplicates() {
        let source = Arc::new(
            StaticMarketData::default()
                .with("A", json!({"beta": 1.0}))
                .with("B", json!({"beta": 2.0}))
                .with("C", json!({"beta": 3.0})),
        );
        let builder = FeatureMatrixBuilder::new(FeatureProvider::new(source.clone()))
            .with_concurrency(3);

        let m = builder.build(&symbols(&["C", "A", "B", "A"])).await;
        let tickers: Vec<&str> = m.rows().map(|(_, t, _)| t).collect();
        assert_eq!(tickers, vec!["C", "A", "B", "A"]);
        assert_eq!(m.value(RowId(0), Fundamental::Beta), Some(3.0));
        assert_eq!(source.calls(), 4);
    }

    #[tokio::test]
    async fn slow_early_fetches_keep_their_rows() {
        let source = Arc::new(
            StaticMarketData::default()
                .with("A", json!({"beta": 1.0}))
                .with("B", json!({"beta": 2.0}))
                .with("C", json!({"beta": 3.0}))
                .with_delay("A", Duration::from_millis(80))
                .with_delay("B", Duration::from_millis(40)),
        );
        let builder = FeatureMatrixBuilder::new(FeatureProvider::new(source.clone()))
            .with_concurrency(3);

        let m = builder.build(&symbols(&["A", "B", "C"])).await;
        let tickers: Vec<&str> = m.rows().map(|(_, t, _)| t).collect();
        assert_eq!(tickers, vec!["A", "B", "C"]);
        assert_eq!(m.value(RowId(0), Fundamental::Beta), Some(1.0));
        assert_eq!(m.value(RowId(1), Fundamental::Beta), Some(2.0));
        assert_eq!(m.value(RowId(2), Fundamental::Beta), Some(3.0));
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn failed_candidate_participates_with_zeros() {
        let source = Arc::new(
            StaticMarketData::default()
                .with("A", json!({"beta": 4.0, "trailingPE": null}))
                .with("B", json!({"beta": 2.0, "trailingPE": 12.0})),
        );
        let builder = FeatureMatrixBuilder::new(FeatureProvider::new(source));

        let records = builder.fetch_records(&symbols(&["A", "B", "DOWN"])).await;
        let down = &records[2];
        assert!(Fundamental::ALL
            .iter()
            .all(|f| down.raw(*f) == Some(&json!(0))));

        let m = FeatureMatrix::from_records(&records);
        // P/E observed: 12 and DOWN's 0 -> median 6.
        assert_eq!(m.value(RowId(0), Fundamental::PeRatio), Some(6.0));
        assert_eq!(m.value(RowId(2), Fundamental::Beta), Some(0.0));
    }

    #[tokio::test]
    async fn empty_universe_builds_empty_matrix() {
        let builder = FeatureMatrixBuilder::new(FeatureProvider::new(Arc::new(
            StaticMarketData::default(),
        )));
        let m = builder.build(&[]).await;
        assert!(m.is_empty());
        assert_eq!(m.columns().len(), 10);
    }
}
