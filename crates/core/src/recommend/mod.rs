//! The related-stocks pipeline: screen, fetch, impute, rank, decorate.

pub mod quotes;

use crate::config::env_or;
use crate::domain::{normalize_ticker, RelatedStock, RelatedStocksReport, TickerRecord};
use crate::error::RankingError;
use crate::features::{FeatureMatrixBuilder, FeatureProvider};
use crate::similarity::{rank_with_record, SimilarityResult, DEFAULT_TOP_N};
use crate::source::{MarketDataSource, ScreeningService};
use crate::universe::CandidateUniverseSelector;
use quotes::QuoteLookup;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct RecommendOptions {
    /// Number of related tickers to return.
    pub top_n: usize,
}

impl Default for RecommendOptions {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl RecommendOptions {
    pub fn from_env() -> Self {
        Self {
            top_n: env_or("RECOMMEND_TOP_N", DEFAULT_TOP_N),
        }
    }
}

/// Why a recommendation came back empty.
#[derive(Debug, Clone, PartialEq)]
pub enum EmptyReason {
    UnknownSector,
    NoCandidates,
    Ranking(RankingError),
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyReason::UnknownSector => f.write_str("sector information not available"),
            EmptyReason::NoCandidates => f.write_str("screener returned no candidates"),
            EmptyReason::Ranking(err) => write!(f, "{err}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationOutcome {
    Ranked(SimilarityResult),
    Empty(EmptyReason),
}

impl RecommendationOutcome {
    pub fn into_tickers(self) -> Vec<String> {
        match self {
            RecommendationOutcome::Ranked(result) => result.into_tickers(),
            RecommendationOutcome::Empty(_) => Vec::new(),
        }
    }
}

pub struct Recommender {
    provider: FeatureProvider,
    selector: CandidateUniverseSelector,
    builder: FeatureMatrixBuilder,
    quotes: QuoteLookup,
    options: RecommendOptions,
}

impl Recommender {
    pub fn new(market_data: Arc<dyn MarketDataSource>, screener: Arc<dyn ScreeningService>) -> Self {
        let provider = FeatureProvider::new(market_data.clone());
        Self {
            builder: FeatureMatrixBuilder::new(provider.clone()),
            provider,
            selector: CandidateUniverseSelector::new(screener),
            quotes: QuoteLookup::new(market_data),
            options: RecommendOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RecommendOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_builder(mut self, builder: FeatureMatrixBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// Screened candidate universe for `query`, empty when its sector is unknown.
    pub async fn candidates(&self, query: &str) -> Vec<String> {
        let record = self.provider.fetch_record(&normalize_ticker(query)).await;
        self.screen(&record).await.unwrap_or_default()
    }

    pub async fn recommend(&self, query: &str) -> RecommendationOutcome {
        let record = self.provider.fetch_record(&normalize_ticker(query)).await;
        self.recommend_for(&record).await
    }

    /// Ranked tickers decorated with live quotes. Always returns, possibly empty.
    pub async fn get_related_stocks(&self, query: &str) -> Vec<RelatedStock> {
        let tickers = self.recommend(query).await.into_tickers();
        self.decorate(tickers).await
    }

    /// `get_related_stocks` plus the query's own profile from the same fetch.
    pub async fn report(&self, query: &str) -> RelatedStocksReport {
        let record = self.provider.fetch_record(&normalize_ticker(query)).await;
        let tickers = self.recommend_for(&record).await.into_tickers();
        let related = self.decorate(tickers).await;

        RelatedStocksReport {
            query: record.ticker,
            name: record.name,
            sector: record.sector,
            industry: record.industry,
            generated_at: chrono::Utc::now(),
            related,
        }
    }

    async fn recommend_for(&self, record: &TickerRecord) -> RecommendationOutcome {
        let query = record.ticker.as_str();

        let candidates = match self.screen(record).await {
            Ok(c) => c,
            Err(reason) => {
                tracing::info!(ticker = %query, %reason, "no recommendations");
                return RecommendationOutcome::Empty(reason);
            }
        };

        let matrix = self.builder.build(&candidates).await;
        match rank_with_record(record, matrix, self.options.top_n) {
            Ok(result) => {
                tracing::info!(
                    ticker = %query,
                    candidates = candidates.len(),
                    related = ?result.tickers(),
                    "ranked related stocks"
                );
                RecommendationOutcome::Ranked(result)
            }
            Err(err) => {
                tracing::warn!(ticker = %query, error = %err, "ranking failed; no recommendations");
                RecommendationOutcome::Empty(EmptyReason::Ranking(err))
            }
        }
    }

    async fn decorate(&self, tickers: Vec<String>) -> Vec<RelatedStock> {
        let mut out = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            let quote = self.quotes.quote(&ticker).await;
            out.push(RelatedStock::new(ticker, quote));
        }
        out
    }

    async fn screen(&self, record: &TickerRecord) -> Result<Vec<String>, EmptyReason> {
        let sector = record.sector.as_deref().ok_or(EmptyReason::UnknownSector)?;
        let candidates = self.selector.select(sector, record.market_cap()).await;
        if candidates.is_empty() {
            return Err(EmptyReason::NoCandidates);
        }
        Ok(candidates)
    }
}
