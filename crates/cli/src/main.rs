use anyhow::Context;
use bearwatch_core::domain::normalize_ticker;
use bearwatch_core::features::{FeatureMatrixBuilder, FeatureProvider};
use bearwatch_core::recommend::{RecommendOptions, Recommender};
use bearwatch_core::source::http::HttpMarketDataSource;
use bearwatch_core::source::screener::FinvizScreener;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "bearwatch_cli")]
struct Args {
    /// Ticker to find related stocks for.
    ticker: String,

    /// Number of related tickers. Defaults to RECOMMEND_TOP_N, then 5.
    #[arg(long)]
    top_n: Option<usize>,

    /// Print the screened candidate universe instead of ranking it.
    #[arg(long)]
    candidates_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = bearwatch_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    // stdout carries the JSON report.
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let recommender = match build_recommender(&settings, args.top_n) {
        Ok(r) => r,
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "failed to configure external services");
            return Err(err);
        }
    };

    if args.candidates_only {
        let candidates = recommender.candidates(&args.ticker).await;
        tracing::info!(ticker = %args.ticker, candidates = candidates.len(), "candidate universe");
        let out = serde_json::json!({
            "query": normalize_ticker(&args.ticker),
            "candidates": candidates,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let report = recommender.report(&args.ticker).await;
    if report.related.is_empty() {
        tracing::warn!(ticker = %report.query, "no related stocks found");
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("failed to serialize report")?
    );

    Ok(())
}

fn build_recommender(
    settings: &bearwatch_core::config::Settings,
    top_n: Option<usize>,
) -> anyhow::Result<Recommender> {
    let market_data = Arc::new(HttpMarketDataSource::from_settings(settings)?);
    let screener = Arc::new(FinvizScreener::from_settings(settings)?);

    let mut options = RecommendOptions::from_env();
    if let Some(n) = top_n {
        options.top_n = n;
    }

    let builder = FeatureMatrixBuilder::from_env(FeatureProvider::new(market_data.clone()));

    Ok(Recommender::new(market_data, screener)
        .with_options(options)
        .with_builder(builder))
}

fn init_sentry(settings: &bearwatch_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
