use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The ten numeric columns used as similarity features, in declared order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fundamental {
    MarketCap,
    PeRatio,
    PbRatio,
    GrossMargin,
    OperatingMargin,
    DividendYield,
    DebtToEquity,
    Beta,
    RevenueGrowth,
    FreeCashFlow,
}

impl Fundamental {
    pub const ALL: [Fundamental; 10] = [
        Fundamental::MarketCap,
        Fundamental::PeRatio,
        Fundamental::PbRatio,
        Fundamental::GrossMargin,
        Fundamental::OperatingMargin,
        Fundamental::DividendYield,
        Fundamental::DebtToEquity,
        Fundamental::Beta,
        Fundamental::RevenueGrowth,
        Fundamental::FreeCashFlow,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Fundamental::MarketCap => "Market Cap",
            Fundamental::PeRatio => "P/E Ratio",
            Fundamental::PbRatio => "P/B Ratio",
            Fundamental::GrossMargin => "Gross Margin",
            Fundamental::OperatingMargin => "Operating Margin",
            Fundamental::DividendYield => "Dividend Yield",
            Fundamental::DebtToEquity => "D/E Ratio",
            Fundamental::Beta => "Beta",
            Fundamental::RevenueGrowth => "Revenue Growth",
            Fundamental::FreeCashFlow => "Free Cash Flow",
        }
    }

    /// Field name in the market-data info payload.
    pub fn source_key(self) -> &'static str {
        match self {
            Fundamental::MarketCap => "marketCap",
            Fundamental::PeRatio => "trailingPE",
            Fundamental::PbRatio => "priceToBook",
            Fundamental::GrossMargin => "grossMargins",
            Fundamental::OperatingMargin => "operatingMargins",
            Fundamental::DividendYield => "dividendYield",
            Fundamental::DebtToEquity => "debtToEquity",
            Fundamental::Beta => "beta",
            Fundamental::RevenueGrowth => "revenueGrowth",
            Fundamental::FreeCashFlow => "freeCashflow",
        }
    }
}

/// Raw per-ticker fundamentals as reported by the source, before coercion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerRecord {
    pub ticker: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub fundamentals: BTreeMap<Fundamental, Value>,
}

impl TickerRecord {
    /// Record used when the source has nothing for `ticker`: every fundamental is the `0` sentinel.
    pub fn unavailable(ticker: &str) -> Self {
        let fundamentals = Fundamental::ALL
            .iter()
            .map(|f| (*f, Value::from(0)))
            .collect();

        Self {
            ticker: normalize_ticker(ticker),
            name: None,
            sector: None,
            industry: None,
            fundamentals,
        }
    }

    /// Extracts the profile and the ten fundamentals from an info payload.
    ///
    /// Absent keys become `0`. A key that is present but `null` stays `null` and is
    /// imputed later, like any other non-numeric value.
    pub fn from_info(ticker: &str, info: &Map<String, Value>) -> Self {
        let fundamentals = Fundamental::ALL
            .iter()
            .map(|f| {
                let raw = info.get(f.source_key()).cloned().unwrap_or(Value::from(0));
                (*f, raw)
            })
            .collect();

        Self {
            ticker: normalize_ticker(ticker),
            name: profile_field(info, "longName"),
            sector: profile_field(info, "sector"),
            industry: profile_field(info, "industry"),
            fundamentals,
        }
    }

    pub fn raw(&self, fundamental: Fundamental) -> Option<&Value> {
        self.fundamentals.get(&fundamental)
    }

    /// Market cap as a number; anything non-numeric counts as zero.
    pub fn market_cap(&self) -> f64 {
        self.raw(Fundamental::MarketCap)
            .and_then(coerce_numeric)
            .unwrap_or(0.0)
    }
}

/// Numeric coercion for a raw source value. Numbers pass through, numeric strings
/// (including `inf`) are parsed, everything else and NaN is missing.
pub fn coerce_numeric(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (!n.is_nan()).then_some(n)
}

pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_ascii_uppercase()
}

fn profile_field(info: &Map<String, Value>, key: &str) -> Option<String> {
    info.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "N/A")
        .map(str::to_string)
}
