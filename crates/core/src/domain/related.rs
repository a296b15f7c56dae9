use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

const NOT_AVAILABLE: &str = "N/A";

/// A live-quote field: a number, or the "N/A" marker when the lookup failed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuoteValue {
    Available(f64),
    NotAvailable,
}

impl QuoteValue {
    pub fn as_f64(self) -> Option<f64> {
        match self {
            QuoteValue::Available(v) => Some(v),
            QuoteValue::NotAvailable => None,
        }
    }
}

impl From<Option<f64>> for QuoteValue {
    fn from(v: Option<f64>) -> Self {
        match v {
            Some(v) if v.is_finite() => QuoteValue::Available(v),
            _ => QuoteValue::NotAvailable,
        }
    }
}

impl Serialize for QuoteValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            QuoteValue::Available(v) => serializer.serialize_f64(*v),
            QuoteValue::NotAvailable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveQuote {
    pub price: QuoteValue,
    pub change: QuoteValue,
    pub change_percent: QuoteValue,
}

impl LiveQuote {
    pub fn not_available() -> Self {
        Self {
            price: QuoteValue::NotAvailable,
            change: QuoteValue::NotAvailable,
            change_percent: QuoteValue::NotAvailable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedStock {
    pub ticker: String,
    pub price: QuoteValue,
    pub change: QuoteValue,
    pub change_percent: QuoteValue,
}

impl RelatedStock {
    pub fn new(ticker: String, quote: LiveQuote) -> Self {
        Self {
            ticker,
            price: quote.price,
            change: quote.change,
            change_percent: quote.change_percent,
        }
    }
}

/// Related stocks for `query`, with the query's profile as the data source reported it.
#[derive(Debug, Clone, Serialize)]
pub struct RelatedStocksReport {
    pub query: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub related: Vec<RelatedStock>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_quote_fields_serialize_as_marker() {
        let stock = RelatedStock::new(
            "MSFT".to_string(),
            LiveQuote {
                price: QuoteValue::Available(412.5),
                change: QuoteValue::NotAvailable,
                change_percent: QuoteValue::from(Some(f64::NAN)),
            },
        );

        let v = serde_json::to_value(&stock).unwrap();
        assert_eq!(
            v,
            json!({"ticker": "MSFT", "price": 412.5, "change": "N/A", "change_percent": "N/A"})
        );
    }
}
