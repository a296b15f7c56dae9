use serde::{Deserialize, Serialize};
use std::fmt;

const SMALL_CAP_CEILING: f64 = 2.0e9;
const MID_CAP_CEILING: f64 = 10.0e9;
const LARGE_CAP_CEILING: f64 = 200.0e9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketCapBucket {
    Small,
    Mid,
    Large,
    Mega,
}

impl MarketCapBucket {
    pub fn classify(market_cap: f64) -> Self {
        if market_cap < SMALL_CAP_CEILING {
            MarketCapBucket::Small
        } else if market_cap < MID_CAP_CEILING {
            MarketCapBucket::Mid
        } else if market_cap < LARGE_CAP_CEILING {
            MarketCapBucket::Large
        } else {
            MarketCapBucket::Mega
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MarketCapBucket::Small => "small",
            MarketCapBucket::Mid => "mid",
            MarketCapBucket::Large => "large",
            MarketCapBucket::Mega => "mega",
        }
    }
}

impl fmt::Display for MarketCapBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Screener sector slug: spaces removed, lowercased ("Consumer Cyclical" -> "consumercyclical").
pub fn normalize_sector(sector: &str) -> String {
    sector.replace(' ', "").to_lowercase()
}
