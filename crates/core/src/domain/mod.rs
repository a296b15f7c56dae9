pub mod bucket;
pub mod fundamental;
pub mod related;

pub use bucket::{normalize_sector, MarketCapBucket};
pub use fundamental::{coerce_numeric, normalize_ticker, Fundamental, TickerRecord};
pub use related::{LiveQuote, QuoteValue, RelatedStock, RelatedStocksReport};
