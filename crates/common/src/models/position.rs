use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An open position, keyed by (trader, symbol): at most one may exist per
/// key. Created only by a successful buy, mutated only through the
/// high-water-mark update, destroyed only by a successful sell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub trader: String,
    pub symbol: String,
    pub entry_price: f64,
    pub shares: f64,
    pub high_water_mark: f64,
    pub opened_at: DateTime<Utc>,
}
