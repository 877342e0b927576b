use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "BUY",
            TradeAction::Sell => "SELL",
        }
    }
}

/// One row of the append-only trade history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub time: DateTime<Utc>,
    pub trader: String,
    pub symbol: String,
    pub action: TradeAction,
    pub price: f64,
    pub shares: f64,
    pub value: f64,
    /// Present only on sells.
    pub profit: Option<f64>,
}

/// Read model for status queries (dashboard / notifier consumption).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioStatus {
    pub balance: f64,
    pub positions: Vec<Position>,
    pub history: Vec<TradeRecord>,
}
