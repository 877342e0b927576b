use serde::{Deserialize, Serialize};

use super::{Signal, TradeRecord};

/// What caused a ledger transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TradeTrigger {
    Signal(Signal),
    TrailingStop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub symbol: String,
    pub signal: Signal,
    pub price: f64,
    pub risk_score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub record: TradeRecord,
    pub trigger: TradeTrigger,
}

/// Structured data emitted to downstream collaborators (alerting, UI).
/// Formatting and dispatch are entirely their concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OutboundEvent {
    Signal(SignalEvent),
    Trade(TradeEvent),
}
