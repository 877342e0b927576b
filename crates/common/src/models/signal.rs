use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SellReason {
    TrendReversal,
}

/// Categorical trading signal emitted by the decision engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Buy,
    Sell(SellReason),
    CriticalSell { risk: u8 },
    PanicSell,
    Hold,
}

impl Signal {
    /// True for every signal that implies closing an open position.
    pub fn is_exit(&self) -> bool {
        matches!(
            self,
            Signal::Sell(_) | Signal::CriticalSell { .. } | Signal::PanicSell
        )
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell(SellReason::TrendReversal) => write!(f, "SELL (trend reversal)"),
            Signal::CriticalSell { risk } => write!(f, "CRITICAL SELL (risk {})", risk),
            Signal::PanicSell => write!(f, "PANIC SELL"),
            Signal::Hold => write!(f, "HOLD"),
        }
    }
}
