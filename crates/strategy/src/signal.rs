use common::models::{FeatureSnapshot, SellReason, Signal};
use tracing::trace;

#[derive(Debug, Clone, Copy)]
pub struct SignalConfig {
    /// Minimum closed bars before rolling statistics are trusted.
    pub warmup_bars: usize,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self { warmup_bars: 50 }
    }
}

/// Stateless rule engine mapping a feature snapshot plus its risk score to a
/// trading signal. Rules are evaluated in strict priority order; the first
/// match wins, so exactly one signal comes out of any well-formed input.
pub struct SignalEngine {
    config: SignalConfig,
}

impl SignalEngine {
    pub fn new(config: SignalConfig) -> Self {
        Self { config }
    }

    pub fn evaluate(&self, snapshot: &FeatureSnapshot, risk_score: u8) -> Signal {
        // Rolling statistics are meaningless below the warm-up bar count.
        if snapshot.bars < self.config.warmup_bars {
            trace!(
                symbol = %snapshot.symbol,
                bars = snapshot.bars,
                "warm-up gate active, holding"
            );
            return Signal::Hold;
        }

        if risk_score > 80 {
            return Signal::CriticalSell { risk: risk_score };
        }

        if snapshot.sentiment_score < -0.6 {
            return Signal::PanicSell;
        }

        if (snapshot.rsi > 75.0 || snapshot.ema50 < snapshot.ema200) && risk_score > 50 {
            return Signal::Sell(SellReason::TrendReversal);
        }

        let buy = snapshot.close > snapshot.ema200
            && snapshot.rsi < 40.0
            && snapshot.macd > 0.0
            && risk_score < 30
            && snapshot.sentiment_score > 0.0;

        if buy {
            return Signal::Buy;
        }

        Signal::Hold
    }
}
