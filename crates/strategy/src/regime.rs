use serde::{Deserialize, Serialize};

/// Market regime annotation derived from trend strength (ADX).
///
/// Advisory only: logged per tick so an operator can see which regime the
/// engine was acting in, but not wired into the signal thresholds. An
/// implementation that wants regime-conditional thresholds can branch on
/// this at the point the `SignalConfig` is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    TrendFollowing,
    MeanReversion,
}

pub fn classify_regime(adx: f64) -> Regime {
    if adx > 25.0 {
        Regime::TrendFollowing
    } else {
        Regime::MeanReversion
    }
}
