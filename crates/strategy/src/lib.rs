pub mod forecast;
pub mod regime;
pub mod risk;
pub mod signal;

pub use forecast::confirm_with_forecast;
pub use regime::{Regime, classify_regime};
pub use risk::crash_risk_score;
pub use signal::{SignalConfig, SignalEngine};

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use common::models::{AnomalyLabel, FeatureSnapshot};

    /// A warmed-up snapshot that triggers none of the decision rules.
    pub fn neutral_snapshot() -> FeatureSnapshot {
        FeatureSnapshot {
            symbol: "BTCUSDT".to_string(),
            timestamp: Utc::now(),
            close: 100.0,
            rsi: 50.0,
            ema50: 101.0,
            ema200: 99.0,
            macd: 0.0,
            atr: 1.0,
            atr_avg: 2.0,
            volume: 1_000.0,
            volume_avg: 1_000.0,
            whale_alert: false,
            anomaly_label: AnomalyLabel::Normal,
            adx: 20.0,
            sentiment_score: 0.0,
            ml_forecast_price: None,
            bars: 200,
        }
    }
}
