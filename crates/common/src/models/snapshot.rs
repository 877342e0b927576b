use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label produced by the external anomaly oracle. The detector itself is an
/// opaque collaborator; only the label crosses into the decision core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnomalyLabel {
    Normal,
    Anomalous,
}

/// One fully populated market feature frame for a symbol at a point in time.
///
/// Providers must withhold the snapshot entirely instead of emitting partial
/// or NaN fields; every field here is assumed valid by the decision core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSnapshot {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub rsi: f64,
    pub ema50: f64,
    pub ema200: f64,
    pub macd: f64,
    pub atr: f64,
    pub atr_avg: f64,
    pub volume: f64,
    pub volume_avg: f64,
    pub whale_alert: bool,
    pub anomaly_label: AnomalyLabel,
    pub adx: f64,
    /// Aggregate news sentiment in [-1, 1]; 0.0 when no textual input exists.
    pub sentiment_score: f64,
    /// Next-close forecast from the ML oracle, when one is available.
    pub ml_forecast_price: Option<f64>,
    /// Number of closed bars backing the rolling statistics above.
    pub bars: usize,
}
