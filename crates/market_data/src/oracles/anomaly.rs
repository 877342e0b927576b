use common::models::AnomalyLabel;

use crate::traits::AnomalyOracle;

/// Default anomaly oracle: flags a frame whose volume or volatility sits far
/// above its rolling average. The production system trained an unsupervised
/// outlier model for this; any replacement only has to honor the
/// `AnomalyOracle` contract.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdAnomalyOracle {
    pub volume_factor: f64,
    pub atr_factor: f64,
}

impl Default for ThresholdAnomalyOracle {
    fn default() -> Self {
        Self {
            volume_factor: 4.0,
            atr_factor: 2.0,
        }
    }
}

impl AnomalyOracle for ThresholdAnomalyOracle {
    fn classify(&self, volume: f64, volume_avg: f64, atr: f64, atr_avg: f64) -> AnomalyLabel {
        if volume > self.volume_factor * volume_avg || atr > self.atr_factor * atr_avg {
            AnomalyLabel::Anomalous
        } else {
            AnomalyLabel::Normal
        }
    }
}
