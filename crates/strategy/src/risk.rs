use common::models::{AnomalyLabel, FeatureSnapshot};

/// Composite 0-100 crash risk score.
///
/// Additive over independent warning conditions, capped at 100. Deterministic
/// and side-effect free; callers must only pass warmed-up snapshots (the
/// rolling ATR average must be populated, see the signal engine's gate).
pub fn crash_risk_score(snapshot: &FeatureSnapshot) -> u8 {
    let mut score: u32 = 0;

    // Overbought price action.
    if snapshot.rsi > 70.0 {
        score += 40;
    } else if snapshot.rsi > 60.0 {
        score += 20;
    }

    // Volatility above its rolling average.
    if snapshot.atr > snapshot.atr_avg {
        score += 20;
    }

    // The external outlier detector flagged this frame.
    if snapshot.anomaly_label == AnomalyLabel::Anomalous {
        score += 30;
    }

    // Abnormal volume.
    if snapshot.whale_alert {
        score += 10;
    }

    score.min(100) as u8
}
