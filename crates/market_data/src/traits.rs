use async_trait::async_trait;
use common::models::{AnomalyLabel, FeatureSnapshot};

use crate::error::FeedError;

/// Supplies one fully populated feature snapshot per symbol per tick.
///
/// Implementations must withhold the snapshot (return `Ok(None)`) when the
/// available history is shorter than the warm-up bar count or any field
/// cannot be populated; partial or NaN frames are never emitted.
#[async_trait]
pub trait FeatureProvider: Send + Sync {
    async fn latest(&self, symbol: &str) -> Result<Option<FeatureSnapshot>, FeedError>;
}

/// Aggregate news sentiment in [-1, 1]; 0.0 when no textual input exists.
#[async_trait]
pub trait SentimentProvider: Send + Sync {
    async fn score(&self, symbol: &str) -> Result<f64, FeedError>;
}

/// Opaque next-close forecaster. `None` means no forecast is available.
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    async fn forecast_price(&self, snapshot: &FeatureSnapshot) -> Result<Option<f64>, FeedError>;
}

/// Opaque outlier detector over a single feature frame. The model behind it
/// is independently replaceable; only the label crosses this boundary.
#[cfg_attr(test, mockall::automock)]
pub trait AnomalyOracle: Send + Sync {
    fn classify(&self, volume: f64, volume_avg: f64, atr: f64, atr_avg: f64) -> AnomalyLabel;
}

/// Default sentiment collaborator: always neutral. The NLP pipeline of the
/// production system runs out of process and feeds its score in through the
/// same trait.
pub struct NeutralSentiment;

#[async_trait]
impl SentimentProvider for NeutralSentiment {
    async fn score(&self, _symbol: &str) -> Result<f64, FeedError> {
        Ok(0.0)
    }
}
