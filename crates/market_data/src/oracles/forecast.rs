use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use common::models::FeatureSnapshot;
use tract_onnx::prelude::*;
use tracing::{error, info, warn};

use crate::error::FeedError;
use crate::traits::ForecastProvider;

type RunnableModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX-backed next-close forecaster.
///
/// Input is the latest feature row [rsi, ema50, ema200, macd, atr, volume],
/// output the predicted next close. Without a model file the forecaster
/// stays up but never produces a forecast, which the combiner treats as an
/// unconfirmed entry.
#[derive(Clone)]
pub struct OnnxForecaster {
    model: Option<Arc<RunnableModel>>,
}

impl OnnxForecaster {
    pub fn new(model_path: &str) -> Self {
        let path = Path::new(model_path);
        let model = if path.exists() {
            info!("Loading forecast model from {:?}", path);
            match Self::load_model(model_path) {
                Ok(plan) => Some(Arc::new(plan)),
                Err(e) => {
                    error!("Failed to load forecast model: {}", e);
                    None
                }
            }
        } else {
            warn!(
                "Forecast model not found at {:?}. Entries will not get forecast confirmation.",
                path
            );
            None
        };

        Self { model }
    }

    fn load_model(path: &str) -> TractResult<RunnableModel> {
        let model = tract_onnx::onnx()
            .model_for_path(path)?
            .into_optimized()?
            .into_runnable()?;
        Ok(model)
    }

    fn predict(&self, features: &[f32]) -> Result<Option<f64>, FeedError> {
        let Some(model) = &self.model else {
            return Ok(None);
        };

        let tensor = tract_ndarray::Array::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| FeedError::Inference(e.to_string()))?
            .into_tensor();

        let result = model
            .run(tvec!(tensor.into()))
            .map_err(|e| FeedError::Inference(e.to_string()))?;

        let output = result[0]
            .to_array_view::<f32>()
            .map_err(|e| FeedError::Inference(e.to_string()))?;

        match output.iter().next() {
            Some(&prediction) if prediction.is_finite() => Ok(Some(prediction as f64)),
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl ForecastProvider for OnnxForecaster {
    async fn forecast_price(&self, snapshot: &FeatureSnapshot) -> Result<Option<f64>, FeedError> {
        let features = [
            snapshot.rsi as f32,
            snapshot.ema50 as f32,
            snapshot.ema200 as f32,
            snapshot.macd as f32,
            snapshot.atr as f32,
            snapshot.volume as f32,
        ];
        self.predict(&features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::models::AnomalyLabel;

    fn snapshot() -> FeatureSnapshot {
        FeatureSnapshot {
            symbol: "BTCUSDT".to_string(),
            timestamp: Utc::now(),
            close: 100.0,
            rsi: 50.0,
            ema50: 100.0,
            ema200: 100.0,
            macd: 0.0,
            atr: 1.0,
            atr_avg: 1.0,
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

    #[tokio::test]
    async fn missing_model_yields_no_forecast() {
        let forecaster = OnnxForecaster::new("/nonexistent/model.onnx");
        assert_eq!(forecaster.forecast_price(&snapshot()).await.unwrap(), None);
    }
}
