pub mod anomaly;
pub mod forecast;

pub use anomaly::ThresholdAnomalyOracle;
pub use forecast::OnnxForecaster;
