pub mod error;
pub mod indicators;
pub mod oracles;
pub mod remote;
pub mod services;
pub mod traits;

pub use error::FeedError;
pub use traits::{
    AnomalyOracle, FeatureProvider, ForecastProvider, NeutralSentiment, SentimentProvider,
};
