use thiserror::Error;

/// Failures owned by the market data collaborators. These never cross into
/// the decision core: the scanner logs them and skips the symbol for the
/// tick.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed market data: {0}")]
    Malformed(String),

    #[error("indicator computation failed: {0}")]
    Indicator(String),

    #[error("model inference failed: {0}")]
    Inference(String),
}
