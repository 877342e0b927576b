use common::models::Candle;
use reqwest::Client;
use std::env;
use tracing::debug;

use crate::error::FeedError;
use crate::remote::kline_response::{RawKline, parse_kline};

const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Thin client for the public (unsigned) Binance REST endpoints.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
}

impl BinanceClient {
    pub fn new() -> Self {
        let base_url = env::var("BINANCE_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(base_url)
    }

    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// Fetches up to `limit` most recent closed candles, oldest first.
    pub async fn klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: u16,
    ) -> Result<Vec<Candle>, FeedError> {
        let url = format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit={}",
            self.base_url,
            symbol.to_uppercase(),
            interval,
            limit
        );
        debug!(symbol, interval, limit, "fetching klines");

        let rows: Vec<RawKline> = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        rows.iter().map(parse_kline).collect()
    }
}

impl Default for BinanceClient {
    fn default() -> Self {
        Self::new()
    }
}
