use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::models::{Candle, FeatureSnapshot};
use tracing::debug;

use crate::error::FeedError;
use crate::indicators::{compute_indicators, is_whale_volume};
use crate::remote::BinanceClient;
use crate::traits::{AnomalyOracle, FeatureProvider};

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub interval: String,
    /// Candles requested per snapshot.
    pub history_limit: u16,
    /// Below this many closed bars the snapshot is withheld entirely.
    pub warmup_bars: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            interval: "1h".to_string(),
            history_limit: 500,
            warmup_bars: 50,
        }
    }
}

/// Assembles feature snapshots from public Binance kline history.
///
/// Sentiment and forecast enrichment happen downstream; this provider fills
/// the technical fields and leaves sentiment neutral and the forecast empty.
pub struct BinanceFeatureProvider {
    client: BinanceClient,
    oracle: Arc<dyn AnomalyOracle>,
    config: FeedConfig,
}

impl BinanceFeatureProvider {
    pub fn new(client: BinanceClient, oracle: Arc<dyn AnomalyOracle>, config: FeedConfig) -> Self {
        Self {
            client,
            oracle,
            config,
        }
    }

    /// Pure snapshot assembly over a candle history. Withholds (returns
    /// `Ok(None)`) rather than emit a frame with unpopulated fields.
    pub fn assemble(
        symbol: &str,
        candles: &[Candle],
        oracle: &dyn AnomalyOracle,
        warmup_bars: usize,
    ) -> Result<Option<FeatureSnapshot>, FeedError> {
        if candles.len() < warmup_bars {
            debug!(
                symbol,
                bars = candles.len(),
                warmup_bars,
                "withholding snapshot during warm-up"
            );
            return Ok(None);
        }

        let Some(set) = compute_indicators(candles)? else {
            return Ok(None);
        };

        let last = candles.last().expect("history is non-empty past warm-up");
        let timestamp = DateTime::<Utc>::from_timestamp_millis(last.close_time)
            .ok_or_else(|| FeedError::Malformed(format!("close_time {}", last.close_time)))?;

        let anomaly_label = oracle.classify(last.volume, set.volume_avg, set.atr, set.atr_avg);

        Ok(Some(FeatureSnapshot {
            symbol: symbol.to_string(),
            timestamp,
            close: last.close,
            rsi: set.rsi,
            ema50: set.ema50,
            ema200: set.ema200,
            macd: set.macd,
            atr: set.atr,
            atr_avg: set.atr_avg,
            volume: last.volume,
            volume_avg: set.volume_avg,
            whale_alert: is_whale_volume(last.volume, set.volume_avg),
            anomaly_label,
            adx: set.adx,
            sentiment_score: 0.0,
            ml_forecast_price: None,
            bars: candles.len(),
        }))
    }
}

#[async_trait]
impl FeatureProvider for BinanceFeatureProvider {
    async fn latest(&self, symbol: &str) -> Result<Option<FeatureSnapshot>, FeedError> {
        let candles = self
            .client
            .klines(symbol, &self.config.interval, self.config.history_limit)
            .await?;
        Self::assemble(symbol, &candles, &*self.oracle, self.config.warmup_bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::AnomalyLabel;

    use crate::traits::MockAnomalyOracle;

    fn candle(i: usize, close: f64, volume: f64) -> Candle {
        Candle {
            open_time: i as i64 * 3_600_000,
            close_time: (i as i64 + 1) * 3_600_000 - 1,
            open: close * 0.995,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume,
        }
    }

    fn history(len: usize) -> Vec<Candle> {
        (0..len)
            .map(|i| candle(i, 100.0 + i as f64 * 0.1, 1_000.0))
            .collect()
    }

    fn normal_oracle() -> MockAnomalyOracle {
        let mut oracle = MockAnomalyOracle::new();
        oracle
            .expect_classify()
            .return_const(AnomalyLabel::Normal);
        oracle
    }

    #[test]
    fn short_history_is_withheld() {
        let oracle = normal_oracle();
        let snap =
            BinanceFeatureProvider::assemble("BTCUSDT", &history(49), &oracle, 50).unwrap();
        assert!(snap.is_none());
    }

    #[test]
    fn assembled_snapshot_is_fully_populated() {
        let oracle = normal_oracle();
        let candles = history(120);
        let snap = BinanceFeatureProvider::assemble("BTCUSDT", &candles, &oracle, 50)
            .unwrap()
            .unwrap();

        assert_eq!(snap.symbol, "BTCUSDT");
        assert_eq!(snap.bars, 120);
        assert_eq!(snap.close, candles.last().unwrap().close);
        assert_eq!(snap.volume_avg, 1_000.0);
        assert!(!snap.whale_alert);
        assert_eq!(snap.anomaly_label, AnomalyLabel::Normal);
        assert!(snap.rsi.is_finite() && snap.atr_avg > 0.0);
        assert_eq!(snap.sentiment_score, 0.0);
        assert_eq!(snap.ml_forecast_price, None);
    }

    #[test]
    fn volume_spike_raises_the_whale_flag() {
        let oracle = normal_oracle();
        let mut candles = history(120);
        let last = candles.len() - 1;
        candles[last].volume = 10_000.0;

        let snap = BinanceFeatureProvider::assemble("BTCUSDT", &candles, &oracle, 50)
            .unwrap()
            .unwrap();
        assert!(snap.whale_alert);
    }

    #[test]
    fn oracle_label_lands_in_the_snapshot() {
        let mut oracle = MockAnomalyOracle::new();
        oracle
            .expect_classify()
            .return_const(AnomalyLabel::Anomalous);

        let snap = BinanceFeatureProvider::assemble("BTCUSDT", &history(120), &oracle, 50)
            .unwrap()
            .unwrap();
        assert_eq!(snap.anomaly_label, AnomalyLabel::Anomalous);
    }
}
