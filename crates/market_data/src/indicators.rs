use common::models::Candle;
use ta::indicators::{
    AverageTrueRange, ExponentialMovingAverage, MovingAverageConvergenceDivergence,
    RelativeStrengthIndex,
};
use ta::{DataItem, Next};

use crate::error::FeedError;

/// Rolling window used for the ATR and volume averages.
pub const ROLLING_WINDOW: usize = 20;

/// Volume above this multiple of its rolling average is flagged as whale
/// activity.
pub const WHALE_VOLUME_FACTOR: f64 = 3.0;

/// Final indicator values over a candle history, ready for snapshot
/// assembly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSet {
    pub rsi: f64,
    pub ema50: f64,
    pub ema200: f64,
    pub macd: f64,
    pub atr: f64,
    pub atr_avg: f64,
    pub volume_avg: f64,
    pub adx: f64,
}

/// Mean of the trailing `window` values. Pure over the slice it is given;
/// `None` until the window is full.
pub fn trailing_mean(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }
    let tail = &values[values.len() - window..];
    Some(tail.iter().sum::<f64>() / window as f64)
}

pub fn is_whale_volume(volume: f64, volume_avg: f64) -> bool {
    volume > WHALE_VOLUME_FACTOR * volume_avg
}

/// Computes the full indicator set over a candle history, or `None` when the
/// history is too short for the rolling statistics to be meaningful.
pub fn compute_indicators(candles: &[Candle]) -> Result<Option<IndicatorSet>, FeedError> {
    // Fixed standard periods; constructors only fail on a zero period.
    let mut rsi = RelativeStrengthIndex::new(14).unwrap();
    let mut ema50 = ExponentialMovingAverage::new(50).unwrap();
    let mut ema200 = ExponentialMovingAverage::new(200).unwrap();
    let mut macd = MovingAverageConvergenceDivergence::new(12, 26, 9).unwrap();
    let mut atr = AverageTrueRange::new(14).unwrap();

    let mut last_rsi = 0.0;
    let mut last_ema50 = 0.0;
    let mut last_ema200 = 0.0;
    let mut last_macd = 0.0;
    let mut atr_series = Vec::with_capacity(candles.len());
    let mut volumes = Vec::with_capacity(candles.len());

    for candle in candles {
        if !candle.close.is_finite() || !candle.volume.is_finite() {
            return Err(FeedError::Malformed(format!(
                "non-finite candle at open_time {}",
                candle.open_time
            )));
        }
        let item = DataItem::builder()
            .open(candle.open)
            .high(candle.high)
            .low(candle.low)
            .close(candle.close)
            .volume(candle.volume)
            .build()
            .map_err(|e| FeedError::Malformed(e.to_string()))?;

        last_rsi = rsi.next(candle.close);
        last_ema50 = ema50.next(candle.close);
        last_ema200 = ema200.next(candle.close);
        last_macd = macd.next(candle.close).histogram;
        atr_series.push(atr.next(&item));
        volumes.push(candle.volume);
    }

    let (Some(atr_avg), Some(volume_avg)) = (
        trailing_mean(&atr_series, ROLLING_WINDOW),
        trailing_mean(&volumes, ROLLING_WINDOW),
    ) else {
        return Ok(None);
    };
    let Some(adx) = average_directional_index(candles, 14) else {
        return Ok(None);
    };

    Ok(Some(IndicatorSet {
        rsi: last_rsi,
        ema50: last_ema50,
        ema200: last_ema200,
        macd: last_macd,
        atr: *atr_series.last().expect("candles is non-empty here"),
        atr_avg,
        volume_avg,
        adx,
    }))
}

/// Wilder's ADX over a candle history. Pure over the slice; `None` when
/// fewer than `2 * period + 1` candles are available.
pub fn average_directional_index(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < 2 * period + 1 {
        return None;
    }

    let mut true_ranges = Vec::with_capacity(candles.len() - 1);
    let mut plus_dm = Vec::with_capacity(candles.len() - 1);
    let mut minus_dm = Vec::with_capacity(candles.len() - 1);

    for pair in candles.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        let tr = (cur.high - cur.low)
            .max((cur.high - prev.close).abs())
            .max((cur.low - prev.close).abs());
        true_ranges.push(tr);

        let up_move = cur.high - prev.high;
        let down_move = prev.low - cur.low;
        plus_dm.push(if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        });
        minus_dm.push(if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        });
    }

    let tr_smooth = wilder_smooth(&true_ranges, period);
    let plus_smooth = wilder_smooth(&plus_dm, period);
    let minus_smooth = wilder_smooth(&minus_dm, period);

    let mut dx_series = Vec::with_capacity(tr_smooth.len());
    for i in 0..tr_smooth.len() {
        if tr_smooth[i] == 0.0 {
            dx_series.push(0.0);
            continue;
        }
        let plus_di = 100.0 * plus_smooth[i] / tr_smooth[i];
        let minus_di = 100.0 * minus_smooth[i] / tr_smooth[i];
        let di_sum = plus_di + minus_di;
        dx_series.push(if di_sum == 0.0 {
            0.0
        } else {
            100.0 * (plus_di - minus_di).abs() / di_sum
        });
    }

    if dx_series.len() < period {
        return None;
    }
    let mut adx = dx_series[..period].iter().sum::<f64>() / period as f64;
    for &dx in &dx_series[period..] {
        adx = (adx * (period as f64 - 1.0) + dx) / period as f64;
    }
    Some(adx)
}

/// Wilder running sums: seed with the first `period` values, then
/// `acc - acc/period + x` for the rest.
fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len() - period + 1);
    let mut acc: f64 = values[..period].iter().sum();
    out.push(acc);
    for &value in &values[period..] {
        acc = acc - acc / period as f64 + value;
        out.push(acc);
    }
    out
}
