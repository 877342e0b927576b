use common::models::Candle;
use serde_json::Value;

use crate::error::FeedError;

/// One kline row as Binance returns it: a heterogeneous JSON array
/// `[open_time, open, high, low, close, volume, close_time, ...]` with the
/// prices encoded as strings.
pub type RawKline = Vec<Value>;

pub fn parse_kline(raw: &RawKline) -> Result<Candle, FeedError> {
    if raw.len() < 7 {
        return Err(FeedError::Malformed(format!(
            "kline row has {} fields, expected at least 7",
            raw.len()
        )));
    }

    Ok(Candle {
        open_time: field_i64(&raw[0], "open_time")?,
        open: field_f64(&raw[1], "open")?,
        high: field_f64(&raw[2], "high")?,
        low: field_f64(&raw[3], "low")?,
        close: field_f64(&raw[4], "close")?,
        volume: field_f64(&raw[5], "volume")?,
        close_time: field_i64(&raw[6], "close_time")?,
    })
}

fn field_i64(value: &Value, name: &str) -> Result<i64, FeedError> {
    value
        .as_i64()
        .ok_or_else(|| FeedError::Malformed(format!("kline field {name}: {value}")))
}

fn field_f64(value: &Value, name: &str) -> Result<f64, FeedError> {
    value
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| FeedError::Malformed(format!("kline field {name}: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_a_binance_kline_row() {
        let raw: RawKline = vec![
            json!(1700000000000i64),
            json!("42000.10"),
            json!("42500.00"),
            json!("41800.50"),
            json!("42300.00"),
            json!("1234.5"),
            json!(1700003599999i64),
            json!("52000000.0"),
            json!(9000),
        ];
        let candle = parse_kline(&raw).unwrap();
        assert_eq!(candle.open_time, 1700000000000);
        assert_eq!(candle.open, 42000.10);
        assert_eq!(candle.close, 42300.00);
        assert_eq!(candle.volume, 1234.5);
        assert_eq!(candle.close_time, 1700003599999);
    }

    #[test]
    fn short_row_is_malformed() {
        let raw: RawKline = vec![json!(1), json!("2")];
        assert!(matches!(parse_kline(&raw), Err(FeedError::Malformed(_))));
    }

    #[test]
    fn non_numeric_price_is_malformed() {
        let raw: RawKline = vec![
            json!(1i64),
            json!("abc"),
            json!("1"),
            json!("1"),
            json!("1"),
            json!("1"),
            json!(2i64),
        ];
        assert!(matches!(parse_kline(&raw), Err(FeedError::Malformed(_))));
    }
}
