use common::models::Signal;

/// Minimum forecast edge, in percent of the current close, for a Buy to
/// survive forecast confirmation.
pub const MIN_FORECAST_EDGE_PCT: f64 = 0.5;

/// Forecast confirmation step. Sits outside the signal engine proper: the
/// engine emits the base signal, the scanner applies this combiner only when
/// a forecast provider is configured.
///
/// A Buy is kept only when the forecast predicts a move greater than
/// +0.5% from the current close; a missing or weaker forecast downgrades it
/// to Hold. Exits and holds pass through untouched.
pub fn confirm_with_forecast(signal: Signal, close: f64, forecast_price: Option<f64>) -> Signal {
    if signal != Signal::Buy {
        return signal;
    }

    match forecast_price {
        Some(forecast) if close > 0.0 => {
            let edge_pct = (forecast - close) / close * 100.0;
            if edge_pct > MIN_FORECAST_EDGE_PCT {
                Signal::Buy
            } else {
                Signal::Hold
            }
        }
        _ => Signal::Hold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::SellReason;

    #[test]
    fn strong_forecast_confirms_buy() {
        // +0.6% edge on a 100.0 close.
        assert_eq!(
            confirm_with_forecast(Signal::Buy, 100.0, Some(100.6 + 1e-9)),
            Signal::Buy
        );
    }

    #[test]
    fn weak_forecast_downgrades_buy() {
        assert_eq!(
            confirm_with_forecast(Signal::Buy, 100.0, Some(100.4)),
            Signal::Hold
        );
    }

    #[test]
    fn edge_exactly_at_threshold_is_not_enough() {
        assert_eq!(
            confirm_with_forecast(Signal::Buy, 100.0, Some(100.5)),
            Signal::Hold
        );
    }

    #[test]
    fn missing_forecast_blocks_entry() {
        assert_eq!(confirm_with_forecast(Signal::Buy, 100.0, None), Signal::Hold);
    }

    #[test]
    fn exits_pass_through_untouched() {
        assert_eq!(
            confirm_with_forecast(Signal::PanicSell, 100.0, Some(50.0)),
            Signal::PanicSell
        );
        assert_eq!(
            confirm_with_forecast(Signal::Sell(SellReason::TrendReversal), 100.0, None),
            Signal::Sell(SellReason::TrendReversal)
        );
        assert_eq!(
            confirm_with_forecast(Signal::Hold, 100.0, Some(200.0)),
            Signal::Hold
        );
    }
}
