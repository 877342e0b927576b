use tracing::debug;

use crate::db::LedgerDb;
use crate::error::LedgerError;
use crate::repositories::PositionsRepository;

/// Forced-exit decision. Preempts whatever the signal engine would have
/// produced for this tick and routes straight into a sell.
#[derive(Debug, Clone, PartialEq)]
pub struct ForcedExit {
    pub trader: String,
    pub symbol: String,
    pub price: f64,
    pub high_water_mark: f64,
    pub stop_price: f64,
}

/// Tracks the highest price observed per open position and triggers a sell
/// once price retraces a fixed percentage from that peak.
#[derive(Clone)]
pub struct TrailingStopMonitor {
    db: LedgerDb,
    trail_pct: f64,
}

impl TrailingStopMonitor {
    pub fn new(db: LedgerDb, trail_pct: f64) -> Self {
        Self { db, trail_pct }
    }

    /// Raises the persisted high-water mark to `current_price` if it is a
    /// new peak. No-op when the key is flat; never lowers the mark.
    pub async fn update_high_water_mark(
        &self,
        symbol: &str,
        trader: &str,
        current_price: f64,
    ) -> Result<(), LedgerError> {
        let mut conn = self.db.pool().acquire().await?;
        PositionsRepository::raise_high_water_mark(&mut conn, trader, symbol, current_price)
            .await?;
        Ok(())
    }

    /// Returns a `ForcedExit` when `current_price` has fallen more than the
    /// configured trail percentage below the high-water mark.
    pub async fn check_trailing_stop(
        &self,
        symbol: &str,
        trader: &str,
        current_price: f64,
    ) -> Result<Option<ForcedExit>, LedgerError> {
        let mut conn = self.db.pool().acquire().await?;
        let position = match PositionsRepository::fetch(&mut conn, trader, symbol).await? {
            Some(row) => row.into_position()?,
            None => return Ok(None),
        };

        let stop_price = position.high_water_mark * (1.0 - self.trail_pct);
        if current_price < stop_price {
            debug!(
                trader,
                symbol,
                current_price,
                high_water_mark = position.high_water_mark,
                stop_price,
                "trailing stop hit"
            );
            return Ok(Some(ForcedExit {
                trader: trader.to_string(),
                symbol: symbol.to_string(),
                price: current_price,
                high_water_mark: position.high_water_mark,
                stop_price,
            }));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{LedgerConfig, PositionLedger};

    async fn setup() -> (PositionLedger, TrailingStopMonitor) {
        let db = LedgerDb::open_in_memory().await.unwrap();
        let ledger = PositionLedger::open(db.clone(), LedgerConfig::default())
            .await
            .unwrap();
        let monitor = TrailingStopMonitor::new(db, 0.03);
        (ledger, monitor)
    }

    #[tokio::test]
    async fn high_water_mark_rises_and_never_falls() {
        let (ledger, monitor) = setup().await;
        ledger
            .execute_buy("BTC-USD", 100.0, "bot", Some(1_000.0))
            .await
            .unwrap();

        monitor
            .update_high_water_mark("BTC-USD", "bot", 150.0)
            .await
            .unwrap();
        let pos = ledger.position("bot", "BTC-USD").await.unwrap().unwrap();
        assert_eq!(pos.high_water_mark, 150.0);

        monitor
            .update_high_water_mark("BTC-USD", "bot", 120.0)
            .await
            .unwrap();
        let pos = ledger.position("bot", "BTC-USD").await.unwrap().unwrap();
        assert_eq!(pos.high_water_mark, 150.0);
    }

    #[tokio::test]
    async fn update_on_flat_key_is_a_noop() {
        let (_ledger, monitor) = setup().await;
        monitor
            .update_high_water_mark("BTC-USD", "bot", 150.0)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn three_percent_retrace_from_peak_forces_exit() {
        let (ledger, monitor) = setup().await;
        ledger
            .execute_buy("BTC-USD", 100.0, "bot", Some(1_000.0))
            .await
            .unwrap();
        monitor
            .update_high_water_mark("BTC-USD", "bot", 150.0)
            .await
            .unwrap();

        // Stop sits at 145.5: 144 trips it, 146 does not.
        let exit = monitor
            .check_trailing_stop("BTC-USD", "bot", 144.0)
            .await
            .unwrap()
            .expect("expected forced exit below the stop");
        assert_eq!(exit.high_water_mark, 150.0);
        assert!((exit.stop_price - 145.5).abs() < 1e-9);

        assert!(
            monitor
                .check_trailing_stop("BTC-USD", "bot", 146.0)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn flat_key_never_forces_exit() {
        let (_ledger, monitor) = setup().await;
        assert!(
            monitor
                .check_trailing_stop("BTC-USD", "bot", 1.0)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn forced_exit_routes_into_a_profitable_sell() {
        let (ledger, monitor) = setup().await;
        ledger
            .execute_buy("BTC-USD", 100.0, "bot", Some(1_000.0))
            .await
            .unwrap();
        monitor
            .update_high_water_mark("BTC-USD", "bot", 150.0)
            .await
            .unwrap();

        let exit = monitor
            .check_trailing_stop("BTC-USD", "bot", 144.0)
            .await
            .unwrap()
            .unwrap();
        let record = ledger
            .execute_sell(&exit.symbol, exit.price, &exit.trader)
            .await
            .unwrap();
        // 10 shares bought at 100, stopped out at 144.
        assert_eq!(record.profit, Some(440.0));
    }
}
