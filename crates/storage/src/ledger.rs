use chrono::Utc;
use common::models::{PortfolioStatus, Position, TradeAction, TradeRecord};
use tracing::info;

use crate::db::LedgerDb;
use crate::error::LedgerError;
use crate::repositories::{HistoryRepository, PortfolioRepository, PositionsRepository};

#[derive(Debug, Clone, Copy)]
pub struct LedgerConfig {
    pub starting_balance: f64,
    /// Fraction of the cash balance committed per buy when no explicit
    /// amount is given.
    pub allocation: f64,
    pub min_trade_amount: f64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            starting_balance: 10_000.0,
            allocation: 0.20,
            min_trade_amount: 10.0,
        }
    }
}

/// Transactional Flat/Open state machine over the durable portfolio.
///
/// Every mutation is a single SQLite transaction: balance change, position
/// create/delete and history append commit together or not at all. Business
/// rejections come back as `LedgerError` values with state untouched.
#[derive(Clone)]
pub struct PositionLedger {
    db: LedgerDb,
    config: LedgerConfig,
}

impl PositionLedger {
    /// Wraps an opened database, seeding the cash balance on first use.
    pub async fn open(db: LedgerDb, config: LedgerConfig) -> Result<Self, LedgerError> {
        let mut conn = db.pool().acquire().await?;
        PortfolioRepository::seed_if_missing(&mut conn, config.starting_balance).await?;
        Ok(Self { db, config })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Flat -> Open. Debits cash, creates the position at `price` with the
    /// high-water mark primed to the entry, and appends the buy record.
    pub async fn execute_buy(
        &self,
        symbol: &str,
        price: f64,
        trader: &str,
        amount: Option<f64>,
    ) -> Result<TradeRecord, LedgerError> {
        if !price.is_finite() || price <= 0.0 {
            return Err(LedgerError::InvalidPrice { price });
        }

        let mut tx = self.db.pool().begin().await?;

        if PositionsRepository::fetch(&mut tx, trader, symbol)
            .await?
            .is_some()
        {
            return Err(LedgerError::DuplicatePosition);
        }

        let balance = PortfolioRepository::fetch_balance(&mut tx).await?;
        let trade_amount = amount.unwrap_or(balance * self.config.allocation);

        if !trade_amount.is_finite() || trade_amount < self.config.min_trade_amount {
            return Err(LedgerError::BelowMinimumSize {
                amount: trade_amount,
                minimum: self.config.min_trade_amount,
            });
        }
        if trade_amount > balance {
            return Err(LedgerError::InsufficientFunds {
                required: trade_amount,
                available: balance,
            });
        }

        let now = Utc::now();
        let position = Position {
            trader: trader.to_string(),
            symbol: symbol.to_string(),
            entry_price: price,
            shares: trade_amount / price,
            high_water_mark: price,
            opened_at: now,
        };
        let record = TradeRecord {
            time: now,
            trader: trader.to_string(),
            symbol: symbol.to_string(),
            action: TradeAction::Buy,
            price,
            shares: position.shares,
            value: trade_amount,
            profit: None,
        };

        PortfolioRepository::set_balance(&mut tx, balance - trade_amount).await?;
        PositionsRepository::insert(&mut tx, &position).await?;
        HistoryRepository::append(&mut tx, &record).await?;
        tx.commit().await?;

        info!(
            trader,
            symbol,
            price,
            shares = record.shares,
            value = record.value,
            "buy executed"
        );
        Ok(record)
    }

    /// Open -> Flat. Credits the sale value, deletes the position and
    /// appends the sell record with realized profit.
    pub async fn execute_sell(
        &self,
        symbol: &str,
        price: f64,
        trader: &str,
    ) -> Result<TradeRecord, LedgerError> {
        let mut tx = self.db.pool().begin().await?;

        let position = PositionsRepository::fetch(&mut tx, trader, symbol)
            .await?
            .ok_or(LedgerError::NoPosition)?
            .into_position()?;

        let balance = PortfolioRepository::fetch_balance(&mut tx).await?;
        let sale_value = position.shares * price;
        let profit = sale_value - position.shares * position.entry_price;

        let record = TradeRecord {
            time: Utc::now(),
            trader: trader.to_string(),
            symbol: symbol.to_string(),
            action: TradeAction::Sell,
            price,
            shares: position.shares,
            value: sale_value,
            profit: Some(profit),
        };

        PortfolioRepository::set_balance(&mut tx, balance + sale_value).await?;
        PositionsRepository::delete(&mut tx, trader, symbol).await?;
        HistoryRepository::append(&mut tx, &record).await?;
        tx.commit().await?;

        info!(trader, symbol, price, profit, "sell executed");
        Ok(record)
    }

    pub async fn balance(&self) -> Result<f64, LedgerError> {
        let mut conn = self.db.pool().acquire().await?;
        Ok(PortfolioRepository::fetch_balance(&mut conn).await?)
    }

    pub async fn position(
        &self,
        trader: &str,
        symbol: &str,
    ) -> Result<Option<Position>, LedgerError> {
        let mut conn = self.db.pool().acquire().await?;
        match PositionsRepository::fetch(&mut conn, trader, symbol).await? {
            Some(row) => Ok(Some(row.into_position()?)),
            None => Ok(None),
        }
    }

    /// Read model for dashboards and notifiers. Never observes a partial
    /// mutation: mutations commit as one unit on the single write path.
    pub async fn status(&self, history_limit: i64) -> Result<PortfolioStatus, LedgerError> {
        let mut conn = self.db.pool().acquire().await?;
        let balance = PortfolioRepository::fetch_balance(&mut conn).await?;
        let positions = PositionsRepository::list(&mut conn)
            .await?
            .into_iter()
            .map(|row| row.into_position())
            .collect::<Result<Vec<_>, _>>()?;
        let history = HistoryRepository::recent(&mut conn, history_limit).await?;
        Ok(PortfolioStatus {
            balance,
            positions,
            history,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn ledger_with_balance(balance: f64) -> PositionLedger {
        let db = LedgerDb::open_in_memory().await.unwrap();
        let config = LedgerConfig {
            starting_balance: balance,
            ..LedgerConfig::default()
        };
        PositionLedger::open(db, config).await.unwrap()
    }

    #[tokio::test]
    async fn buy_then_sell_round_trip_math() {
        let ledger = ledger_with_balance(5_000.0).await;

        let buy = ledger
            .execute_buy("BTC-USD", 100.0, "bot", Some(1_000.0))
            .await
            .unwrap();
        assert_eq!(buy.shares, 10.0);
        assert_eq!(buy.value, 1_000.0);
        assert_eq!(ledger.balance().await.unwrap(), 4_000.0);

        let pos = ledger.position("bot", "BTC-USD").await.unwrap().unwrap();
        assert_eq!(pos.entry_price, 100.0);
        assert_eq!(pos.high_water_mark, 100.0);

        let sell = ledger.execute_sell("BTC-USD", 110.0, "bot").await.unwrap();
        assert_eq!(sell.value, 1_100.0);
        assert_eq!(sell.profit, Some(100.0));

        // Pre-buy balance plus the realized profit.
        assert_eq!(ledger.balance().await.unwrap(), 5_100.0);
        assert!(ledger.position("bot", "BTC-USD").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn default_allocation_is_twenty_percent_of_cash() {
        let ledger = ledger_with_balance(1_000.0).await;
        let buy = ledger
            .execute_buy("ETH-USD", 50.0, "bot", None)
            .await
            .unwrap();
        assert_eq!(buy.value, 200.0);
        assert_eq!(buy.shares, 4.0);
        assert_eq!(ledger.balance().await.unwrap(), 800.0);
    }

    #[tokio::test]
    async fn duplicate_buy_is_rejected_and_state_unchanged() {
        let ledger = ledger_with_balance(5_000.0).await;
        ledger
            .execute_buy("BTC-USD", 100.0, "bot", Some(1_000.0))
            .await
            .unwrap();
        let after_first = ledger.balance().await.unwrap();

        let err = ledger
            .execute_buy("BTC-USD", 120.0, "bot", Some(1_000.0))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::DuplicatePosition));

        assert_eq!(ledger.balance().await.unwrap(), after_first);
        let pos = ledger.position("bot", "BTC-USD").await.unwrap().unwrap();
        assert_eq!(pos.entry_price, 100.0);
    }

    #[tokio::test]
    async fn same_symbol_is_independent_per_trader() {
        let ledger = ledger_with_balance(5_000.0).await;
        ledger
            .execute_buy("BTC-USD", 100.0, "bot", Some(500.0))
            .await
            .unwrap();
        ledger
            .execute_buy("BTC-USD", 100.0, "scalper", Some(500.0))
            .await
            .unwrap();
        assert_eq!(ledger.balance().await.unwrap(), 4_000.0);
    }

    #[tokio::test]
    async fn below_minimum_size_is_rejected() {
        let ledger = ledger_with_balance(1_000.0).await;
        let err = ledger
            .execute_buy("BTC-USD", 100.0, "bot", Some(5.0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::BelowMinimumSize { amount, .. } if amount == 5.0
        ));
        assert_eq!(ledger.balance().await.unwrap(), 1_000.0);
    }

    #[tokio::test]
    async fn tiny_balance_cannot_open_default_sized_position() {
        // 20% of $40 is below the $10 floor.
        let ledger = ledger_with_balance(40.0).await;
        let err = ledger
            .execute_buy("BTC-USD", 1.0, "bot", None)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::BelowMinimumSize { .. }));
    }

    #[tokio::test]
    async fn insufficient_funds_is_rejected() {
        let ledger = ledger_with_balance(100.0).await;
        let err = ledger
            .execute_buy("BTC-USD", 10.0, "bot", Some(500.0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientFunds { required, available }
                if required == 500.0 && available == 100.0
        ));
        assert_eq!(ledger.balance().await.unwrap(), 100.0);
    }

    #[tokio::test]
    async fn non_positive_price_is_rejected() {
        let ledger = ledger_with_balance(1_000.0).await;
        for price in [0.0, -10.0, f64::NAN] {
            let err = ledger
                .execute_buy("BTC-USD", price, "bot", Some(100.0))
                .await
                .unwrap_err();
            assert!(matches!(err, LedgerError::InvalidPrice { .. }));
        }
    }

    #[tokio::test]
    async fn sell_without_position_is_rejected() {
        let ledger = ledger_with_balance(1_000.0).await;
        let err = ledger
            .execute_sell("BTC-USD", 100.0, "bot")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NoPosition));
        assert_eq!(ledger.balance().await.unwrap(), 1_000.0);
    }

    #[tokio::test]
    async fn status_reflects_committed_state() {
        let ledger = ledger_with_balance(2_000.0).await;
        ledger
            .execute_buy("BTC-USD", 100.0, "bot", Some(400.0))
            .await
            .unwrap();
        ledger
            .execute_buy("ETH-USD", 20.0, "bot", Some(400.0))
            .await
            .unwrap();
        ledger.execute_sell("ETH-USD", 25.0, "bot").await.unwrap();

        let status = ledger.status(20).await.unwrap();
        assert_eq!(status.balance, 2_000.0 - 800.0 + 500.0);
        assert_eq!(status.positions.len(), 1);
        assert_eq!(status.positions[0].symbol, "BTC-USD");
        assert_eq!(status.history.len(), 3);
        // Most recent first.
        assert_eq!(status.history[0].action, TradeAction::Sell);
        assert_eq!(status.history[0].profit, Some(100.0));
    }

    #[tokio::test]
    async fn malformed_persisted_position_is_rejected() {
        let ledger = ledger_with_balance(1_000.0).await;
        sqlx::query(
            "INSERT INTO positions (trader, symbol, entry_price, shares, high_water_mark, opened_at)
             VALUES ('bot', 'BAD-USD', -1.0, 2.0, 5.0, '2026-01-01T00:00:00Z')",
        )
        .execute(ledger.db.pool())
        .await
        .unwrap();

        let err = ledger.position("bot", "BAD-USD").await.unwrap_err();
        assert!(matches!(err, LedgerError::MalformedRecord(_)));
    }

    #[tokio::test]
    async fn concurrent_buys_for_one_key_succeed_exactly_once() {
        let ledger = Arc::new(ledger_with_balance(1_000.0).await);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger.execute_buy("BTC-USD", 100.0, "bot", Some(900.0)).await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(LedgerError::DuplicatePosition)
                | Err(LedgerError::InsufficientFunds { .. }) => {}
                Err(other) => panic!("unexpected rejection: {other}"),
            }
        }

        assert_eq!(successes, 1);
        // Cash was debited exactly once.
        assert_eq!(ledger.balance().await.unwrap(), 100.0);
    }
}
