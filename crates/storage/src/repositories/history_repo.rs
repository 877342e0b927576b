use chrono::{DateTime, Utc};
use common::models::{TradeAction, TradeRecord};
use sqlx::SqliteConnection;

use crate::error::LedgerError;

#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
    time: DateTime<Utc>,
    trader: String,
    symbol: String,
    action: String,
    price: f64,
    shares: f64,
    value: f64,
    profit: Option<f64>,
}

impl HistoryRow {
    fn into_record(self) -> Result<TradeRecord, LedgerError> {
        let action = match self.action.as_str() {
            "BUY" => TradeAction::Buy,
            "SELL" => TradeAction::Sell,
            other => {
                return Err(LedgerError::MalformedRecord(format!(
                    "trade_history: unknown action {:?}",
                    other
                )));
            }
        };
        Ok(TradeRecord {
            time: self.time,
            trader: self.trader,
            symbol: self.symbol,
            action,
            price: self.price,
            shares: self.shares,
            value: self.value,
            profit: self.profit,
        })
    }
}

/// Append-only trade history.
pub struct HistoryRepository;

impl HistoryRepository {
    pub async fn append(
        conn: &mut SqliteConnection,
        record: &TradeRecord,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
                INSERT INTO trade_history (time, trader, symbol, action, price, shares, value, profit)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.time)
        .bind(&record.trader)
        .bind(&record.symbol)
        .bind(record.action.as_str())
        .bind(record.price)
        .bind(record.shares)
        .bind(record.value)
        .bind(record.profit)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Most recent records first.
    pub async fn recent(
        conn: &mut SqliteConnection,
        limit: i64,
    ) -> Result<Vec<TradeRecord>, LedgerError> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
                SELECT time, trader, symbol, action, price, shares, value, profit
                FROM trade_history
                ORDER BY id DESC
                LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&mut *conn)
        .await?;

        rows.into_iter().map(HistoryRow::into_record).collect()
    }
}
