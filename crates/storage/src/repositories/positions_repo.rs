use chrono::{DateTime, Utc};
use common::models::Position;
use sqlx::SqliteConnection;

use crate::error::LedgerError;

#[derive(Debug, sqlx::FromRow)]
pub struct PositionRow {
    pub trader: String,
    pub symbol: String,
    pub entry_price: f64,
    pub shares: f64,
    pub high_water_mark: f64,
    pub opened_at: DateTime<Utc>,
}

impl PositionRow {
    /// Schema validation at the persistence boundary: malformed rows are
    /// rejected, never silently defaulted.
    pub fn into_position(self) -> Result<Position, LedgerError> {
        if !self.entry_price.is_finite() || self.entry_price <= 0.0 {
            return Err(LedgerError::MalformedRecord(format!(
                "position {}/{}: entry_price {}",
                self.trader, self.symbol, self.entry_price
            )));
        }
        if !self.shares.is_finite() || self.shares <= 0.0 {
            return Err(LedgerError::MalformedRecord(format!(
                "position {}/{}: shares {}",
                self.trader, self.symbol, self.shares
            )));
        }
        if !self.high_water_mark.is_finite() || self.high_water_mark < self.entry_price {
            return Err(LedgerError::MalformedRecord(format!(
                "position {}/{}: high_water_mark {} below entry {}",
                self.trader, self.symbol, self.high_water_mark, self.entry_price
            )));
        }
        Ok(Position {
            trader: self.trader,
            symbol: self.symbol,
            entry_price: self.entry_price,
            shares: self.shares,
            high_water_mark: self.high_water_mark,
            opened_at: self.opened_at,
        })
    }
}

pub struct PositionsRepository;

impl PositionsRepository {
    pub async fn fetch(
        conn: &mut SqliteConnection,
        trader: &str,
        symbol: &str,
    ) -> Result<Option<PositionRow>, sqlx::Error> {
        sqlx::query_as::<_, PositionRow>(
            r#"
                SELECT trader, symbol, entry_price, shares, high_water_mark, opened_at
                FROM positions
                WHERE trader = ? AND symbol = ?
            "#,
        )
        .bind(trader)
        .bind(symbol)
        .fetch_optional(&mut *conn)
        .await
    }

    pub async fn insert(
        conn: &mut SqliteConnection,
        position: &Position,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
                INSERT INTO positions (trader, symbol, entry_price, shares, high_water_mark, opened_at)
                VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&position.trader)
        .bind(&position.symbol)
        .bind(position.entry_price)
        .bind(position.shares)
        .bind(position.high_water_mark)
        .bind(position.opened_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn delete(
        conn: &mut SqliteConnection,
        trader: &str,
        symbol: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM positions WHERE trader = ? AND symbol = ?")
            .bind(trader)
            .bind(symbol)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Monotone high-water-mark update; a no-op when the key is flat.
    pub async fn raise_high_water_mark(
        conn: &mut SqliteConnection,
        trader: &str,
        symbol: &str,
        price: f64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
                UPDATE positions
                SET high_water_mark = MAX(high_water_mark, ?)
                WHERE trader = ? AND symbol = ?
            "#,
        )
        .bind(price)
        .bind(trader)
        .bind(symbol)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<PositionRow>, sqlx::Error> {
        sqlx::query_as::<_, PositionRow>(
            r#"
                SELECT trader, symbol, entry_price, shares, high_water_mark, opened_at
                FROM positions
                ORDER BY trader, symbol
            "#,
        )
        .fetch_all(&mut *conn)
        .await
    }
}
