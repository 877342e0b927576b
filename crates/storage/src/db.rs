use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{self, SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

/// Handle to the durable ledger database.
///
/// The pool is capped at a single connection, which turns it into a
/// single-writer queue: every mutating transaction is serialized, so two
/// near-simultaneous buys for the same (trader, symbol) key can never both
/// observe the Flat state, and readers can never see a half-applied
/// mutation.
#[derive(Clone)]
pub struct LedgerDb {
    pool: SqlitePool,
}

impl LedgerDb {
    /// Opens (creating if needed) the ledger database at `path` and applies
    /// the schema. `synchronous=FULL` so that a committed transaction is on
    /// disk before the mutation is acknowledged to its caller.
    pub async fn open(path: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlite::SqliteSynchronous::Full)
            .busy_timeout(Duration::from_secs(30));

        let db = Self::connect(options).await?;
        info!("Ledger database ready at {}", path);
        Ok(db)
    }

    /// In-memory database for tests. Same single-connection contract.
    pub async fn open_in_memory() -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        Self::connect(options).await
    }

    async fn connect(options: SqliteConnectOptions) -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let schema = include_str!("../../../sql/schema.sql");
        sqlx::query(schema).execute(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schema_application_is_idempotent() {
        let db = LedgerDb::open_in_memory().await.unwrap();
        let schema = include_str!("../../../sql/schema.sql");
        sqlx::query(schema).execute(db.pool()).await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();

        assert!(tables.contains(&"portfolio".to_string()));
        assert!(tables.contains(&"positions".to_string()));
        assert!(tables.contains(&"trade_history".to_string()));
    }
}
