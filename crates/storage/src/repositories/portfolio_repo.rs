use sqlx::SqliteConnection;

/// Single-row cash balance table. Row id is fixed at 1.
pub struct PortfolioRepository;

impl PortfolioRepository {
    /// Creates the balance row if this is a fresh database.
    pub async fn seed_if_missing(
        conn: &mut SqliteConnection,
        starting_balance: f64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT OR IGNORE INTO portfolio (id, balance) VALUES (1, ?)")
            .bind(starting_balance)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    pub async fn fetch_balance(conn: &mut SqliteConnection) -> Result<f64, sqlx::Error> {
        sqlx::query_scalar("SELECT balance FROM portfolio WHERE id = 1")
            .fetch_one(&mut *conn)
            .await
    }

    pub async fn set_balance(
        conn: &mut SqliteConnection,
        balance: f64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE portfolio SET balance = ? WHERE id = 1")
            .bind(balance)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
