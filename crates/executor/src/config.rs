use std::env;
use std::time::Duration;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: i64,
}

/// All runtime configuration, parsed once at startup and passed into each
/// service explicitly.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub watchlist: Vec<String>,
    pub trader: String,
    pub db_path: String,
    pub scan_interval: Duration,
    pub warmup_bars: usize,
    pub trail_pct: f64,
    pub starting_balance: f64,
    pub model_path: Option<String>,
    pub telegram: Option<TelegramConfig>,
}

impl BotConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let watchlist = env::var("WATCHLIST")
            .unwrap_or_else(|_| "BTCUSDT,ETHUSDT,SOLUSDT,DOGEUSDT".to_string())
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let telegram = match (env::var("TELEGRAM_BOT_TOKEN"), env::var("TELEGRAM_CHAT_ID")) {
            (Ok(token), Ok(chat_id)) => Some(TelegramConfig {
                token,
                chat_id: chat_id
                    .parse::<i64>()
                    .context("TELEGRAM_CHAT_ID must be a number")?,
            }),
            _ => None,
        };

        Ok(Self {
            watchlist,
            trader: env::var("TRADER_ID").unwrap_or_else(|_| "bot".to_string()),
            db_path: env::var("LEDGER_DB_PATH").unwrap_or_else(|_| "data/ledger.db".to_string()),
            scan_interval: Duration::from_secs(parse_or("SCAN_INTERVAL_SECS", 300)?),
            warmup_bars: parse_or("WARMUP_BARS", 50)?,
            trail_pct: parse_or("TRAIL_PCT", 0.03)?,
            starting_balance: parse_or("STARTING_BALANCE", 10_000.0)?,
            model_path: env::var("MODEL_PATH").ok(),
            telegram,
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} is not valid")),
        Err(_) => Ok(default),
    }
}
