use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tokio::sync::broadcast;
use tracing::{debug, info};

use common::actors::ActorType;
use common::logger;
use common::models::OutboundEvent;
use market_data::oracles::{OnnxForecaster, ThresholdAnomalyOracle};
use market_data::remote::BinanceClient;
use market_data::services::{BinanceFeatureProvider, FeedConfig};
use market_data::{FeatureProvider, ForecastProvider, NeutralSentiment, SentimentProvider};
use storage::{LedgerConfig, LedgerDb, PositionLedger, TrailingStopMonitor};
use strategy::{SignalConfig, SignalEngine};

use crate::actors::supervisor::Supervisor;
use crate::config::BotConfig;
use crate::services::scanner_service::ScannerService;
use crate::services::telegram_service::TelegramService;

mod actors;
mod config;
mod services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::setup_logger();
    dotenv().ok();
    debug!("System starting up...");

    let config = Arc::new(BotConfig::from_env()?);

    if let Some(parent) = Path::new(&config.db_path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    let db = LedgerDb::open(&config.db_path)
        .await
        .with_context(|| format!("cannot open ledger at {}", config.db_path))?;
    let ledger = PositionLedger::open(
        db.clone(),
        LedgerConfig {
            starting_balance: config.starting_balance,
            ..LedgerConfig::default()
        },
    )
    .await?;
    let monitor = TrailingStopMonitor::new(db, config.trail_pct);

    let features: Arc<dyn FeatureProvider> = Arc::new(BinanceFeatureProvider::new(
        BinanceClient::new(),
        Arc::new(ThresholdAnomalyOracle::default()),
        FeedConfig {
            warmup_bars: config.warmup_bars,
            ..FeedConfig::default()
        },
    ));
    let sentiment: Arc<dyn SentimentProvider> = Arc::new(NeutralSentiment);
    let forecaster: Option<Arc<dyn ForecastProvider>> = config.model_path.as_deref().map(|path| {
        info!("Using forecast model: {}", path);
        Arc::new(OnnxForecaster::new(path)) as Arc<dyn ForecastProvider>
    });

    let (events_tx, _) = broadcast::channel::<OutboundEvent>(1_024);

    let mut supervisor = Supervisor::new();

    let scanner_deps = (
        config.clone(),
        ledger,
        monitor,
        features,
        sentiment,
        forecaster,
        events_tx.clone(),
    );
    supervisor.register_actor(
        ActorType::ScannerActor,
        Box::new(move || {
            let (config, ledger, monitor, features, sentiment, forecaster, events_tx) =
                scanner_deps.clone();
            let engine = SignalEngine::new(SignalConfig {
                warmup_bars: config.warmup_bars,
            });
            Box::new(ScannerService::new(
                config, ledger, monitor, engine, features, sentiment, forecaster, events_tx,
            ))
        }),
    );

    if let Some(telegram) = config.telegram.clone() {
        let tx_for_notifier = events_tx.clone();
        supervisor.register_actor(
            ActorType::NotifierActor,
            Box::new(move || {
                Box::new(TelegramService::new(&telegram, tx_for_notifier.clone()))
            }),
        );
    } else {
        info!("Telegram not configured, notifications disabled");
    }

    supervisor.start().await;
    Ok(())
}
