use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use common::actors::{Actor, ActorType, ControlMessage};
use common::models::{OutboundEvent, Signal, SignalEvent, TradeEvent, TradeTrigger};
use market_data::{FeatureProvider, ForecastProvider, SentimentProvider};
use storage::{LedgerError, PositionLedger, TrailingStopMonitor};
use strategy::{SignalEngine, classify_regime, confirm_with_forecast, crash_risk_score};

use crate::config::BotConfig;

/// Drives one decision tick per watchlist symbol per interval.
///
/// Per tick, per symbol: snapshot -> high-water-mark update -> trailing stop
/// (preempts everything) -> risk score -> signal engine -> optional forecast
/// confirmation -> ledger transition -> outbound events. One symbol failing
/// never touches another symbol's state.
pub struct ScannerService {
    id: Uuid,
    config: Arc<BotConfig>,
    ledger: PositionLedger,
    monitor: TrailingStopMonitor,
    engine: SignalEngine,
    features: Arc<dyn FeatureProvider>,
    sentiment: Arc<dyn SentimentProvider>,
    forecaster: Option<Arc<dyn ForecastProvider>>,
    events_tx: broadcast::Sender<OutboundEvent>,
}

#[async_trait]
impl Actor for ScannerService {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> ActorType {
        ActorType::ScannerActor
    }

    async fn run(&mut self, supervisor_tx: mpsc::Sender<ControlMessage>) -> anyhow::Result<()> {
        // The heartbeat task stops on its own once the supervisor side of
        // the channel is gone; this loop itself never exits normally.
        let _heartbeat = self.spawn_heartbeat(supervisor_tx);
        info!(
            "Starting scanner for {} symbols, every {:?}",
            self.config.watchlist.len(),
            self.config.scan_interval
        );

        let mut interval = tokio::time::interval(self.config.scan_interval);
        loop {
            interval.tick().await;
            self.sweep().await;
        }
    }
}

impl ScannerService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<BotConfig>,
        ledger: PositionLedger,
        monitor: TrailingStopMonitor,
        engine: SignalEngine,
        features: Arc<dyn FeatureProvider>,
        sentiment: Arc<dyn SentimentProvider>,
        forecaster: Option<Arc<dyn ForecastProvider>>,
        events_tx: broadcast::Sender<OutboundEvent>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            ledger,
            monitor,
            engine,
            features,
            sentiment,
            forecaster,
            events_tx,
        }
    }

    async fn sweep(&self) {
        let symbols = self.config.watchlist.clone();
        for symbol in &symbols {
            if let Err(e) = self.scan_symbol(symbol).await {
                warn!(%symbol, "tick failed: {e:#}");
            }
        }
        self.log_status().await;
    }

    /// One full decision tick for one symbol.
    pub async fn scan_symbol(&self, symbol: &str) -> anyhow::Result<()> {
        let trader = &self.config.trader;

        let Some(mut snapshot) = self.features.latest(symbol).await? else {
            debug!(symbol, "snapshot withheld, holding");
            return Ok(());
        };
        let price = snapshot.close;

        // Trailing stop first: a forced exit preempts the signal engine.
        self.monitor
            .update_high_water_mark(symbol, trader, price)
            .await?;
        if let Some(exit) = self
            .monitor
            .check_trailing_stop(symbol, trader, price)
            .await?
        {
            info!(
                symbol,
                price,
                high_water_mark = exit.high_water_mark,
                "trailing stop hit, forcing exit"
            );
            self.apply_sell(symbol, exit.price, TradeTrigger::TrailingStop)
                .await?;
            return Ok(());
        }

        // Enrich the snapshot from the optional collaborators. Provider
        // failures degrade to neutral inputs rather than aborting the tick.
        snapshot.sentiment_score = match self.sentiment.score(symbol).await {
            Ok(score) => score,
            Err(e) => {
                warn!(symbol, "sentiment unavailable, assuming neutral: {e}");
                0.0
            }
        };
        if let Some(forecaster) = &self.forecaster {
            snapshot.ml_forecast_price = match forecaster.forecast_price(&snapshot).await {
                Ok(forecast) => forecast,
                Err(e) => {
                    warn!(symbol, "forecast unavailable: {e}");
                    None
                }
            };
        }

        let risk_score = crash_risk_score(&snapshot);
        let regime = classify_regime(snapshot.adx);
        let base_signal = self.engine.evaluate(&snapshot, risk_score);

        let signal = if self.forecaster.is_some() {
            confirm_with_forecast(base_signal, snapshot.close, snapshot.ml_forecast_price)
        } else {
            base_signal
        };
        debug!(symbol, risk_score, ?regime, %base_signal, %signal, "tick evaluated");

        if signal != Signal::Hold {
            let _ = self.events_tx.send(OutboundEvent::Signal(SignalEvent {
                symbol: symbol.to_string(),
                signal,
                price,
                risk_score,
            }));
        }

        match signal {
            Signal::Buy => self.apply_buy(symbol, price).await?,
            signal if signal.is_exit() => {
                self.apply_sell(symbol, price, TradeTrigger::Signal(signal))
                    .await?
            }
            _ => {}
        }
        Ok(())
    }

    async fn apply_buy(&self, symbol: &str, price: f64) -> anyhow::Result<()> {
        match self
            .ledger
            .execute_buy(symbol, price, &self.config.trader, None)
            .await
        {
            Ok(record) => {
                let _ = self.events_tx.send(OutboundEvent::Trade(TradeEvent {
                    record,
                    trigger: TradeTrigger::Signal(Signal::Buy),
                }));
                Ok(())
            }
            Err(e) if e.is_rejection() => {
                debug!(symbol, "buy rejected: {e}");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn apply_sell(
        &self,
        symbol: &str,
        price: f64,
        trigger: TradeTrigger,
    ) -> anyhow::Result<()> {
        match self
            .ledger
            .execute_sell(symbol, price, &self.config.trader)
            .await
        {
            Ok(record) => {
                let _ = self
                    .events_tx
                    .send(OutboundEvent::Trade(TradeEvent { record, trigger }));
                Ok(())
            }
            Err(LedgerError::NoPosition) => {
                // Exit signal while flat is normal flow.
                debug!(symbol, "exit signal with no open position");
                Ok(())
            }
            Err(e) if e.is_rejection() => {
                debug!(symbol, "sell rejected: {e}");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn log_status(&self) {
        match self.ledger.status(5).await {
            Ok(status) => {
                let open: Vec<&str> = status
                    .positions
                    .iter()
                    .map(|p| p.symbol.as_str())
                    .collect();
                info!(
                    balance = format!("{:.2}", status.balance),
                    open_positions = ?open,
                    trades = status.history.len(),
                    "sweep complete"
                );
            }
            Err(e) => warn!("status query failed: {e}"),
        }
    }
}
