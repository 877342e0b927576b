use async_trait::async_trait;
use teloxide::prelude::*;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info};
use uuid::Uuid;

use common::actors::{Actor, ActorType, ControlMessage};
use common::models::{OutboundEvent, Signal, TradeAction, TradeTrigger};

use crate::config::TelegramConfig;

/// Pushes signal and trade notifications to a Telegram chat. A slow or
/// unreachable Telegram API only drops notifications, never trades.
pub struct TelegramService {
    id: Uuid,
    bot: Bot,
    chat_id: ChatId,
    events_tx: broadcast::Sender<OutboundEvent>,
}

impl TelegramService {
    pub fn new(config: &TelegramConfig, events_tx: broadcast::Sender<OutboundEvent>) -> Self {
        Self {
            id: Uuid::new_v4(),
            bot: Bot::new(&config.token),
            chat_id: ChatId(config.chat_id),
            events_tx,
        }
    }
}

#[async_trait]
impl Actor for TelegramService {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> ActorType {
        ActorType::NotifierActor
    }

    async fn run(&mut self, supervisor_tx: mpsc::Sender<ControlMessage>) -> anyhow::Result<()> {
        let heartbeat_handle = self.spawn_heartbeat(supervisor_tx.clone());
        info!("Starting Telegram notification service");

        let mut rx = self.events_tx.subscribe();
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let msg = format_event(&event);
                    if let Err(e) = self.bot.send_message(self.chat_id, msg).await {
                        error!("Failed to send Telegram message: {}", e);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    error!("Telegram service lagged behind. Missed {} events.", n);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("Event channel closed. Stopping Telegram service.");
                    break;
                }
            }
        }

        heartbeat_handle.abort();
        Ok(())
    }
}

fn format_event(event: &OutboundEvent) -> String {
    match event {
        OutboundEvent::Signal(ev) => format!(
            "📡 {} on {} at ${:.2} (risk {})",
            ev.signal, ev.symbol, ev.price, ev.risk_score
        ),
        OutboundEvent::Trade(ev) => {
            let record = &ev.record;
            match record.action {
                TradeAction::Buy => format!(
                    "🟢 BUY {} | {:.6} @ ${:.2} (${:.2})",
                    record.symbol,
                    record.shares,
                    record.price,
                    record.shares * record.price
                ),
                TradeAction::Sell => {
                    let profit = record.profit.unwrap_or(0.0);
                    let icon = if profit >= 0.0 { "🟢" } else { "🔴" };
                    let why = match &ev.trigger {
                        TradeTrigger::TrailingStop => "trailing stop".to_string(),
                        TradeTrigger::Signal(Signal::Hold) => "signal".to_string(),
                        TradeTrigger::Signal(signal) => signal.to_string(),
                    };
                    format!(
                        "{} SELL {} | {:.6} @ ${:.2} | P/L ${:+.2} ({})",
                        icon, record.symbol, record.shares, record.price, profit, why
                    )
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::models::{SellReason, SignalEvent, TradeEvent, TradeRecord};

    fn sell_record(profit: f64) -> TradeRecord {
        TradeRecord {
            time: Utc::now(),
            trader: "bot".to_string(),
            symbol: "ETHUSDT".to_string(),
            action: TradeAction::Sell,
            price: 2_500.0,
            shares: 0.8,
            value: 2_000.0,
            profit: Some(profit),
        }
    }

    #[test]
    fn signal_message_carries_symbol_price_and_risk() {
        let msg = format_event(&OutboundEvent::Signal(SignalEvent {
            symbol: "BTCUSDT".to_string(),
            signal: Signal::Buy,
            price: 64_250.5,
            risk_score: 12,
        }));
        assert!(msg.contains("BTCUSDT"));
        assert!(msg.contains("$64250.50"));
        assert!(msg.contains("risk 12"));
    }

    #[test]
    fn losing_sell_is_flagged_red_with_signed_pnl() {
        let msg = format_event(&OutboundEvent::Trade(TradeEvent {
            record: sell_record(-42.5),
            trigger: TradeTrigger::Signal(Signal::Sell(SellReason::TrendReversal)),
        }));
        assert!(msg.starts_with("🔴"));
        assert!(msg.contains("$-42.50"));
    }

    #[test]
    fn forced_exit_names_the_trailing_stop() {
        let msg = format_event(&OutboundEvent::Trade(TradeEvent {
            record: sell_record(120.0),
            trigger: TradeTrigger::TrailingStop,
        }));
        assert!(msg.contains("trailing stop"));
        assert!(msg.starts_with("🟢"));
    }
}
