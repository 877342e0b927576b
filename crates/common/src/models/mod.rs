pub mod candle;
pub mod event;
pub mod position;
pub mod signal;
pub mod snapshot;
pub mod trade;

pub use candle::Candle;
pub use event::{OutboundEvent, SignalEvent, TradeEvent, TradeTrigger};
pub use position::Position;
pub use signal::{SellReason, Signal};
pub use snapshot::{AnomalyLabel, FeatureSnapshot};
pub use trade::{PortfolioStatus, TradeAction, TradeRecord};
