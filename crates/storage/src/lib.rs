pub mod db;
pub mod error;
pub mod ledger;
pub mod repositories;
pub mod trailing;

pub use db::LedgerDb;
pub use error::LedgerError;
pub use ledger::{LedgerConfig, PositionLedger};
pub use trailing::{ForcedExit, TrailingStopMonitor};
