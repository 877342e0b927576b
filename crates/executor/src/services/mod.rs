pub mod scanner_service;
pub mod telegram_service;
