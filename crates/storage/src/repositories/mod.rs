pub mod history_repo;
pub mod portfolio_repo;
pub mod positions_repo;

pub use history_repo::HistoryRepository;
pub use portfolio_repo::PortfolioRepository;
pub use positions_repo::PositionsRepository;
