pub mod portfolio_service;
pub mod wallet_service;

pub use portfolio_service::PortfolioService;
pub use wallet_service::WalletService;
