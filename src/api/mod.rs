use std::sync::Arc;

pub mod portfolio;
pub mod wallet;

use crate::services::{PortfolioService, WalletService};

#[derive(Clone)]
pub struct AppState {
    pub wallet_service: Arc<WalletService>,
    pub portfolio_service: Arc<PortfolioService>,
}

impl AppState {
    pub fn new(
        wallet_service: Arc<WalletService>,
        portfolio_service: Arc<PortfolioService>,
    ) -> Self {
        Self {
            wallet_service,
            portfolio_service,
        }
    }
}
