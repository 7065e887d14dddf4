pub mod entity;
pub use entity::*;

mod token_repository;
pub use token_repository::{TokenRepository, TokenStore, PRICE_SOURCE_MARKET};

mod wallet_repository;
pub use wallet_repository::{BalanceRow, WalletRepository, WalletStore};

#[cfg(test)]
pub(crate) mod memory;
