pub mod chain_token_decimals;
pub mod token;
pub mod token_external_id;
pub mod token_master;
pub mod token_price;
pub mod user_wallet;
pub mod wallet;
pub mod wallet_token_balance;
