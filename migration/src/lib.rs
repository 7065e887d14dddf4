pub use sea_orm_migration::prelude::*;

mod m20250601_000001_create_token_master_table;
mod m20250601_000002_create_tokens_table;
mod m20250601_000003_create_token_prices_table;
mod m20250601_000004_create_chain_token_decimals_table;
mod m20250601_000005_create_wallets_table;
mod m20250601_000006_create_user_wallets_table;
mod m20250601_000007_create_wallet_token_balances_table;
mod m20250601_000008_create_token_external_ids_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_token_master_table::Migration),
            Box::new(m20250601_000002_create_tokens_table::Migration),
            Box::new(m20250601_000003_create_token_prices_table::Migration),
            Box::new(m20250601_000004_create_chain_token_decimals_table::Migration),
            Box::new(m20250601_000005_create_wallets_table::Migration),
            Box::new(m20250601_000006_create_user_wallets_table::Migration),
            Box::new(m20250601_000007_create_wallet_token_balances_table::Migration),
            Box::new(m20250601_000008_create_token_external_ids_table::Migration)
        ]
    }
}
