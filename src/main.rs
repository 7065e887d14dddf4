use std::sync::Arc;

use axum::routing::{delete, get, patch, post};
use axum::Router;
use chainfolio::normalizer::BalanceNormalizer;
use chainfolio::registry::ChainRegistry;
use chainfolio::{Config, Result};
use sea_orm_migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chainfolio=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| chainfolio::AppError::Config(e.to_string()))?;

    let db = sea_orm::Database::connect(&config.database_url)
        .await
        .map_err(chainfolio::AppError::Database)?;

    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None)
        .await
        .map_err(chainfolio::AppError::Database)?;

    tracing::info!("Migrations completed successfully");

    // Chain identity tables are immutable after this point; suspect
    // entries are surfaced to the operator once, here.
    let registry = Arc::new(ChainRegistry::bundled());
    registry.log_review_flags();

    let balance_provider = Arc::new(chainfolio::providers::AlchemyBalanceProvider::new(
        config.balance_api_key.clone(),
    ));
    let market_feed = Arc::new(chainfolio::providers::CoinGeckoFeed::new(
        config.market_api_key.clone(),
    ));
    let tag_feed = Arc::new(chainfolio::providers::JupiterTagFeed::new());

    let token_store: Arc<dyn chainfolio::db::TokenStore> =
        Arc::new(chainfolio::db::TokenRepository::new(db.clone()));
    let wallet_store: Arc<dyn chainfolio::db::WalletStore> =
        Arc::new(chainfolio::db::WalletRepository::new(db.clone()));

    let normalizer = BalanceNormalizer::new(registry.clone(), config.exclude_unpriced_tokens);

    let wallet_service = Arc::new(chainfolio::services::WalletService::new(
        registry.clone(),
        normalizer,
        balance_provider,
        token_store.clone(),
        wallet_store.clone(),
    ));

    let portfolio_service = Arc::new(chainfolio::services::PortfolioService::new(
        registry.clone(),
        wallet_store,
    ));

    let market_sync = Arc::new(chainfolio::sync::MarketSyncService::new(
        market_feed.clone(),
        token_store.clone(),
    ));
    let platform_sync = Arc::new(chainfolio::sync::PlatformSyncService::new(
        market_feed,
        registry.clone(),
        token_store.clone(),
    ));
    let decimals_sync = Arc::new(chainfolio::sync::DecimalsSyncService::new(
        tag_feed,
        token_store.clone(),
    ));

    let external_id_sync = config.id_map_api_key.clone().map(|key| {
        Arc::new(chainfolio::sync::ExternalIdSyncService::new(
            Arc::new(chainfolio::providers::CoinMarketCapProvider::new(key)),
            token_store,
        ))
    });

    chainfolio::scheduler::Scheduler::new(
        market_sync,
        platform_sync,
        decimals_sync,
        external_id_sync,
        config.catalog_sync_interval_secs,
        config.external_id_sync_interval_secs,
    )
    .start();

    let app_state = chainfolio::api::AppState::new(wallet_service, portfolio_service);

    let app = Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/users/{user_id}/wallets",
            get(chainfolio::api::portfolio::list_wallets)
                .post(chainfolio::api::wallet::add_wallet),
        )
        .route(
            "/api/users/{user_id}/wallets/sync",
            post(chainfolio::api::wallet::sync_all_wallets),
        )
        .route(
            "/api/users/{user_id}/wallets/{chain}/{address}",
            delete(chainfolio::api::wallet::remove_wallet),
        )
        .route(
            "/api/users/{user_id}/wallets/{chain}/{address}/name",
            patch(chainfolio::api::wallet::rename_wallet),
        )
        .route(
            "/api/users/{user_id}/wallets/{chain}/{address}/assets",
            get(chainfolio::api::portfolio::get_wallet_assets),
        )
        .route(
            "/api/users/{user_id}/portfolio",
            get(chainfolio::api::portfolio::get_aggregated_portfolio),
        )
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("{}:{}", config.server_host, config.server_port);
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| chainfolio::AppError::Internal(e.to_string()))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| chainfolio::AppError::Internal(e.to_string()))?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
