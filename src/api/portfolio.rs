use axum::extract::{Path, State};
use axum::Json;

use crate::error::Result;
use crate::services::portfolio_service::{AggregatedPortfolio, WalletAssets, WalletSummary};

use super::AppState;

pub async fn list_wallets(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<WalletSummary>>> {
    let response = state.portfolio_service.list_user_wallets(&user_id).await?;

    Ok(Json(response))
}

pub async fn get_wallet_assets(
    State(state): State<AppState>,
    Path((user_id, chain, address)): Path<(String, String, String)>,
) -> Result<Json<WalletAssets>> {
    let response = state
        .portfolio_service
        .get_wallet_assets(&user_id, &address, &chain)
        .await?;

    Ok(Json(response))
}

pub async fn get_aggregated_portfolio(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<AggregatedPortfolio>> {
    let response = state
        .portfolio_service
        .get_aggregated_portfolio(&user_id)
        .await?;

    Ok(Json(response))
}
