use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::services::wallet_service::{SyncAllSummary, WalletAdded, WalletRenamed};

use super::AppState;

#[derive(Deserialize)]
pub struct AddWalletRequest {
    pub address: String,
    pub chain: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct RenameWalletRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Serialize)]
pub struct RemovedResponse {
    pub removed: bool,
}

pub async fn add_wallet(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<AddWalletRequest>,
) -> Result<Json<WalletAdded>> {
    let response = state
        .wallet_service
        .add_wallet(&user_id, &request.address, &request.chain, request.name)
        .await?;

    Ok(Json(response))
}

pub async fn remove_wallet(
    State(state): State<AppState>,
    Path((user_id, chain, address)): Path<(String, String, String)>,
) -> Result<Json<RemovedResponse>> {
    state
        .wallet_service
        .remove_wallet(&user_id, &address, &chain)
        .await?;

    Ok(Json(RemovedResponse { removed: true }))
}

pub async fn rename_wallet(
    State(state): State<AppState>,
    Path((user_id, chain, address)): Path<(String, String, String)>,
    Json(request): Json<RenameWalletRequest>,
) -> Result<Json<WalletRenamed>> {
    let response = state
        .wallet_service
        .rename_wallet(&user_id, &address, &chain, request.name)
        .await?;

    Ok(Json(response))
}

pub async fn sync_all_wallets(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<SyncAllSummary>> {
    let response = state.wallet_service.sync_all_user_wallets(&user_id).await?;

    Ok(Json(response))
}
