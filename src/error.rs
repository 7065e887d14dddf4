use thiserror::Error;

use crate::providers::ProviderError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")] Database(#[from] sea_orm::DbErr),

    #[error("Configuration error: {0}")] Config(String),

    #[error("Upstream provider error: {0}")] Provider(#[from] ProviderError),

    #[error("Unknown chain: {0}")] UnknownChain(String),

    #[error("Unresolved decimal precision for {0}")] UnresolvedPrecision(String),

    #[error("Invalid input: {0}")] InvalidInput(String),

    #[error("Wallet not found")]
    WalletNotFound,

    #[error("Wallet already added")]
    WalletAlreadyAdded,

    #[error("Internal error: {0}")] Internal(String),
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(serde::Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    pub fn to_error_response(&self) -> ErrorResponse {
        let (code, message, field) = match self {
            AppError::Database(e) => ("DATABASE_ERROR", e.to_string(), None),
            AppError::Config(msg) => ("CONFIG_ERROR", msg.clone(), None),
            AppError::Provider(e) => ("UPSTREAM_FAILURE", e.to_string(), None),
            AppError::UnknownChain(name) =>
                (
                    "UNKNOWN_CHAIN",
                    format!("Unsupported chain: {}", name),
                    Some("chain".to_string()),
                ),
            AppError::UnresolvedPrecision(msg) => ("UNRESOLVED_PRECISION", msg.clone(), None),
            AppError::InvalidInput(msg) => ("VALIDATION_ERROR", msg.clone(), None),
            AppError::WalletNotFound => ("NOT_FOUND", "Wallet not found".to_string(), None),
            AppError::WalletAlreadyAdded =>
                ("ALREADY_EXISTS", "You already have this wallet added".to_string(), None),
            AppError::Internal(msg) => ("INTERNAL_ERROR", msg.clone(), None),
        };

        ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                field,
            },
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::WalletNotFound => axum::http::StatusCode::NOT_FOUND,
            AppError::WalletAlreadyAdded => axum::http::StatusCode::CONFLICT,
            AppError::InvalidInput(_) | AppError::UnknownChain(_) => {
                axum::http::StatusCode::BAD_REQUEST
            }
            AppError::Provider(_) => axum::http::StatusCode::BAD_GATEWAY,
            _ => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        };

        let response = self.to_error_response();
        (status, axum::Json(response)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
