use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{domain::wallet_store::WalletStoreError, infrastructure::storage::StorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppErrorCode {
    // HTTP 基础错误码
    BadRequest,
    Forbidden,
    NotFound,
    Internal,

    // 输入校验（不修改状态、不发 RPC）
    InvalidAddress,
    InvalidAmount,
    InsufficientBalance,
    ValidationFailed,
    ChainNotSupported,

    // 派生
    InvalidMnemonic,
    MnemonicMissing,
    DerivationFailed,
    WalletNotFound,

    // 网络
    RpcError,
    TransactionFailed,
    ConfirmationTimeout,

    // 持久化
    StorageError,
}

impl AppErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppErrorCode::BadRequest => "bad_request",
            AppErrorCode::Forbidden => "forbidden",
            AppErrorCode::NotFound => "not_found",
            AppErrorCode::Internal => "internal",
            AppErrorCode::InvalidAddress => "invalid_address",
            AppErrorCode::InvalidAmount => "invalid_amount",
            AppErrorCode::InsufficientBalance => "insufficient_balance",
            AppErrorCode::ValidationFailed => "validation_failed",
            AppErrorCode::ChainNotSupported => "chain_not_supported",
            AppErrorCode::InvalidMnemonic => "invalid_mnemonic",
            AppErrorCode::MnemonicMissing => "mnemonic_missing",
            AppErrorCode::DerivationFailed => "derivation_failed",
            AppErrorCode::WalletNotFound => "wallet_not_found",
            AppErrorCode::RpcError => "rpc_error",
            AppErrorCode::TransactionFailed => "transaction_failed",
            AppErrorCode::ConfirmationTimeout => "confirmation_timeout",
            AppErrorCode::StorageError => "storage_error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppError {
    pub code: AppErrorCode,
    pub message: String,
    pub status: StatusCode,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code.as_str(),
            message: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {}

impl AppError {
    fn new(code: AppErrorCode, status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            status,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::BadRequest, StatusCode::BAD_REQUEST, msg)
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::Forbidden, StatusCode::FORBIDDEN, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::NotFound, StatusCode::NOT_FOUND, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(
            AppErrorCode::Internal,
            StatusCode::INTERNAL_SERVER_ERROR,
            msg,
        )
    }

    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::InvalidAddress, StatusCode::BAD_REQUEST, msg)
    }

    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::InvalidAmount, StatusCode::BAD_REQUEST, msg)
    }

    pub fn insufficient_balance(msg: impl Into<String>) -> Self {
        Self::new(
            AppErrorCode::InsufficientBalance,
            StatusCode::BAD_REQUEST,
            msg,
        )
    }

    pub fn validation_failed(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::ValidationFailed, StatusCode::BAD_REQUEST, msg)
    }

    pub fn chain_not_supported(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::ChainNotSupported, StatusCode::BAD_REQUEST, msg)
    }

    pub fn invalid_mnemonic(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::InvalidMnemonic, StatusCode::BAD_REQUEST, msg)
    }

    pub fn mnemonic_missing(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::MnemonicMissing, StatusCode::CONFLICT, msg)
    }

    pub fn derivation_failed(msg: impl Into<String>) -> Self {
        Self::new(
            AppErrorCode::DerivationFailed,
            StatusCode::INTERNAL_SERVER_ERROR,
            msg,
        )
    }

    pub fn wallet_not_found(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::WalletNotFound, StatusCode::NOT_FOUND, msg)
    }

    pub fn rpc_error(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::RpcError, StatusCode::BAD_GATEWAY, msg)
    }

    pub fn transaction_failed(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::TransactionFailed, StatusCode::BAD_GATEWAY, msg)
    }

    pub fn confirmation_timeout(msg: impl Into<String>) -> Self {
        Self::new(
            AppErrorCode::ConfirmationTimeout,
            StatusCode::GATEWAY_TIMEOUT,
            msg,
        )
    }

    pub fn storage_error(msg: impl Into<String>) -> Self {
        Self::new(
            AppErrorCode::StorageError,
            StatusCode::INTERNAL_SERVER_ERROR,
            msg,
        )
    }
}

impl From<WalletStoreError> for AppError {
    fn from(err: WalletStoreError) -> Self {
        match err {
            WalletStoreError::MnemonicMissing => Self::mnemonic_missing(err.to_string()),
            WalletStoreError::Mnemonic(e) => Self::invalid_mnemonic(e.to_string()),
            WalletStoreError::Derivation(e) => Self::derivation_failed(e.to_string()),
            WalletStoreError::NotFound(id) => {
                Self::wallet_not_found(format!("wallet not found: {}", id))
            }
            WalletStoreError::ChainMismatch { .. } => Self::internal(err.to_string()),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        Self::storage_error(err.to_string())
    }
}

// 从 serde_json 错误转换
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::bad_request(format!("JSON serialization error: {}", err))
    }
}

// 从 anyhow 错误转换
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(format!("{:#}", err))
    }
}
