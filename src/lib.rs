//! walletx - 本地 HD 钱包服务
//!
//! BIP-39 助记词、Ethereum / Solana 账户派生、本地持久化与原生币转账

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod repository;
pub mod service;
pub mod utils;

// 重新导出常用类型
pub use app_state::AppState;
pub use error::{AppError, AppErrorCode};

pub mod prelude {
    pub use crate::{
        app_state::AppState,
        domain::{Chain, Network, WalletEntry, WalletStore},
        error::{AppError, AppErrorCode},
        service::{ChainClient, WalletService},
    };
}
