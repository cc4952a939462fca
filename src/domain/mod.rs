//! Domain 模块
//!
//! 助记词、密钥派生、钱包集合与交易状态等核心模型

pub mod chain;
pub mod derivation;
pub mod history;
pub mod mnemonic;
pub mod slip10;
pub mod submission_state;
pub mod transfer;
pub mod wallet_store;

// 重新导出常用类型
pub use chain::{Chain, Network};
pub use derivation::{
    AccountKey, DerivationError, DerivationStrategy, DerivationStrategyFactory, SolanaDerivation,
};
pub use history::{HistoryEntry, TransferDirection, TxOutcome};
pub use submission_state::{SubmissionState, SubmissionTracker};
pub use transfer::{BalanceSnapshot, SendRequest, ValidatedTransfer};
pub use wallet_store::{WalletEntry, WalletStore, WalletStoreError};
