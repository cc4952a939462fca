// Repository 抽象层
pub mod wallet_repository;

pub use wallet_repository::{StoredWallet, WalletRepository};
