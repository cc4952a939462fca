pub mod balance_service;
pub mod chain_client;
pub mod ethereum_client;
pub mod rpc_client;
pub mod solana_client;
pub mod transaction_builder;
pub mod transaction_submitter;
pub mod wallet_service;

pub use balance_service::BalanceService;
pub use chain_client::{ChainClient, ConfirmationStatus, SignedTransaction, SigningContext};
pub use ethereum_client::EthereumClient;
pub use rpc_client::JsonRpcClient;
pub use solana_client::SolanaClient;
pub use transaction_submitter::{SubmissionReceipt, TransactionSubmitter};
pub use wallet_service::WalletService;
