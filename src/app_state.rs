use std::{sync::Arc, time::Duration};

use anyhow::Context;

use crate::{
    config::Config,
    domain::chain::Chain,
    infrastructure::{
        encryption::EncryptedStorage,
        storage::{FileStorage, KeyValueStore},
    },
    repository::wallet_repository::WalletRepository,
    service::{
        BalanceService, ChainClient, EthereumClient, JsonRpcClient, SolanaClient,
        TransactionSubmitter, WalletService,
    },
};

/// 应用状态
/// 包含所有共享资源
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub wallet_service: Arc<WalletService>,
    pub balance_service: Arc<BalanceService>,
    pub submitter: Arc<TransactionSubmitter>,
    pub ethereum_client: Arc<dyn ChainClient>,
    pub solana_client: Arc<dyn ChainClient>,
}

impl AppState {
    /// 按配置打开本地存储并创建 RPC 客户端
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let file_storage = FileStorage::open(&config.storage.data_dir).with_context(|| {
            format!("Failed to open data directory {}", config.storage.data_dir)
        })?;
        let storage: Arc<dyn KeyValueStore> = match config.storage.passphrase.as_deref() {
            Some(passphrase) => {
                tracing::info!("storage encryption enabled");
                Arc::new(
                    EncryptedStorage::open(Arc::new(file_storage), passphrase)
                        .context("Failed to open encrypted storage")?,
                )
            }
            None => Arc::new(file_storage),
        };

        let timeout = Duration::from_secs(config.rpc.request_timeout_secs);
        let ethereum_client: Arc<dyn ChainClient> = Arc::new(EthereumClient::new(
            JsonRpcClient::new(timeout)?,
            config.rpc.clone(),
        ));
        let solana_client: Arc<dyn ChainClient> = Arc::new(SolanaClient::new(
            JsonRpcClient::new(timeout)?,
            config.rpc.clone(),
        ));

        Self::with_components(config, storage, ethereum_client, solana_client)
    }

    /// 用给定的存储与链客户端组装（测试注入 mock）
    pub fn with_components(
        config: Config,
        storage: Arc<dyn KeyValueStore>,
        ethereum_client: Arc<dyn ChainClient>,
        solana_client: Arc<dyn ChainClient>,
    ) -> anyhow::Result<Self> {
        let wallet_service = WalletService::open(
            WalletRepository::new(storage),
            config.wallet.solana_derivation,
            config.wallet.mnemonic_word_count,
        )
        .context("Failed to load wallet data")?;
        let submitter = TransactionSubmitter::from_config(&config.rpc);

        Ok(Self {
            config: Arc::new(config),
            wallet_service: Arc::new(wallet_service),
            balance_service: Arc::new(BalanceService::new()),
            submitter: Arc::new(submitter),
            ethereum_client,
            solana_client,
        })
    }

    pub fn client(&self, chain: Chain) -> &dyn ChainClient {
        match chain {
            Chain::Ethereum => self.ethereum_client.as_ref(),
            Chain::Solana => self.solana_client.as_ref(),
        }
    }
}
