//! 测试辅助模块
//! 提供 mock 链客户端与基于临时目录的应用状态

#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;
use walletx::{
    app_state::AppState,
    config::Config,
    domain::{
        chain::{Chain, Network},
        history::HistoryEntry,
    },
    infrastructure::storage::{FileStorage, KeyValueStore},
    service::{ChainClient, ConfirmationStatus, SignedTransaction, SigningContext},
};

pub const TEST_MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

pub const ONE_ETH: u128 = 1_000_000_000_000_000_000;
pub const ONE_SOL: u128 = 1_000_000_000;

/// 记录调用次数的 mock 链客户端
pub struct MockChainClient {
    chain: Chain,
    balance: Mutex<u128>,
    /// 依次返回；耗尽后一直 Pending
    statuses: Mutex<VecDeque<ConfirmationStatus>>,
    history: Mutex<Vec<HistoryEntry>>,
    fail_broadcast: AtomicBool,
    calls: AtomicUsize,
    broadcasts: Mutex<Vec<SignedTransaction>>,
}

impl MockChainClient {
    pub fn new(chain: Chain) -> Self {
        Self {
            chain,
            balance: Mutex::new(0),
            statuses: Mutex::new(VecDeque::new()),
            history: Mutex::new(Vec::new()),
            fail_broadcast: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            broadcasts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_balance(self, balance: u128) -> Self {
        *self.balance.lock().unwrap() = balance;
        self
    }

    pub fn push_status(&self, status: ConfirmationStatus) {
        self.statuses.lock().unwrap().push_back(status);
    }

    pub fn set_history(&self, entries: Vec<HistoryEntry>) {
        *self.history.lock().unwrap() = entries;
    }

    pub fn fail_broadcasts(&self) {
        self.fail_broadcast.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn broadcasts(&self) -> Vec<SignedTransaction> {
        self.broadcasts.lock().unwrap().clone()
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    fn chain(&self) -> Chain {
        self.chain
    }

    async fn get_balance(&self, _network: Network, _address: &str) -> Result<u128> {
        self.record();
        Ok(*self.balance.lock().unwrap())
    }

    async fn signing_context(&self, network: Network, _from: &str) -> Result<SigningContext> {
        self.record();
        Ok(match self.chain {
            Chain::Ethereum => SigningContext::Ethereum {
                nonce: 3,
                gas_price: 1_000_000_000,
                chain_id: walletx::service::ethereum_client::chain_id(network),
            },
            Chain::Solana => SigningContext::Solana {
                recent_blockhash: [7u8; 32],
            },
        })
    }

    async fn broadcast(&self, _network: Network, tx: &SignedTransaction) -> Result<String> {
        self.record();
        if self.fail_broadcast.load(Ordering::SeqCst) {
            anyhow::bail!("RPC error -32000: insufficient funds for gas * price + value");
        }
        self.broadcasts.lock().unwrap().push(tx.clone());
        Ok(tx.tx_id.clone())
    }

    async fn confirmation_status(
        &self,
        _network: Network,
        _tx_id: &str,
    ) -> Result<ConfirmationStatus> {
        self.record();
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ConfirmationStatus::Pending))
    }

    async fn transaction_history(
        &self,
        _network: Network,
        _address: &str,
    ) -> Result<Vec<HistoryEntry>> {
        self.record();
        Ok(self.history.lock().unwrap().clone())
    }
}

/// 快速轮询的测试配置
pub fn test_config(data_dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.storage.data_dir = data_dir.display().to_string();
    config.storage.passphrase = None;
    config.server.allowed_origin = None;
    config.rpc.confirmation_poll_interval_ms = 1;
    config.rpc.confirmation_max_polls = 3;
    config.wallet.mnemonic_word_count = 12;
    config
}

pub struct TestApp {
    pub dir: TempDir,
    pub state: Arc<AppState>,
    pub ethereum: Arc<MockChainClient>,
    pub solana: Arc<MockChainClient>,
}

/// 创建测试应用状态
pub fn create_test_app(eth_balance: u128, sol_balance: u128) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let storage: Arc<dyn KeyValueStore> = Arc::new(FileStorage::open(dir.path()).unwrap());
    let ethereum = Arc::new(MockChainClient::new(Chain::Ethereum).with_balance(eth_balance));
    let solana = Arc::new(MockChainClient::new(Chain::Solana).with_balance(sol_balance));

    let state = AppState::with_components(
        test_config(dir.path()),
        storage,
        ethereum.clone(),
        solana.clone(),
    )
    .unwrap();
    let state = Arc::new(state);

    TestApp {
        dir,
        state,
        ethereum,
        solana,
    }
}
