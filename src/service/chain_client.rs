//! 链客户端抽象
//!
//! 提交器、余额与历史服务只依赖这个 trait，测试中可替换为 mock。

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{
    chain::{Chain, Network},
    history::HistoryEntry,
};

/// 签名前需要从链上取得的数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningContext {
    Ethereum {
        nonce: u64,
        /// wei
        gas_price: u128,
        chain_id: u64,
    },
    Solana {
        recent_blockhash: [u8; 32],
    },
}

/// 已签名、待广播的交易
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedTransaction {
    pub chain: Chain,
    /// Ethereum: 0x 前缀 RLP hex；Solana: base64 wire 格式
    pub encoded: String,
    /// 本地计算的交易标识：Ethereum 交易哈希 / Solana base58 签名
    pub tx_id: String,
}

/// 单次确认查询结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    Pending,
    /// Ethereum 区块号 / Solana slot
    Confirmed { block: u64 },
    Failed { reason: String },
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    fn chain(&self) -> Chain;

    /// 原生币余额（wei / lamports）
    async fn get_balance(&self, network: Network, address: &str) -> Result<u128>;

    async fn signing_context(&self, network: Network, from: &str) -> Result<SigningContext>;

    /// 广播，返回节点给出的交易标识
    async fn broadcast(&self, network: Network, tx: &SignedTransaction) -> Result<String>;

    async fn confirmation_status(&self, network: Network, tx_id: &str)
        -> Result<ConfirmationStatus>;

    /// 最近的转账记录，已去重并按时间倒序
    async fn transaction_history(&self, network: Network, address: &str)
        -> Result<Vec<HistoryEntry>>;
}
