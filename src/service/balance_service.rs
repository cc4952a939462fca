// 余额快照服务
// 转账校验只认最近一次拉取的快照；拉取与提交之间不加锁
// 只缓存钱包列表里的地址，账户删除时一并清掉

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    domain::{
        chain::{Chain, Network},
        transfer::BalanceSnapshot,
    },
    error::AppError,
    infrastructure::log_redact::redact_address,
    service::chain_client::ChainClient,
};

type SnapshotKey = (Chain, Network, String);

#[derive(Default)]
pub struct BalanceService {
    snapshots: RwLock<HashMap<SnapshotKey, BalanceSnapshot>>,
}

fn snapshot_key(chain: Chain, network: Network, address: &str) -> SnapshotKey {
    let address = match chain {
        Chain::Ethereum => address.trim().to_lowercase(),
        Chain::Solana => address.trim().to_string(),
    };
    (chain, network, address)
}

impl BalanceService {
    pub fn new() -> Self {
        Self::default()
    }

    /// 只拉取，不写入快照
    pub async fn fetch(
        &self,
        client: &dyn ChainClient,
        network: Network,
        address: &str,
    ) -> Result<BalanceSnapshot, AppError> {
        let chain = client.chain();
        let balance = client.get_balance(network, address).await.map_err(|e| {
            tracing::warn!(
                chain = %chain,
                network = %network,
                address = %redact_address(address),
                error = %e,
                "failed to fetch balance"
            );
            AppError::rpc_error(format!("failed to fetch balance: {:#}", e))
        })?;

        Ok(BalanceSnapshot {
            chain,
            network,
            address: address.trim().to_string(),
            balance,
            fetched_at: Utc::now(),
        })
    }

    /// 从链上拉取余额并替换快照
    pub async fn refresh(
        &self,
        client: &dyn ChainClient,
        network: Network,
        address: &str,
    ) -> Result<BalanceSnapshot, AppError> {
        let chain = client.chain();
        let snapshot = self.fetch(client, network, address).await?;
        self.snapshots
            .write()
            .await
            .insert(snapshot_key(chain, network, address), snapshot.clone());

        tracing::debug!(
            chain = %chain,
            network = %network,
            address = %redact_address(address),
            balance = %snapshot.display_balance(),
            "balance refreshed"
        );
        Ok(snapshot)
    }

    pub async fn snapshot(
        &self,
        chain: Chain,
        network: Network,
        address: &str,
    ) -> Option<BalanceSnapshot> {
        self.snapshots
            .read()
            .await
            .get(&snapshot_key(chain, network, address))
            .cloned()
    }

    /// 删除某个地址在所有网络上的快照
    pub async fn forget(&self, chain: Chain, address: &str) {
        let (_, _, address) = snapshot_key(chain, Network::default(), address);
        self.snapshots
            .write()
            .await
            .retain(|(c, _, a), _| !(*c == chain && *a == address));
    }

    pub async fn forget_chain(&self, chain: Chain) {
        self.snapshots.write().await.retain(|(c, _, _), _| *c != chain);
    }

    pub async fn cached_count(&self) -> usize {
        self.snapshots.read().await.len()
    }
}
