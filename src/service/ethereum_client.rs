// Ethereum JSON-RPC 客户端
// 余额、nonce/gasPrice、广播、回执轮询与 Alchemy 资产转账历史

use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::{
    config::RpcConfig,
    domain::{
        chain::{Chain, Network},
        history::{dedupe_and_sort, HistoryEntry, TransferDirection, TxOutcome},
    },
    infrastructure::rpc_validator,
    service::{
        chain_client::{ChainClient, ConfirmationStatus, SignedTransaction, SigningContext},
        rpc_client::JsonRpcClient,
    },
};

pub const MAINNET_CHAIN_ID: u64 = 1;
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;

/// 每个方向最多取回的转账条数（0x14 = 20）
const HISTORY_MAX_COUNT: &str = "0x14";

pub fn chain_id(network: Network) -> u64 {
    match network {
        Network::Mainnet => MAINNET_CHAIN_ID,
        Network::Testnet => SEPOLIA_CHAIN_ID,
    }
}

pub struct EthereumClient {
    rpc: JsonRpcClient,
    config: RpcConfig,
}

impl EthereumClient {
    pub fn new(rpc: JsonRpcClient, config: RpcConfig) -> Self {
        Self { rpc, config }
    }

    fn url(&self, network: Network) -> &str {
        self.config.url_for(Chain::Ethereum, network)
    }

    async fn asset_transfers(
        &self,
        network: Network,
        address_field: &str,
        address: &str,
        direction: TransferDirection,
    ) -> Result<Vec<HistoryEntry>> {
        let mut filter = json!({
            "fromBlock": "0x0",
            "category": ["external", "internal", "erc20", "erc721", "erc1155"],
            "withMetadata": true,
            "excludeZeroValue": true,
            "maxCount": HISTORY_MAX_COUNT,
        });
        filter[address_field] = Value::String(address.to_string());

        let result = self
            .rpc
            .call(self.url(network), "alchemy_getAssetTransfers", json!([filter]))
            .await?;
        Ok(parse_asset_transfers(&result, direction))
    }
}

#[async_trait]
impl ChainClient for EthereumClient {
    fn chain(&self) -> Chain {
        Chain::Ethereum
    }

    async fn get_balance(&self, network: Network, address: &str) -> Result<u128> {
        let result = self
            .rpc
            .call(self.url(network), "eth_getBalance", json!([address, "latest"]))
            .await?;
        let hex = result.as_str().context("eth_getBalance result is not a string")?;
        rpc_validator::validate_balance(hex)
    }

    async fn signing_context(&self, network: Network, from: &str) -> Result<SigningContext> {
        let url = self.url(network);
        let (nonce, gas_price) = tokio::try_join!(
            self.rpc
                .call(url, "eth_getTransactionCount", json!([from, "pending"])),
            self.rpc.call(url, "eth_gasPrice", json!([])),
        )?;

        let nonce = rpc_validator::validate_nonce(
            nonce.as_str().context("eth_getTransactionCount result is not a string")?,
        )?;
        let gas_price = rpc_validator::validate_quantity(
            gas_price.as_str().context("eth_gasPrice result is not a string")?,
        )?;

        Ok(SigningContext::Ethereum {
            nonce,
            gas_price,
            chain_id: chain_id(network),
        })
    }

    async fn broadcast(&self, network: Network, tx: &SignedTransaction) -> Result<String> {
        if !tx.encoded.starts_with("0x") || tx.encoded.len() < 10 {
            anyhow::bail!("Invalid raw transaction format");
        }

        let result = self
            .rpc
            .call(self.url(network), "eth_sendRawTransaction", json!([tx.encoded]))
            .await?;
        let hash = rpc_validator::validate_tx_hash(
            result.as_str().context("eth_sendRawTransaction result is not a string")?,
        )?;

        if !hash.eq_ignore_ascii_case(&tx.tx_id) {
            tracing::warn!(local = %tx.tx_id, node = %hash, "node returned a different tx hash");
        }
        Ok(hash)
    }

    async fn confirmation_status(
        &self,
        network: Network,
        tx_id: &str,
    ) -> Result<ConfirmationStatus> {
        let result = self
            .rpc
            .call(self.url(network), "eth_getTransactionReceipt", json!([tx_id]))
            .await?;
        parse_receipt(&result)
    }

    async fn transaction_history(
        &self,
        network: Network,
        address: &str,
    ) -> Result<Vec<HistoryEntry>> {
        let (sent, received) = tokio::try_join!(
            self.asset_transfers(network, "fromAddress", address, TransferDirection::Sent),
            self.asset_transfers(network, "toAddress", address, TransferDirection::Received),
        )?;

        let mut all = sent;
        all.extend(received);
        Ok(dedupe_and_sort(all))
    }
}

/// 解析 eth_getTransactionReceipt；null 表示尚未打包
pub fn parse_receipt(receipt: &Value) -> Result<ConfirmationStatus> {
    if receipt.is_null() {
        return Ok(ConfirmationStatus::Pending);
    }

    let block = match receipt.get("blockNumber").and_then(Value::as_str) {
        Some(hex) => rpc_validator::validate_nonce(hex).context("Invalid receipt blockNumber")?,
        None => return Ok(ConfirmationStatus::Pending),
    };

    match receipt.get("status").and_then(Value::as_str) {
        Some("0x1") => Ok(ConfirmationStatus::Confirmed { block }),
        Some("0x0") => Ok(ConfirmationStatus::Failed {
            reason: format!("transaction reverted in block {}", block),
        }),
        // 拜占庭分叉前的回执没有 status 字段
        None => Ok(ConfirmationStatus::Confirmed { block }),
        Some(other) => anyhow::bail!("Unexpected receipt status: {}", other),
    }
}

/// 解析 alchemy_getAssetTransfers 的 result.transfers
pub fn parse_asset_transfers(result: &Value, direction: TransferDirection) -> Vec<HistoryEntry> {
    let Some(transfers) = result.get("transfers").and_then(Value::as_array) else {
        return Vec::new();
    };

    transfers
        .iter()
        .filter_map(|tx| {
            let hash = tx.get("hash").and_then(Value::as_str)?;
            let str_field = |name: &str| {
                tx.get(name)
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown")
                    .to_string()
            };

            let timestamp_ms = tx
                .pointer("/metadata/blockTimestamp")
                .and_then(Value::as_str)
                .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.timestamp_millis())
                .unwrap_or(0);

            let block_number = tx
                .get("blockNum")
                .and_then(Value::as_str)
                .and_then(|s| u64::from_str_radix(s.trim_start_matches("0x"), 16).ok())
                .unwrap_or(0);

            Some(HistoryEntry {
                hash: hash.to_string(),
                from: str_field("from"),
                to: str_field("to"),
                value: tx.get("value").map(parse_value).unwrap_or_default(),
                asset: tx
                    .get("asset")
                    .and_then(Value::as_str)
                    .unwrap_or("ETH")
                    .to_string(),
                timestamp_ms,
                direction,
                status: TxOutcome::Confirmed,
                block_number,
                category: tx
                    .get("category")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                fee: None,
            })
        })
        .collect()
}

fn parse_value(value: &Value) -> Decimal {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => return Decimal::ZERO,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .unwrap_or(Decimal::ZERO)
}
