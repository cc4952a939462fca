// Solana JSON-RPC 客户端
// 余额、最新 blockhash、广播、签名状态与最近交易历史

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
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

/// 历史记录逐条拉取详情，数量保持较小
const HISTORY_LIMIT: usize = 10;
const LAMPORT_DECIMALS: u32 = 9;
const UNKNOWN: &str = "Unknown";

pub struct SolanaClient {
    rpc: JsonRpcClient,
    config: RpcConfig,
}

impl SolanaClient {
    pub fn new(rpc: JsonRpcClient, config: RpcConfig) -> Self {
        Self { rpc, config }
    }

    fn url(&self, network: Network) -> &str {
        self.config.url_for(Chain::Solana, network)
    }

    async fn history_entry(&self, network: Network, address: &str, sig: &Value) -> Option<HistoryEntry> {
        let signature = sig.get("signature").and_then(Value::as_str)?;
        let params = json!([
            signature,
            {"encoding": "jsonParsed", "maxSupportedTransactionVersion": 0}
        ]);

        match self.rpc.call(self.url(network), "getTransaction", params).await {
            Ok(Value::Null) => None,
            Ok(tx) => Some(parse_transaction(address, sig, &tx)),
            Err(e) => {
                tracing::warn!(signature = %signature, error = %e, "failed to fetch transaction details");
                Some(fallback_entry(sig))
            }
        }
    }
}

#[async_trait]
impl ChainClient for SolanaClient {
    fn chain(&self) -> Chain {
        Chain::Solana
    }

    async fn get_balance(&self, network: Network, address: &str) -> Result<u128> {
        let result = self
            .rpc
            .call(
                self.url(network),
                "getBalance",
                json!([address, {"commitment": "confirmed"}]),
            )
            .await?;
        let lamports = result
            .get("value")
            .and_then(Value::as_u64)
            .context("getBalance result has no value")?;
        Ok(u128::from(lamports))
    }

    async fn signing_context(&self, network: Network, _from: &str) -> Result<SigningContext> {
        let result = self
            .rpc
            .call(
                self.url(network),
                "getLatestBlockhash",
                json!([{"commitment": "confirmed"}]),
            )
            .await?;
        let blockhash = result
            .pointer("/value/blockhash")
            .and_then(Value::as_str)
            .context("getLatestBlockhash result has no blockhash")?;

        let bytes = bs58::decode(blockhash)
            .into_vec()
            .context("Blockhash is not valid base58")?;
        let recent_blockhash: [u8; 32] = bytes
            .try_into()
            .map_err(|_| anyhow::anyhow!("Blockhash must decode to 32 bytes"))?;

        Ok(SigningContext::Solana { recent_blockhash })
    }

    async fn broadcast(&self, network: Network, tx: &SignedTransaction) -> Result<String> {
        let result = self
            .rpc
            .call(
                self.url(network),
                "sendTransaction",
                json!([
                    tx.encoded,
                    {"encoding": "base64", "preflightCommitment": "confirmed"}
                ]),
            )
            .await?;
        let signature = rpc_validator::validate_signature(
            result.as_str().context("sendTransaction result is not a string")?,
        )?;

        if signature != tx.tx_id {
            tracing::warn!(local = %tx.tx_id, node = %signature, "node returned a different signature");
        }
        Ok(signature)
    }

    async fn confirmation_status(
        &self,
        network: Network,
        tx_id: &str,
    ) -> Result<ConfirmationStatus> {
        let result = self
            .rpc
            .call(
                self.url(network),
                "getSignatureStatuses",
                json!([[tx_id], {"searchTransactionHistory": true}]),
            )
            .await?;
        parse_signature_status(&result)
    }

    async fn transaction_history(
        &self,
        network: Network,
        address: &str,
    ) -> Result<Vec<HistoryEntry>> {
        let result = self
            .rpc
            .call(
                self.url(network),
                "getSignaturesForAddress",
                json!([address, {"limit": HISTORY_LIMIT}]),
            )
            .await?;

        let signatures = match result.as_array() {
            Some(list) if !list.is_empty() => list,
            _ => return Ok(Vec::new()),
        };

        let entries = join_all(
            signatures
                .iter()
                .take(HISTORY_LIMIT)
                .map(|sig| self.history_entry(network, address, sig)),
        )
        .await;

        Ok(dedupe_and_sort(entries.into_iter().flatten().collect()))
    }
}

/// 解析 getSignatureStatuses；只查询一个签名
pub fn parse_signature_status(result: &Value) -> Result<ConfirmationStatus> {
    let status = result
        .pointer("/value/0")
        .context("getSignatureStatuses result has no value")?;
    if status.is_null() {
        return Ok(ConfirmationStatus::Pending);
    }

    if let Some(err) = status.get("err").filter(|e| !e.is_null()) {
        return Ok(ConfirmationStatus::Failed {
            reason: err.to_string(),
        });
    }

    match status.get("confirmationStatus").and_then(Value::as_str) {
        Some("confirmed") | Some("finalized") => {
            let slot = status
                .get("slot")
                .and_then(Value::as_u64)
                .context("signature status has no slot")?;
            Ok(ConfirmationStatus::Confirmed { block: slot })
        }
        _ => Ok(ConfirmationStatus::Pending),
    }
}

fn lamports_to_sol(lamports: i128) -> Decimal {
    Decimal::try_from_i128_with_scale(lamports, LAMPORT_DECIMALS)
        .map(|d| d.normalize())
        .unwrap_or_default()
}

fn outcome(sig: &Value) -> TxOutcome {
    match sig.get("err") {
        Some(err) if !err.is_null() => TxOutcome::Failed,
        _ => TxOutcome::Confirmed,
    }
}

fn base_entry(sig: &Value) -> HistoryEntry {
    HistoryEntry {
        hash: sig
            .get("signature")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        from: UNKNOWN.to_string(),
        to: UNKNOWN.to_string(),
        value: Decimal::ZERO,
        asset: "SOL".to_string(),
        timestamp_ms: sig
            .get("blockTime")
            .and_then(Value::as_i64)
            .unwrap_or(0)
            .saturating_mul(1000),
        direction: TransferDirection::Unknown,
        status: outcome(sig),
        block_number: sig.get("slot").and_then(Value::as_u64).unwrap_or(0),
        category: None,
        fee: None,
    }
}

/// 详情拉取失败时的占位记录
pub fn fallback_entry(sig: &Value) -> HistoryEntry {
    HistoryEntry {
        fee: Some(Decimal::ZERO),
        ..base_entry(sig)
    }
}

/// 通过钱包账户的前后余额差推断方向、金额与对手方
pub fn parse_transaction(address: &str, sig: &Value, tx: &Value) -> HistoryEntry {
    let mut entry = base_entry(sig);
    let meta = tx.get("meta").filter(|m| !m.is_null());

    entry.fee = Some(
        meta.and_then(|m| m.get("fee"))
            .and_then(Value::as_i64)
            .map(|fee| lamports_to_sol(i128::from(fee)))
            .unwrap_or(Decimal::ZERO),
    );

    let Some(meta) = meta else {
        return entry;
    };
    let balances = |name: &str| -> Vec<i128> {
        meta.get(name)
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .map(|v| i128::from(v.as_u64().unwrap_or(0)))
                    .collect()
            })
            .unwrap_or_default()
    };
    let pre = balances("preBalances");
    let post = balances("postBalances");

    let account_keys: Vec<&str> = tx
        .pointer("/transaction/message/accountKeys")
        .and_then(Value::as_array)
        .map(|keys| {
            keys.iter()
                .map(|k| {
                    k.as_str()
                        .or_else(|| k.get("pubkey").and_then(Value::as_str))
                        .unwrap_or_default()
                })
                .collect()
        })
        .unwrap_or_default();

    let Some(wallet_index) = account_keys.iter().position(|k| *k == address) else {
        return entry;
    };

    let change_at = |i: usize| -> i128 {
        post.get(i).copied().unwrap_or(0) - pre.get(i).copied().unwrap_or(0)
    };
    let change = change_at(wallet_index);
    if change == 0 {
        return entry;
    }

    entry.value = lamports_to_sol(change.abs());
    let counterparty = |want_positive: bool| {
        (0..pre.len())
            .find(|&i| {
                let c = change_at(i);
                let matches = if want_positive { c > 0 } else { c < 0 };
                matches && account_keys.get(i).is_some_and(|k| *k != address)
            })
            .and_then(|i| account_keys.get(i))
            .map(|k| k.to_string())
            .unwrap_or_else(|| UNKNOWN.to_string())
    };

    if change > 0 {
        entry.direction = TransferDirection::Received;
        entry.to = address.to_string();
        entry.from = counterparty(false);
    } else {
        entry.direction = TransferDirection::Sent;
        entry.from = address.to_string();
        entry.to = counterparty(true);
    }
    entry
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    const WALLET: &str = "5omQJtDUHA3gMFdHEQg1zZSvcBUVzey5WaKWYRmqF1Vj";
    const OTHER: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
    const SYSTEM: &str = "11111111111111111111111111111111";

    fn sig() -> Value {
        json!({"signature": "sig1", "slot": 42, "blockTime": 1_700_000_000, "err": null})
    }

    #[test]
    fn test_parse_sent_transaction() {
        let tx = json!({
            "meta": {
                "fee": 5000,
                "preBalances": [2_000_000_000u64, 0, 1],
                "postBalances": [1_499_995_000u64, 500_000_000, 1]
            },
            "transaction": {"message": {"accountKeys": [
                {"pubkey": WALLET, "signer": true},
                {"pubkey": OTHER, "signer": false},
                SYSTEM
            ]}}
        });

        let entry = parse_transaction(WALLET, &sig(), &tx);
        assert_eq!(entry.direction, TransferDirection::Sent);
        assert_eq!(entry.from, WALLET);
        assert_eq!(entry.to, OTHER);
        assert_eq!(entry.value, Decimal::from_str("0.500005").unwrap());
        assert_eq!(entry.fee, Some(Decimal::from_str("0.000005").unwrap()));
        assert_eq!(entry.timestamp_ms, 1_700_000_000_000);
        assert_eq!(entry.block_number, 42);
        assert_eq!(entry.status, TxOutcome::Confirmed);
    }

    #[test]
    fn test_parse_received_transaction() {
        let tx = json!({
            "meta": {
                "fee": 5000,
                "preBalances": [3_000_000_000u64, 1_000_000_000u64],
                "postBalances": [1_999_995_000u64, 2_000_000_000u64]
            },
            "transaction": {"message": {"accountKeys": [OTHER, WALLET]}}
        });

        let entry = parse_transaction(WALLET, &sig(), &tx);
        assert_eq!(entry.direction, TransferDirection::Received);
        assert_eq!(entry.from, OTHER);
        assert_eq!(entry.to, WALLET);
        assert_eq!(entry.value, Decimal::ONE);
    }

    #[test]
    fn test_parse_unrelated_transaction() {
        let tx = json!({
            "meta": {"fee": 5000, "preBalances": [10], "postBalances": [5]},
            "transaction": {"message": {"accountKeys": [OTHER]}}
        });
        let entry = parse_transaction(WALLET, &sig(), &tx);
        assert_eq!(entry.direction, TransferDirection::Unknown);
        assert_eq!(entry.from, UNKNOWN);
        assert_eq!(entry.value, Decimal::ZERO);
    }

    #[test]
    fn test_fallback_entry_keeps_status() {
        let failed = json!({"signature": "sig2", "slot": 7, "err": {"InstructionError": [0, "Custom"]}});
        let entry = fallback_entry(&failed);
        assert_eq!(entry.status, TxOutcome::Failed);
        assert_eq!(entry.timestamp_ms, 0);
        assert_eq!(entry.fee, Some(Decimal::ZERO));
        assert_eq!(entry.to, UNKNOWN);
    }

    #[test]
    fn test_parse_signature_status() {
        let pending = json!({"value": [null]});
        assert_eq!(
            parse_signature_status(&pending).unwrap(),
            ConfirmationStatus::Pending
        );

        let processed = json!({"value": [{"slot": 9, "confirmationStatus": "processed", "err": null}]});
        assert_eq!(
            parse_signature_status(&processed).unwrap(),
            ConfirmationStatus::Pending
        );

        let confirmed = json!({"value": [{"slot": 9, "confirmationStatus": "finalized", "err": null}]});
        assert_eq!(
            parse_signature_status(&confirmed).unwrap(),
            ConfirmationStatus::Confirmed { block: 9 }
        );

        let failed = json!({"value": [{"slot": 9, "confirmationStatus": "confirmed", "err": {"InsufficientFundsForRent": {"account_index": 0}}}]});
        assert!(matches!(
            parse_signature_status(&failed).unwrap(),
            ConfirmationStatus::Failed { .. }
        ));
    }
}
