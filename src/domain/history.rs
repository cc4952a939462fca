//! 交易历史记录

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferDirection {
    Sent,
    Received,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxOutcome {
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub hash: String,
    pub from: String,
    pub to: String,
    pub value: Decimal,
    pub asset: String,
    /// 毫秒时间戳，未知为 0
    pub timestamp_ms: i64,
    pub direction: TransferDirection,
    pub status: TxOutcome,
    /// Ethereum 区块号 / Solana slot
    pub block_number: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// 原生币计价手续费
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<Decimal>,
}

/// 按 (hash, from, to) 去重，保留第一次出现，并按时间倒序
pub fn dedupe_and_sort(entries: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
    let mut seen = HashSet::new();
    let mut unique: Vec<HistoryEntry> = entries
        .into_iter()
        .filter(|e| {
            seen.insert((
                e.hash.clone(),
                e.from.to_lowercase(),
                e.to.to_lowercase(),
            ))
        })
        .collect();
    unique.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
    unique
}
