//! 转账请求与余额快照

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::chain::{Chain, Network};
use crate::{
    error::AppError,
    utils::{
        address_validator::AddressValidator,
        amount::{self, Rounding},
    },
};

/// Ethereum 原生转账的最低 gas
pub const MIN_GAS_LIMIT: u64 = 21_000;

/// 用户提交的转账表单
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub to: String,
    /// ETH / SOL 十进制字符串
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub gas_limit: Option<u64>,
}

/// 通过校验的转账
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTransfer {
    pub chain: Chain,
    pub to: String,
    /// wei / lamports
    pub amount: u128,
    /// 仅 Ethereum
    pub gas_limit: u64,
}

/// 最近一次拉取的余额
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub chain: Chain,
    pub network: Network,
    pub address: String,
    /// 最小单位
    pub balance: u128,
    pub fetched_at: DateTime<Utc>,
}

impl BalanceSnapshot {
    pub fn display_balance(&self) -> String {
        amount::format_base_units(self.balance, self.chain.decimals())
    }
}

impl SendRequest {
    /// 顺序：必填 → 地址 → 金额 → 余额 → gas
    pub fn validate(
        &self,
        chain: Chain,
        snapshot: Option<&BalanceSnapshot>,
    ) -> Result<ValidatedTransfer, AppError> {
        let to = self.to.trim();
        if to.is_empty() || self.amount.trim().is_empty() {
            return Err(AppError::validation_failed(
                "recipient and amount are required",
            ));
        }

        if !AddressValidator::validate(chain, to) {
            return Err(AppError::invalid_address(format!(
                "invalid {} recipient address",
                chain
            )));
        }

        let rounding = match chain {
            Chain::Ethereum => Rounding::Reject,
            Chain::Solana => Rounding::Truncate,
        };
        let amount = amount::to_base_units(&self.amount, chain.decimals(), rounding)
            .map_err(|e| AppError::invalid_amount(e.to_string()))?;

        let snapshot = snapshot.ok_or_else(|| {
            AppError::insufficient_balance("balance has not been fetched for this account")
        })?;
        if amount > snapshot.balance {
            return Err(AppError::insufficient_balance(format!(
                "amount exceeds balance of {} {}",
                snapshot.display_balance(),
                chain.info().symbol
            )));
        }

        let gas_limit = self.gas_limit.unwrap_or(MIN_GAS_LIMIT);
        if chain == Chain::Ethereum && gas_limit < MIN_GAS_LIMIT {
            return Err(AppError::validation_failed(format!(
                "gas limit must be at least {}",
                MIN_GAS_LIMIT
            )));
        }

        Ok(ValidatedTransfer {
            chain,
            to: to.to_string(),
            amount,
            gas_limit,
        })
    }
}
