//! 交易提交器
//!
//! 校验 → 签名 → 广播 → 轮询确认，全程由 `SubmissionTracker` 记录状态。
//! 广播之后不可取消，任何步骤都不自动重试。

use std::time::Duration;

use serde::Serialize;

use crate::{
    config::RpcConfig,
    domain::{
        chain::{Chain, Network},
        derivation::AccountKey,
        submission_state::{SubmissionState, SubmissionTracker},
        transfer::{BalanceSnapshot, SendRequest},
    },
    error::AppError,
    infrastructure::log_redact::{redact_address, redact_secrets},
    service::{
        chain_client::{ChainClient, ConfirmationStatus},
        transaction_builder,
    },
};

/// 已确认交易的回执
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub chain: Chain,
    pub network: Network,
    pub tx_hash: String,
    /// Ethereum 区块号 / Solana slot
    pub block_number: u64,
    pub explorer_url: String,
    pub states: Vec<SubmissionState>,
}

pub struct TransactionSubmitter {
    poll_interval: Duration,
    max_polls: u32,
}

impl TransactionSubmitter {
    pub fn new(poll_interval: Duration, max_polls: u32) -> Self {
        Self {
            poll_interval,
            max_polls,
        }
    }

    pub fn from_config(config: &RpcConfig) -> Self {
        Self::new(
            Duration::from_millis(config.confirmation_poll_interval_ms),
            config.confirmation_max_polls,
        )
    }

    pub async fn submit(
        &self,
        client: &dyn ChainClient,
        key: &AccountKey,
        network: Network,
        request: &SendRequest,
        snapshot: Option<&BalanceSnapshot>,
    ) -> Result<SubmissionReceipt, AppError> {
        let mut tracker = SubmissionTracker::new();
        let chain = client.chain();

        match self
            .run(&mut tracker, client, key, network, request, snapshot)
            .await
        {
            Ok((tx_hash, block_number)) => {
                tracing::info!(
                    chain = %chain,
                    network = %network,
                    from = %redact_address(&key.public_key),
                    tx_hash = %tx_hash,
                    block = block_number,
                    "transfer confirmed"
                );
                Ok(SubmissionReceipt {
                    chain,
                    network,
                    explorer_url: chain.explorer_tx_url(network, &tx_hash),
                    tx_hash,
                    block_number,
                    states: tracker.into_history(),
                })
            }
            Err(err) => {
                tracker.fail();
                tracing::warn!(
                    chain = %chain,
                    network = %network,
                    from = %redact_address(&key.public_key),
                    code = err.code.as_str(),
                    error = %redact_secrets(&err.message),
                    states = ?tracker.history(),
                    "transfer failed"
                );
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        tracker: &mut SubmissionTracker,
        client: &dyn ChainClient,
        key: &AccountKey,
        network: Network,
        request: &SendRequest,
        snapshot: Option<&BalanceSnapshot>,
    ) -> Result<(String, u64), AppError> {
        let chain = client.chain();
        if key.chain != chain {
            return Err(AppError::chain_not_supported(format!(
                "{} key cannot be submitted through the {} client",
                key.chain, chain
            )));
        }

        // Validating：不发起任何 RPC
        advance(tracker, SubmissionState::Validating)?;
        if let Some(s) = snapshot {
            let same_account = match chain {
                Chain::Ethereum => s.address.eq_ignore_ascii_case(&key.public_key),
                Chain::Solana => s.address == key.public_key,
            };
            if s.chain != chain || s.network != network || !same_account {
                return Err(AppError::insufficient_balance(
                    "balance snapshot belongs to another account, refresh the balance first",
                ));
            }
        }
        let transfer = request.validate(chain, snapshot)?;

        // Signing
        advance(tracker, SubmissionState::Signing)?;
        let context = client
            .signing_context(network, &key.public_key)
            .await
            .map_err(|e| AppError::rpc_error(format!("failed to prepare transaction: {:#}", e)))?;
        let signed = transaction_builder::sign_transfer(key, &transfer, &context).map_err(|e| {
            AppError::transaction_failed(format!("failed to sign transaction: {:#}", e))
        })?;

        // Broadcasting
        advance(tracker, SubmissionState::Broadcasting)?;
        let tx_hash = client
            .broadcast(network, &signed)
            .await
            .map_err(|e| AppError::rpc_error(format!("broadcast rejected: {:#}", e)))?;
        tracing::info!(chain = %chain, network = %network, tx_hash = %tx_hash, "transaction broadcast");

        // Confirming
        advance(tracker, SubmissionState::Confirming)?;
        let block = self.wait_for_confirmation(client, network, &tx_hash).await?;
        advance(tracker, SubmissionState::Confirmed)?;

        Ok((tx_hash, block))
    }

    async fn wait_for_confirmation(
        &self,
        client: &dyn ChainClient,
        network: Network,
        tx_hash: &str,
    ) -> Result<u64, AppError> {
        for attempt in 1..=self.max_polls {
            let status = client
                .confirmation_status(network, tx_hash)
                .await
                .map_err(|e| {
                    AppError::rpc_error(format!(
                        "failed to query status of {}: {:#}",
                        tx_hash, e
                    ))
                })?;

            match status {
                ConfirmationStatus::Confirmed { block } => return Ok(block),
                ConfirmationStatus::Failed { reason } => {
                    return Err(AppError::transaction_failed(format!(
                        "transaction {} failed: {}",
                        tx_hash, reason
                    )))
                }
                ConfirmationStatus::Pending => {
                    tracing::debug!(tx_hash = %tx_hash, attempt = attempt, "transaction pending");
                    if attempt < self.max_polls {
                        tokio::time::sleep(self.poll_interval).await;
                    }
                }
            }
        }

        Err(AppError::confirmation_timeout(format!(
            "transaction {} not confirmed after {} polls",
            tx_hash, self.max_polls
        )))
    }
}

fn advance(tracker: &mut SubmissionTracker, target: SubmissionState) -> Result<(), AppError> {
    tracker
        .advance(target)
        .map_err(|e| AppError::internal(e.to_string()))
}
