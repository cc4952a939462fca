//! 余额、转账、历史与外链 API

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    api::{
        parse_chain,
        response::{success_response, ApiResult},
    },
    app_state::AppState,
    domain::{
        chain::{Chain, Network},
        history::HistoryEntry,
        transfer::{BalanceSnapshot, SendRequest},
    },
    error::AppError,
    infrastructure::log_redact::redact_address,
    service::SubmissionReceipt,
    utils::AddressValidator,
};

#[derive(Debug, Default, Deserialize)]
pub struct NetworkQuery {
    pub network: Option<String>,
}

impl NetworkQuery {
    /// 缺省为测试网
    fn network(&self) -> Result<Network, AppError> {
        match self.network.as_deref() {
            None | Some("") => Ok(Network::default()),
            Some(s) => s
                .parse()
                .map_err(|_| AppError::bad_request(format!("unknown network: {}", s))),
        }
    }
}

fn check_address(chain: Chain, address: &str) -> Result<(), AppError> {
    if AddressValidator::validate(chain, address) {
        Ok(())
    } else {
        Err(AppError::invalid_address(format!(
            "invalid {} address: {}",
            chain, address
        )))
    }
}

#[derive(Debug, Serialize)]
pub struct BalanceView {
    pub chain: Chain,
    pub network: Network,
    pub address: String,
    pub symbol: &'static str,
    /// 十进制显示值
    pub balance: String,
    /// wei / lamports
    pub balance_base_units: String,
    pub fetched_at: DateTime<Utc>,
}

impl From<BalanceSnapshot> for BalanceView {
    fn from(s: BalanceSnapshot) -> Self {
        Self {
            symbol: s.chain.info().symbol,
            balance: s.display_balance(),
            balance_base_units: s.balance.to_string(),
            chain: s.chain,
            network: s.network,
            address: s.address,
            fetched_at: s.fetched_at,
        }
    }
}

/// GET /api/v1/:chain/accounts/:address/balance?network=
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path((chain, address)): Path<(String, String)>,
    Query(query): Query<NetworkQuery>,
) -> ApiResult<BalanceView> {
    let chain = parse_chain(&chain)?;
    let network = query.network()?;
    check_address(chain, &address)?;

    let client = state.client(chain);
    let snapshot = match state.wallet_service.find_by_address(chain, &address).await {
        Ok(entry) => {
            state
                .balance_service
                .refresh(client, network, entry.address())
                .await?
        }
        // 不在钱包列表里的地址只查询，不留快照
        Err(_) => state.balance_service.fetch(client, network, &address).await?,
    };
    success_response(snapshot.into())
}

/// POST /api/v1/:chain/accounts/:address/transfers?network=
pub async fn submit_transfer(
    State(state): State<Arc<AppState>>,
    Path((chain, address)): Path<(String, String)>,
    Query(query): Query<NetworkQuery>,
    Json(req): Json<SendRequest>,
) -> ApiResult<SubmissionReceipt> {
    let chain = parse_chain(&chain)?;
    let network = query.network()?;
    let entry = state.wallet_service.find_by_address(chain, &address).await?;
    let snapshot = state
        .balance_service
        .snapshot(chain, network, entry.address())
        .await;

    let client = state.client(chain);
    let receipt = state
        .submitter
        .submit(client, &entry.key, network, &req, snapshot.as_ref())
        .await?;

    // 成功后刷新余额，失败只记录
    if let Err(e) = state
        .balance_service
        .refresh(client, network, entry.address())
        .await
    {
        tracing::warn!(
            address = %redact_address(entry.address()),
            error = %e,
            "balance refresh after transfer failed"
        );
    }

    success_response(receipt)
}

/// GET /api/v1/:chain/accounts/:address/history?network=
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path((chain, address)): Path<(String, String)>,
    Query(query): Query<NetworkQuery>,
) -> ApiResult<Vec<HistoryEntry>> {
    let chain = parse_chain(&chain)?;
    let network = query.network()?;
    check_address(chain, &address)?;

    let history = state
        .client(chain)
        .transaction_history(network, &address)
        .await
        .map_err(|e| {
            tracing::warn!(
                chain = %chain,
                network = %network,
                address = %redact_address(&address),
                error = %e,
                "failed to fetch transaction history"
            );
            AppError::rpc_error(format!("failed to fetch transaction history: {:#}", e))
        })?;
    success_response(history)
}

#[derive(Debug, Serialize)]
pub struct LinkView {
    pub chain: Chain,
    pub network: Network,
    pub url: String,
}

/// GET /api/v1/:chain/explorer/:tx_hash?network=
pub async fn explorer_link(
    Path((chain, tx_hash)): Path<(String, String)>,
    Query(query): Query<NetworkQuery>,
) -> ApiResult<LinkView> {
    let chain = parse_chain(&chain)?;
    let network = query.network()?;
    if tx_hash.trim().is_empty() {
        return Err(AppError::bad_request("transaction hash is required"));
    }
    success_response(LinkView {
        chain,
        network,
        url: chain.explorer_tx_url(network, tx_hash.trim()),
    })
}

/// GET /api/v1/:chain/faucet?network=
pub async fn faucet_link(
    Path(chain): Path<String>,
    Query(query): Query<NetworkQuery>,
) -> ApiResult<LinkView> {
    let chain = parse_chain(&chain)?;
    let network = query.network()?;
    let url = chain.faucet_url(network).ok_or_else(|| {
        AppError::bad_request(format!(
            "faucet is only available on {}",
            Network::Testnet.display_name(chain)
        ))
    })?;
    success_response(LinkView {
        chain,
        network,
        url: url.to_string(),
    })
}
