//! 助记词与钱包管理 API

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    api::{
        parse_chain,
        response::{success_response, success_response_with_message, ApiResult},
    },
    app_state::AppState,
    domain::{
        chain::{Chain, ChainInfo},
        mnemonic,
        wallet_store::WalletEntry,
    },
    error::AppError,
    infrastructure::log_redact::redact_hex_string,
};

// ============ 链与偏好 ============

#[derive(Debug, Serialize)]
pub struct NetworkView {
    pub id: &'static str,
    pub name: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ChainView {
    #[serde(flatten)]
    pub info: ChainInfo,
    pub networks: Vec<NetworkView>,
}

/// GET /api/v1/chains
pub async fn list_chains() -> ApiResult<Vec<ChainView>> {
    use crate::domain::chain::Network;

    let chains = Chain::ALL
        .iter()
        .map(|chain| ChainView {
            info: chain.info(),
            networks: [Network::Mainnet, Network::Testnet]
                .iter()
                .map(|n| NetworkView {
                    id: n.as_str(),
                    name: n.display_name(*chain),
                })
                .collect(),
        })
        .collect();
    success_response(chains)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChainPreference {
    pub chain: String,
}

/// GET /api/v1/preferences/chain
pub async fn get_selected_chain(State(state): State<Arc<AppState>>) -> ApiResult<ChainPreference> {
    success_response(ChainPreference {
        chain: state.wallet_service.selected_chain().await.as_str().to_string(),
    })
}

/// PUT /api/v1/preferences/chain
pub async fn set_selected_chain(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChainPreference>,
) -> ApiResult<ChainPreference> {
    let chain = parse_chain(&req.chain)?;
    state.wallet_service.set_selected_chain(chain).await?;
    success_response(ChainPreference {
        chain: chain.as_str().to_string(),
    })
}

// ============ 助记词 ============

#[derive(Debug, Deserialize)]
pub struct MnemonicRequest {
    pub mnemonic: String,
}

#[derive(Debug, Serialize)]
pub struct MnemonicValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// POST /api/v1/mnemonic/validate
pub async fn validate_mnemonic(Json(req): Json<MnemonicRequest>) -> ApiResult<MnemonicValidation> {
    let result = match mnemonic::check(&req.mnemonic) {
        Ok(()) => MnemonicValidation {
            valid: true,
            reason: None,
        },
        Err(e) => MnemonicValidation {
            valid: false,
            reason: Some(e.to_string()),
        },
    };
    success_response(result)
}

#[derive(Debug, Serialize)]
pub struct MnemonicView {
    pub chain: Chain,
    pub mnemonic: Option<String>,
}

/// GET /api/v1/:chain/mnemonic
pub async fn get_mnemonic(
    State(state): State<Arc<AppState>>,
    Path(chain): Path<String>,
) -> ApiResult<MnemonicView> {
    let chain = parse_chain(&chain)?;
    let mnemonic = state.wallet_service.mnemonic(chain).await;
    success_response(MnemonicView { chain, mnemonic })
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateMnemonicRequest {
    pub word_count: Option<usize>,
}

/// POST /api/v1/:chain/mnemonic
pub async fn generate_mnemonic(
    State(state): State<Arc<AppState>>,
    Path(chain): Path<String>,
    body: Option<Json<GenerateMnemonicRequest>>,
) -> ApiResult<MnemonicView> {
    let chain = parse_chain(&chain)?;
    let req = body.map(|Json(b)| b).unwrap_or_default();
    let phrase = state
        .wallet_service
        .generate_mnemonic(chain, req.word_count)
        .await?;
    state.balance_service.forget_chain(chain).await;
    success_response_with_message(
        MnemonicView {
            chain,
            mnemonic: Some(phrase),
        },
        "seed phrase generated, existing wallets cleared",
    )
}

/// POST /api/v1/:chain/mnemonic/import
pub async fn import_mnemonic(
    State(state): State<Arc<AppState>>,
    Path(chain): Path<String>,
    Json(req): Json<MnemonicRequest>,
) -> ApiResult<MnemonicView> {
    let chain = parse_chain(&chain)?;
    state
        .wallet_service
        .import_mnemonic(chain, &req.mnemonic)
        .await?;
    state.balance_service.forget_chain(chain).await;
    let mnemonic = state.wallet_service.mnemonic(chain).await;
    success_response_with_message(
        MnemonicView { chain, mnemonic },
        "seed phrase imported, existing wallets cleared",
    )
}

// ============ 钱包 ============

#[derive(Debug, Serialize)]
pub struct WalletView {
    pub id: String,
    pub index: u32,
    pub address: String,
    pub path: String,
    /// 未显式 reveal 时只显示首尾
    pub private_key: String,
}

impl WalletView {
    fn from_entry(entry: WalletEntry, reveal: bool) -> Self {
        let private_key = if reveal {
            entry.key.private_key
        } else {
            redact_hex_string(&entry.key.private_key, 6)
        };
        Self {
            id: entry.id,
            index: entry.index,
            address: entry.key.public_key,
            path: entry.key.path,
            private_key,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListWalletsQuery {
    #[serde(default)]
    pub reveal: bool,
}

#[derive(Debug, Serialize)]
pub struct ListWalletsResp {
    pub chain: Chain,
    pub next_index: u32,
    pub wallets: Vec<WalletView>,
}

/// GET /api/v1/:chain/wallets?reveal=bool
pub async fn list_wallets(
    State(state): State<Arc<AppState>>,
    Path(chain): Path<String>,
    Query(query): Query<ListWalletsQuery>,
) -> ApiResult<ListWalletsResp> {
    let chain = parse_chain(&chain)?;
    if query.reveal {
        tracing::warn!(chain = %chain, "private keys revealed over the API");
    }

    let wallets = state
        .wallet_service
        .list(chain)
        .await
        .into_iter()
        .map(|e| WalletView::from_entry(e, query.reveal))
        .collect();
    success_response(ListWalletsResp {
        chain,
        next_index: state.wallet_service.next_index(chain).await,
        wallets,
    })
}

/// POST /api/v1/:chain/wallets
pub async fn add_wallet(
    State(state): State<Arc<AppState>>,
    Path(chain): Path<String>,
) -> ApiResult<WalletView> {
    let chain = parse_chain(&chain)?;
    let entry = state.wallet_service.add_account(chain).await?;
    success_response(WalletView::from_entry(entry, false))
}

#[derive(Debug, Serialize)]
pub struct RemovedResp {
    pub removed: usize,
}

/// DELETE /api/v1/:chain/wallets
pub async fn clear_wallets(
    State(state): State<Arc<AppState>>,
    Path(chain): Path<String>,
) -> ApiResult<RemovedResp> {
    let chain = parse_chain(&chain)?;
    let removed = state.wallet_service.list(chain).await.len();
    state.wallet_service.clear(chain).await?;
    state.balance_service.forget_chain(chain).await;
    success_response_with_message(RemovedResp { removed }, "all wallets and seed phrase cleared")
}

/// DELETE /api/v1/:chain/wallets/:id
pub async fn remove_wallet(
    State(state): State<Arc<AppState>>,
    Path((chain, id)): Path<(String, String)>,
) -> ApiResult<WalletView> {
    let chain = parse_chain(&chain)?;
    if id.trim().is_empty() {
        return Err(AppError::bad_request("wallet id is required"));
    }
    let entry = state.wallet_service.remove_account(chain, &id).await?;
    state
        .balance_service
        .forget(chain, entry.address())
        .await;
    success_response(WalletView::from_entry(entry, false))
}
