use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{
        header::{
            CACHE_CONTROL, ORIGIN, PRAGMA, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
        HeaderValue, Method,
    },
    middleware::{from_fn, from_fn_with_state, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::{
    api::response::{success_response, ApiResult},
    app_state::AppState,
    domain::chain::Chain,
    error::AppError,
};

pub mod response; // 统一响应格式
pub mod transaction_api;
pub mod wallet_api;

/// 路径中的链标识，接受别名
pub(crate) fn parse_chain(raw: &str) -> Result<Chain, AppError> {
    raw.parse()
        .map_err(|_| AppError::chain_not_supported(format!("unsupported chain: {}", raw)))
}

#[derive(Debug, Serialize)]
pub struct Healthz {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn healthz() -> ApiResult<Healthz> {
    success_response(Healthz {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn routes(state: Arc<AppState>) -> Router {
    let allowed_origin = state
        .config
        .server
        .allowed_origin
        .as_deref()
        .and_then(|origin| HeaderValue::from_str(origin).ok());
    let cors = cors_layer(allowed_origin.clone());

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/v1/chains", get(wallet_api::list_chains))
        .route(
            "/api/v1/preferences/chain",
            get(wallet_api::get_selected_chain).put(wallet_api::set_selected_chain),
        )
        .route(
            "/api/v1/mnemonic/validate",
            post(wallet_api::validate_mnemonic),
        )
        .route(
            "/api/v1/:chain/mnemonic",
            get(wallet_api::get_mnemonic).post(wallet_api::generate_mnemonic),
        )
        .route(
            "/api/v1/:chain/mnemonic/import",
            post(wallet_api::import_mnemonic),
        )
        .route(
            "/api/v1/:chain/wallets",
            get(wallet_api::list_wallets)
                .post(wallet_api::add_wallet)
                .delete(wallet_api::clear_wallets),
        )
        .route(
            "/api/v1/:chain/wallets/:id",
            delete(wallet_api::remove_wallet),
        )
        .route(
            "/api/v1/:chain/accounts/:address/balance",
            get(transaction_api::get_balance),
        )
        .route(
            "/api/v1/:chain/accounts/:address/transfers",
            post(transaction_api::submit_transfer),
        )
        .route(
            "/api/v1/:chain/accounts/:address/history",
            get(transaction_api::get_history),
        )
        .route(
            "/api/v1/:chain/explorer/:tx_hash",
            get(transaction_api::explorer_link),
        )
        .route("/api/v1/:chain/faucet", get(transaction_api::faucet_link))
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(set_request_id))
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(from_fn(add_security_headers))
                .layer(from_fn_with_state(allowed_origin, reject_foreign_origin)),
        )
        .with_state(state)
}

/// 只放行配置的前端来源；未配置时不发出任何 CORS 允许头
fn cors_layer(allowed_origin: Option<HeaderValue>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    match allowed_origin {
        Some(origin) => layer.allow_origin(origin),
        None => layer,
    }
}

/// 带有未配置 Origin 的请求一律 403，包括不经预检的简单请求
async fn reject_foreign_origin(
    State(allowed_origin): State<Option<HeaderValue>>,
    req: Request,
    next: Next,
) -> Response {
    if let Some(origin) = req.headers().get(ORIGIN) {
        if allowed_origin.as_ref() != Some(origin) {
            tracing::warn!(
                origin = %String::from_utf8_lossy(origin.as_bytes()),
                path = %req.uri().path(),
                "rejected cross-origin request"
            );
            return AppError::forbidden("cross-origin requests are not allowed").into_response();
        }
    }
    next.run(req).await
}

/// 响应里可能有助记词和私钥，禁止缓存
async fn add_security_headers(req: Request, next: Next) -> Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();

    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    resp
}

async fn set_request_id(mut req: Request, next: Next) -> Response {
    let req_id = HeaderValue::from_str(&Uuid::new_v4().to_string())
        .unwrap_or(HeaderValue::from_static("gen-failed"));

    req.headers_mut().insert("x-request-id", req_id.clone());
    let mut resp = next.run(req).await;
    resp.headers_mut().insert("x-request-id", req_id);
    resp
}
