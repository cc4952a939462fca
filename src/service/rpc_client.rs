// JSON-RPC 2.0 HTTP 客户端
// 不做自动重试：失败直接返回给调用方
// 端点 URL 可能带 API key（如 /v2/<key>），日志和错误里只出现主机名

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use anyhow::{Context, Result};
use serde_json::Value;

use crate::infrastructure::rpc_validator;

pub struct JsonRpcClient {
    http_client: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            next_id: AtomicU64::new(1),
        })
    }

    /// 发送请求并返回 `result` 字段
    pub async fn call(&self, url: &str, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let host = endpoint_host(url);
        tracing::debug!(method = %method, endpoint = %host, id = id, "sending RPC request");

        let response = self
            .http_client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("Failed to send {} request to {}", method, host))?;

        let status = response.status();
        let json: Value = response
            .json()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("Failed to parse {} response (HTTP {})", method, status))?;

        rpc_validator::validate_rpc_response(json).with_context(|| format!("{} failed", method))
    }
}

/// 只保留主机名
pub fn endpoint_host(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "<invalid endpoint>".to_string())
}
