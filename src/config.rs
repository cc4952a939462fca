//! 配置管理模块
//! 支持从环境变量和配置文件加载配置

use std::path::Path;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};

use crate::domain::{
    chain::{Chain, Network},
    derivation::SolanaDerivation,
    mnemonic::DEFAULT_WORD_COUNT,
};

/// 应用配置结构体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// 允许跨域访问的前端地址（如 `http://localhost:3000`），空表示拒绝一切跨域请求
    #[serde(default)]
    pub allowed_origin: Option<String>,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
    #[serde(default)]
    pub ansi: bool,
}

/// 区块链RPC配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    pub ethereum_mainnet_url: String,
    pub ethereum_sepolia_url: String,
    pub solana_mainnet_url: String,
    pub solana_devnet_url: String,
    pub request_timeout_secs: u64,
    pub confirmation_poll_interval_ms: u64,
    pub confirmation_max_polls: u32,
}

/// 本地存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    /// 设置后所有值 AES-256-GCM 加密落盘
    #[serde(default, skip_serializing)]
    pub passphrase: Option<String>,
}

/// 钱包派生配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    pub solana_derivation: SolanaDerivation,
    pub mnemonic_word_count: usize,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8787".into()),
            allowed_origin: std::env::var("ALLOWED_ORIGIN")
                .ok()
                .filter(|s| !s.is_empty()),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
            ansi: std::env::var("LOG_ANSI").map(|v| v == "1").unwrap_or(true),
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            ethereum_mainnet_url: std::env::var("ETHEREUM_MAINNET_RPC_URL")
                .unwrap_or_else(|_| "https://eth.llamarpc.com".into()),
            ethereum_sepolia_url: std::env::var("ETHEREUM_SEPOLIA_RPC_URL")
                .unwrap_or_else(|_| "https://ethereum-sepolia-rpc.publicnode.com".into()),
            solana_mainnet_url: std::env::var("SOLANA_MAINNET_RPC_URL")
                .unwrap_or_else(|_| "https://api.mainnet-beta.solana.com".into()),
            solana_devnet_url: std::env::var("SOLANA_DEVNET_RPC_URL")
                .unwrap_or_else(|_| "https://api.devnet.solana.com".into()),
            request_timeout_secs: env_or("RPC_TIMEOUT_SECS", 30),
            confirmation_poll_interval_ms: env_or("CONFIRMATION_POLL_INTERVAL_MS", 2_000),
            confirmation_max_polls: env_or("CONFIRMATION_MAX_POLLS", 90),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: std::env::var("WALLET_DATA_DIR").unwrap_or_else(|_| "./wallet-data".into()),
            passphrase: std::env::var("WALLET_STORAGE_PASSPHRASE")
                .ok()
                .filter(|s| !s.is_empty()),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            solana_derivation: env_or("SOLANA_DERIVATION", SolanaDerivation::Slip10),
            mnemonic_word_count: env_or("MNEMONIC_WORD_COUNT", DEFAULT_WORD_COUNT),
        }
    }
}

impl RpcConfig {
    pub fn url_for(&self, chain: Chain, network: Network) -> &str {
        match (chain, network) {
            (Chain::Ethereum, Network::Mainnet) => &self.ethereum_mainnet_url,
            (Chain::Ethereum, Network::Testnet) => &self.ethereum_sepolia_url,
            (Chain::Solana, Network::Mainnet) => &self.solana_mainnet_url,
            (Chain::Solana, Network::Testnet) => &self.solana_devnet_url,
        }
    }
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        Ok(Self::default())
    }

    /// 从配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// 配置文件存在时使用配置文件（缺失的段落回退到环境变量）
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(path) if path.as_ref().exists() => Self::from_file(path),
            _ => Self::from_env(),
        }
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        for chain in Chain::ALL {
            for network in [Network::Mainnet, Network::Testnet] {
                let url = self.rpc.url_for(chain, network);
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    anyhow::bail!(
                        "RPC URL for {} {} must start with http:// or https://",
                        chain,
                        network
                    );
                }
            }
        }

        if let Some(origin) = self.server.allowed_origin.as_deref() {
            let well_formed = (origin.starts_with("http://") || origin.starts_with("https://"))
                && !origin.ends_with('/')
                && HeaderValue::from_str(origin).is_ok();
            if !well_formed {
                anyhow::bail!(
                    "ALLOWED_ORIGIN must be a single origin such as http://localhost:3000, got {:?}",
                    origin
                );
            }
        }

        if self.rpc.request_timeout_secs == 0 {
            anyhow::bail!("RPC_TIMEOUT_SECS must be greater than 0");
        }
        if self.rpc.confirmation_max_polls == 0 {
            anyhow::bail!("CONFIRMATION_MAX_POLLS must be greater than 0");
        }

        if ![12, 24].contains(&self.wallet.mnemonic_word_count) {
            anyhow::bail!("MNEMONIC_WORD_COUNT must be 12 or 24");
        }

        if self.storage.data_dir.trim().is_empty() {
            anyhow::bail!("WALLET_DATA_DIR must not be empty");
        }

        Ok(())
    }
}
