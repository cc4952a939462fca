//! 链与网络定义
//!
//! 钱包只支持 Ethereum 与 Solana 两条链，每条链有主网和一个测试网
//! （Sepolia / Devnet）。链标识符通过别名表标准化。

use std::{collections::HashMap, fmt, str::FromStr};

use anyhow::Result;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// 支持的区块链
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Solana,
}

/// 网络选择（默认测试网）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    #[serde(alias = "sepolia", alias = "devnet")]
    Testnet,
}

/// 链元数据
#[derive(Debug, Clone, Serialize)]
pub struct ChainInfo {
    pub chain: Chain,
    pub symbol: &'static str,
    pub full_name: &'static str,
    pub decimals: u32,
    /// 派生路径模板，`{i}` 为账户索引
    pub path_template: &'static str,
    pub testnet_name: &'static str,
}

static ALIASES: Lazy<HashMap<&'static str, Chain>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for alias in ["ethereum", "eth", "ether"] {
        map.insert(alias, Chain::Ethereum);
    }
    for alias in ["solana", "sol"] {
        map.insert(alias, Chain::Solana);
    }
    map
});

impl Chain {
    pub const ALL: [Chain; 2] = [Chain::Ethereum, Chain::Solana];

    /// 标准名称，同时作为持久化键前缀
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::Solana => "solana",
        }
    }

    pub fn info(&self) -> ChainInfo {
        match self {
            Chain::Ethereum => ChainInfo {
                chain: *self,
                symbol: "ETH",
                full_name: "Ethereum",
                decimals: 18,
                path_template: "m/44'/60'/{i}'/0/0",
                testnet_name: "sepolia",
            },
            Chain::Solana => ChainInfo {
                chain: *self,
                symbol: "SOL",
                full_name: "Solana",
                decimals: 9,
                path_template: "m/44'/501'/{i}'/0'",
                testnet_name: "devnet",
            },
        }
    }

    /// 原生币精度（wei / lamports）
    pub fn decimals(&self) -> u32 {
        self.info().decimals
    }

    /// 账户索引对应的派生路径
    pub fn derivation_path(&self, index: u32) -> String {
        match self {
            Chain::Ethereum => format!("m/44'/60'/{}'/0/0", index),
            Chain::Solana => format!("m/44'/501'/{}'/0'", index),
        }
    }

    pub fn seed_phrase_key(&self) -> String {
        format!("{}_seed_phrase", self.as_str())
    }

    pub fn wallets_key(&self) -> String {
        format!("{}_wallets", self.as_str())
    }

    pub fn next_index_key(&self) -> String {
        format!("{}_next_index", self.as_str())
    }

    /// 整条链的钱包记录，单键写入
    pub fn store_key(&self) -> String {
        format!("{}_wallet_store", self.as_str())
    }

    /// 区块浏览器交易链接
    pub fn explorer_tx_url(&self, network: Network, tx_hash: &str) -> String {
        match (self, network) {
            (Chain::Ethereum, Network::Mainnet) => format!("https://etherscan.io/tx/{}", tx_hash),
            (Chain::Ethereum, Network::Testnet) => {
                format!("https://sepolia.etherscan.io/tx/{}", tx_hash)
            }
            (Chain::Solana, Network::Mainnet) => {
                format!("https://explorer.solana.com/tx/{}", tx_hash)
            }
            (Chain::Solana, Network::Testnet) => {
                format!("https://explorer.solana.com/tx/{}?cluster=devnet", tx_hash)
            }
        }
    }

    /// 测试网水龙头；主网没有
    pub fn faucet_url(&self, network: Network) -> Option<&'static str> {
        match (self, network) {
            (Chain::Ethereum, Network::Testnet) => Some("https://sepoliafaucet.com/"),
            (Chain::Solana, Network::Testnet) => Some("https://faucet.solana.com/"),
            (_, Network::Mainnet) => None,
        }
    }
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
        }
    }

    /// 链上显示名（sepolia / devnet）
    pub fn display_name(&self, chain: Chain) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => chain.info().testnet_name,
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_lowercase();
        ALIASES
            .get(key.as_str())
            .copied()
            .ok_or_else(|| anyhow::anyhow!("Unsupported chain: {}", s))
    }
}

impl FromStr for Network {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mainnet" | "mainnet-beta" => Ok(Network::Mainnet),
            "testnet" | "sepolia" | "devnet" => Ok(Network::Testnet),
            other => anyhow::bail!("Unsupported network: {}", other),
        }
    }
}
