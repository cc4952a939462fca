//! 账户密钥派生策略
//!
//! - Ethereum: secp256k1 BIP32，路径 `m/44'/60'/{i}'/0/0`
//! - Solana: SLIP-0010 ed25519，路径 `m/44'/501'/{i}'/0'`；
//!   另有 `legacy_xor` 兼容模式，用于恢复旧版本生成的地址

use std::{fmt, str::FromStr};

use coins_bip32::path::DerivationPath;
use ed25519_dalek::SigningKey as Ed25519SigningKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroizing;

use super::{chain::Chain, mnemonic::Seed, slip10::ExtendedKey};

/// 派生错误，不会回退到任何替代密钥
#[derive(Debug, Error)]
pub enum DerivationError {
    #[error("invalid seed length: {0} bytes")]
    InvalidSeedLength(usize),
    #[error("invalid derivation path: {0}")]
    InvalidPath(String),
    #[error("key derivation failed: {0}")]
    Crypto(String),
}

/// Solana 派生方案
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolanaDerivation {
    #[default]
    Slip10,
    /// accountSeed[j] = seed[j] ^ (index & 0xff), j < 32
    LegacyXor,
}

impl FromStr for SolanaDerivation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "slip10" | "slip-10" => Ok(Self::Slip10),
            "legacy_xor" | "legacy" | "xor" => Ok(Self::LegacyXor),
            other => anyhow::bail!("Unknown Solana derivation scheme: {}", other),
        }
    }
}

/// 派生出的账户密钥
///
/// - Ethereum: `public_key` 为 EIP-55 地址，`private_key` 为 `0x` + 64 hex
/// - Solana: `public_key` 为 base58 公钥，`private_key` 为 64 字节 secret key 的 hex
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountKey {
    pub chain: Chain,
    pub public_key: String,
    pub private_key: String,
    pub path: String,
    pub account_index: u32,
}

impl fmt::Debug for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountKey")
            .field("chain", &self.chain)
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .field("path", &self.path)
            .field("account_index", &self.account_index)
            .finish()
    }
}

/// 派生策略 trait
pub trait DerivationStrategy: Send + Sync {
    fn chain(&self) -> Chain;

    /// 相同 (seed, index) 必须得到相同结果
    fn derive(&self, seed: &Seed, index: u32) -> Result<AccountKey, DerivationError>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Ethereum (secp256k1)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct EthereumStrategy;

impl DerivationStrategy for EthereumStrategy {
    fn chain(&self) -> Chain {
        Chain::Ethereum
    }

    fn derive(&self, seed: &Seed, index: u32) -> Result<AccountKey, DerivationError> {
        derive_ethereum(seed.as_bytes(), index)
    }
}

/// BIP32 secp256k1 派生，地址为 Keccak256(未压缩公钥)[12..] 的 EIP-55 形式
pub fn derive_ethereum(seed: &[u8], index: u32) -> Result<AccountKey, DerivationError> {
    use coins_bip32::prelude::*;
    use k256::ecdsa::SigningKey;
    use sha3::{Digest, Keccak256};

    if seed.len() != 64 {
        return Err(DerivationError::InvalidSeedLength(seed.len()));
    }

    let path = Chain::Ethereum.derivation_path(index);
    let derivation_path = path
        .parse::<DerivationPath>()
        .map_err(|_| DerivationError::InvalidPath(path.clone()))?;

    let master_key =
        XPriv::root_from_seed(seed, None).map_err(|e| DerivationError::Crypto(e.to_string()))?;
    let derived_key = master_key
        .derive_path(&derivation_path)
        .map_err(|e| DerivationError::Crypto(e.to_string()))?;

    // XPriv 实现 AsRef<SigningKey>
    let signing_key: &SigningKey = derived_key.as_ref();
    let private_key_bytes: Zeroizing<[u8; 32]> = Zeroizing::new(signing_key.to_bytes().into());

    let encoded = signing_key.verifying_key().to_encoded_point(false);
    let hash = Keccak256::digest(&encoded.as_bytes()[1..]);
    let address = ethers::types::Address::from_slice(&hash[12..]);

    Ok(AccountKey {
        chain: Chain::Ethereum,
        public_key: ethers::utils::to_checksum(&address, None),
        private_key: format!("0x{}", hex::encode(private_key_bytes.as_slice())),
        path,
        account_index: index,
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Solana (ed25519)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct SolanaStrategy {
    pub scheme: SolanaDerivation,
}

impl DerivationStrategy for SolanaStrategy {
    fn chain(&self) -> Chain {
        Chain::Solana
    }

    fn derive(&self, seed: &Seed, index: u32) -> Result<AccountKey, DerivationError> {
        derive_solana(seed.as_bytes(), index, self.scheme)
    }
}

pub fn derive_solana(
    seed: &[u8],
    index: u32,
    scheme: SolanaDerivation,
) -> Result<AccountKey, DerivationError> {
    if seed.len() != 64 {
        return Err(DerivationError::InvalidSeedLength(seed.len()));
    }

    let path = Chain::Solana.derivation_path(index);
    let secret: Zeroizing<[u8; 32]> = match scheme {
        SolanaDerivation::Slip10 => ExtendedKey::derive_path(seed, &path)?.private_key,
        SolanaDerivation::LegacyXor => {
            let mut account_seed = Zeroizing::new([0u8; 32]);
            let mask = (index & 0xff) as u8;
            for (dst, src) in account_seed.iter_mut().zip(&seed[..32]) {
                *dst = src ^ mask;
            }
            account_seed
        }
    };

    let signing_key = Ed25519SigningKey::from_bytes(&secret);
    let keypair_bytes = Zeroizing::new(signing_key.to_keypair_bytes());

    Ok(AccountKey {
        chain: Chain::Solana,
        public_key: bs58::encode(signing_key.verifying_key().as_bytes()).into_string(),
        private_key: hex::encode(keypair_bytes.as_slice()),
        path,
        account_index: index,
    })
}

/// 按链选择派生策略
pub struct DerivationStrategyFactory;

impl DerivationStrategyFactory {
    pub fn create(chain: Chain, solana_scheme: SolanaDerivation) -> Box<dyn DerivationStrategy> {
        match chain {
            Chain::Ethereum => Box::new(EthereumStrategy),
            Chain::Solana => Box::new(SolanaStrategy {
                scheme: solana_scheme,
            }),
        }
    }
}
