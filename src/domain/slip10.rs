//! SLIP-0010 ed25519 派生
//!
//! ed25519 只支持硬化派生，每一级索引都会加上 0x8000_0000。
//! https://github.com/satoshilabs/slips/blob/master/slip-0010.md

use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::Zeroizing;

use super::derivation::DerivationError;

type HmacSha512 = Hmac<Sha512>;

const ED25519_CURVE: &[u8] = b"ed25519 seed";
const HARDENED: u32 = 0x8000_0000;

/// 派生节点：私钥 + 链码
pub struct ExtendedKey {
    pub private_key: Zeroizing<[u8; 32]>,
    pub chain_code: Zeroizing<[u8; 32]>,
}

impl ExtendedKey {
    /// 主密钥：HMAC-SHA512(key = "ed25519 seed", data = seed)
    pub fn from_seed(seed: &[u8]) -> Result<Self, DerivationError> {
        if !(16..=64).contains(&seed.len()) {
            return Err(DerivationError::InvalidSeedLength(seed.len()));
        }
        let mut mac = HmacSha512::new_from_slice(ED25519_CURVE)
            .map_err(|e| DerivationError::Crypto(e.to_string()))?;
        mac.update(seed);
        Ok(Self::split(&mac.finalize().into_bytes()))
    }

    /// 硬化子密钥：HMAC-SHA512(chain_code, 0x00 || key || ser32(index | 2^31))
    pub fn derive_hardened(&self, index: u32) -> Result<Self, DerivationError> {
        let mut mac = HmacSha512::new_from_slice(&*self.chain_code)
            .map_err(|e| DerivationError::Crypto(e.to_string()))?;
        mac.update(&[0x00]);
        mac.update(&*self.private_key);
        mac.update(&(index | HARDENED).to_be_bytes());
        Ok(Self::split(&mac.finalize().into_bytes()))
    }

    /// 沿路径逐级派生，例如 `m/44'/501'/0'/0'`
    pub fn derive_path(seed: &[u8], path: &str) -> Result<Self, DerivationError> {
        let mut key = Self::from_seed(seed)?;
        for index in parse_hardened_path(path)? {
            key = key.derive_hardened(index)?;
        }
        Ok(key)
    }

    fn split(output: &[u8]) -> Self {
        let mut private_key = Zeroizing::new([0u8; 32]);
        let mut chain_code = Zeroizing::new([0u8; 32]);
        private_key.copy_from_slice(&output[..32]);
        chain_code.copy_from_slice(&output[32..64]);
        Self {
            private_key,
            chain_code,
        }
    }
}

/// 解析全硬化路径，非硬化段直接报错
fn parse_hardened_path(path: &str) -> Result<Vec<u32>, DerivationError> {
    let invalid = || DerivationError::InvalidPath(path.to_string());

    let mut segments = path.split('/');
    if segments.next() != Some("m") {
        return Err(invalid());
    }

    segments
        .map(|segment| {
            let digits = segment
                .strip_suffix('\'')
                .or_else(|| segment.strip_suffix('h'))
                .ok_or_else(invalid)?;
            let index: u32 = digits.parse().map_err(|_| invalid())?;
            if index >= HARDENED {
                return Err(invalid());
            }
            Ok(index)
        })
        .collect()
}
