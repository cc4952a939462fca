//! 地址验证模块
//!
//! Ethereum: `0x` + 40 hex，大小写混合时校验 EIP-55；
//! Solana: base58 解码后必须是 32 字节。

use crate::domain::chain::Chain;

/// 地址验证器
pub struct AddressValidator;

impl AddressValidator {
    pub fn validate(chain: Chain, address: &str) -> bool {
        match chain {
            Chain::Ethereum => Self::validate_evm_address(address),
            Chain::Solana => Self::validate_solana_address(address),
        }
    }

    fn validate_evm_address(address: &str) -> bool {
        let Some(hex_part) = address.strip_prefix("0x") else {
            return false;
        };
        if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return false;
        }

        // 全小写或全大写不带校验信息
        let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper {
            return Self::verify_eip55_checksum(hex_part);
        }

        true
    }

    /// https://eips.ethereum.org/EIPS/eip-55
    fn verify_eip55_checksum(hex_part: &str) -> bool {
        use sha3::{Digest, Keccak256};

        let hash = Keccak256::digest(hex_part.to_lowercase().as_bytes());

        hex_part.chars().enumerate().all(|(i, ch)| {
            if !ch.is_ascii_alphabetic() {
                return true;
            }
            let hash_byte = hash[i / 2];
            let nibble = if i % 2 == 0 {
                hash_byte >> 4
            } else {
                hash_byte & 0x0f
            };
            ch.is_ascii_uppercase() == (nibble >= 8)
        })
    }

    fn validate_solana_address(address: &str) -> bool {
        if address.len() < 32 || address.len() > 44 {
            return false;
        }
        matches!(bs58::decode(address).into_vec(), Ok(bytes) if bytes.len() == 32)
    }
}
