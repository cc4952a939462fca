//! PBKDF2 密钥派生
//! 从存储口令派生 AES-256 密钥

use anyhow::{anyhow, Result};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

use super::encryption::EncryptionKey;

const PBKDF2_ITERATIONS: u32 = 100_000;
pub const SALT_LENGTH: usize = 16;
const KEY_LENGTH: usize = 32;

/// 随机盐值
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// 从口令和盐值派生密钥
pub fn derive_key(passphrase: &str, salt: &[u8]) -> Result<EncryptionKey> {
    if salt.len() != SALT_LENGTH {
        return Err(anyhow!("Salt must be {} bytes", SALT_LENGTH));
    }
    if passphrase.is_empty() {
        return Err(anyhow!("Passphrase must not be empty"));
    }

    let mut key = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    Ok(EncryptionKey::new(key))
}
