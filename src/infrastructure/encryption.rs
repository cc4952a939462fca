//! AES-256-GCM 加密存储
//!
//! 配置了存储口令时，所有值以 `enc:v1:<hex(nonce || ciphertext)>` 形式落盘；
//! 盐值明文保存在 `keystore_salt`，口令校验值保存在 `keystore_check`。

use std::sync::Arc;

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use anyhow::{anyhow, Result};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{
    pbkdf2,
    storage::{KeyValueStore, StorageError},
};

const NONCE_LEN: usize = 12;
const ENCRYPTED_PREFIX: &str = "enc:v1:";
pub const SALT_KEY: &str = "keystore_salt";
pub const KEY_CHECK_KEY: &str = "keystore_check";
const KEY_CHECK_PLAINTEXT: &str = "walletx-keystore-v1";

/// 加密数据，返回 nonce(12) || ciphertext
pub fn encrypt_data(data: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    if key.len() != 32 {
        return Err(anyhow!("Key must be 32 bytes for AES-256"));
    }

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| anyhow!("Invalid key: {}", e))?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, data)
        .map_err(|e| anyhow!("Encryption failed: {}", e))?;

    let mut result = nonce.to_vec();
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

/// 解密 nonce(12) || ciphertext
pub fn decrypt_data(encrypted: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    if key.len() != 32 {
        return Err(anyhow!("Key must be 32 bytes for AES-256"));
    }
    if encrypted.len() < NONCE_LEN {
        return Err(anyhow!("Encrypted data too short"));
    }

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| anyhow!("Invalid key: {}", e))?;
    let nonce = Nonce::from_slice(&encrypted[..NONCE_LEN]);

    cipher
        .decrypt(nonce, &encrypted[NONCE_LEN..])
        .map_err(|e| anyhow!("Decryption failed: {}", e))
}

/// 加密密钥（使用Zeroize保护）
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    key: [u8; 32],
}

impl EncryptionKey {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.key
    }
}

/// 透明加密包装
pub struct EncryptedStorage {
    inner: Arc<dyn KeyValueStore>,
    key: EncryptionKey,
}

impl EncryptedStorage {
    /// 读取或生成盐值，再从口令派生密钥
    ///
    /// 已有校验值时必须能用该口令解开，否则返回 `StorageError::Crypto`，
    /// 不会在错误口令下写入任何数据。
    pub fn open(inner: Arc<dyn KeyValueStore>, passphrase: &str) -> Result<Self, StorageError> {
        let salt = match inner.get(SALT_KEY)? {
            Some(hex_salt) => hex::decode(hex_salt.trim())
                .map_err(|e| StorageError::Crypto(format!("corrupt salt: {}", e)))?,
            None => {
                let salt = pbkdf2::generate_salt();
                inner.set(SALT_KEY, &hex::encode(salt))?;
                salt.to_vec()
            }
        };

        let key = pbkdf2::derive_key(passphrase, &salt)
            .map_err(|e| StorageError::Crypto(e.to_string()))?;
        let storage = Self { inner, key };

        if storage.inner.get(KEY_CHECK_KEY)?.is_some() {
            match storage.get(KEY_CHECK_KEY) {
                Ok(Some(value)) if value == KEY_CHECK_PLAINTEXT => {}
                _ => {
                    return Err(StorageError::Crypto(
                        "wrong storage passphrase".to_string(),
                    ))
                }
            }
        } else {
            storage.set(KEY_CHECK_KEY, KEY_CHECK_PLAINTEXT)?;
        }
        Ok(storage)
    }
}

impl KeyValueStore for EncryptedStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let Some(stored) = self.inner.get(key)? else {
            return Ok(None);
        };

        let Some(payload) = stored.strip_prefix(ENCRYPTED_PREFIX) else {
            // 旧的明文数据，下次写入时加密
            tracing::warn!(key = %key, "found cleartext value in encrypted storage");
            return Ok(Some(stored));
        };

        let bytes =
            hex::decode(payload).map_err(|e| StorageError::Crypto(format!("{}: {}", key, e)))?;
        let plaintext = decrypt_data(&bytes, self.key.as_slice())
            .map_err(|e| StorageError::Crypto(format!("{}: {}", key, e)))?;
        String::from_utf8(plaintext)
            .map(Some)
            .map_err(|_| StorageError::Encoding(key.to_string()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let encrypted = encrypt_data(value.as_bytes(), self.key.as_slice())
            .map_err(|e| StorageError::Crypto(e.to_string()))?;
        self.inner.set(
            key,
            &format!("{}{}", ENCRYPTED_PREFIX, hex::encode(encrypted)),
        )
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key)
    }
}
