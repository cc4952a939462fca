//! BIP39 助记词生成、校验与种子派生

use std::fmt;

use bip39::{Language, Mnemonic};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const DEFAULT_WORD_COUNT: usize = 12;

/// 助记词错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MnemonicError {
    #[error("unsupported word count {0}, expected 12 or 24")]
    UnsupportedWordCount(usize),
    #[error("mnemonic has {0} words, expected 12, 15, 18, 21 or 24")]
    BadWordCount(usize),
    #[error("word #{0} is not in the BIP39 English wordlist")]
    UnknownWord(usize),
    #[error("mnemonic checksum mismatch")]
    InvalidChecksum,
    #[error("invalid mnemonic: {0}")]
    Other(String),
}

impl From<bip39::Error> for MnemonicError {
    fn from(err: bip39::Error) -> Self {
        match err {
            bip39::Error::BadWordCount(n) => MnemonicError::BadWordCount(n),
            // bip39 的位置从 0 开始
            bip39::Error::UnknownWord(i) => MnemonicError::UnknownWord(i + 1),
            bip39::Error::InvalidChecksum => MnemonicError::InvalidChecksum,
            other => MnemonicError::Other(other.to_string()),
        }
    }
}

/// 64 字节 BIP39 种子，释放时清零
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Seed([u8; 64]);

impl Seed {
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed(..)")
    }
}

/// 生成新助记词，只接受 12 或 24 词
pub fn generate(word_count: usize) -> Result<String, MnemonicError> {
    let entropy_len = match word_count {
        12 => 16,
        24 => 32,
        n => return Err(MnemonicError::UnsupportedWordCount(n)),
    };

    let mut entropy = [0u8; 32];
    OsRng.fill_bytes(&mut entropy[..entropy_len]);
    let mnemonic = Mnemonic::from_entropy(&entropy[..entropy_len]);
    entropy.zeroize();

    Ok(mnemonic?.to_string())
}

/// 规范化空白：首尾去除，单词之间单空格，统一小写
pub fn normalize(candidate: &str) -> String {
    candidate
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// 带原因的校验
pub fn check(candidate: &str) -> Result<(), MnemonicError> {
    let normalized = normalize(candidate);
    Mnemonic::parse_in(Language::English, &normalized)?;
    Ok(())
}

/// 校验助记词（词表 + 校验和），不会失败
pub fn validate(candidate: &str) -> bool {
    check(candidate).is_ok()
}

/// 助记词 → 64 字节种子（空 passphrase）
pub fn to_seed(mnemonic: &str) -> Result<Seed, MnemonicError> {
    let parsed = Mnemonic::parse_in(Language::English, normalize(mnemonic))?;
    Ok(Seed(parsed.to_seed("")))
}
