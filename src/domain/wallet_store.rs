//! 单链钱包集合
//!
//! 每条链一个 `WalletStore`：一个助记词 + 有序的派生账户列表。
//! 账户索引单调递增，删除账户后不会复用（`next_index` 高水位）。

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use super::{
    chain::Chain,
    derivation::{AccountKey, DerivationError, DerivationStrategy},
    mnemonic::{self, MnemonicError},
};

#[derive(Debug, Error)]
pub enum WalletStoreError {
    #[error("please generate or import a seed phrase first")]
    MnemonicMissing,
    #[error(transparent)]
    Mnemonic(#[from] MnemonicError),
    #[error(transparent)]
    Derivation(#[from] DerivationError),
    #[error("wallet not found: {0}")]
    NotFound(String),
    #[error("derivation strategy is for {actual}, store is for {expected}")]
    ChainMismatch { expected: Chain, actual: Chain },
}

/// 已派生账户
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletEntry {
    /// 本地标识（UUID v4）
    pub id: String,
    pub index: u32,
    pub key: AccountKey,
}

impl WalletEntry {
    pub fn address(&self) -> &str {
        &self.key.public_key
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct WalletStore {
    chain: Chain,
    mnemonic: Option<String>,
    entries: Vec<WalletEntry>,
    next_index: u32,
}

impl fmt::Debug for WalletStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletStore")
            .field("chain", &self.chain)
            .field("has_mnemonic", &self.mnemonic.is_some())
            .field("entries", &self.entries.len())
            .field("next_index", &self.next_index)
            .finish()
    }
}

impl WalletStore {
    pub fn empty(chain: Chain) -> Self {
        Self {
            chain,
            mnemonic: None,
            entries: Vec::new(),
            next_index: 0,
        }
    }

    /// 从持久化数据重建
    ///
    /// `next_index` 缺失（旧数据）时取 max(index)+1；
    /// 即使给出也不会小于 max(index)+1。
    pub fn from_parts(
        chain: Chain,
        mnemonic: Option<String>,
        entries: Vec<WalletEntry>,
        next_index: Option<u32>,
    ) -> Self {
        let floor = entries
            .iter()
            .map(|e| e.index.saturating_add(1))
            .max()
            .unwrap_or(0);
        Self {
            chain,
            mnemonic,
            entries,
            next_index: next_index.unwrap_or(0).max(floor),
        }
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }

    pub fn mnemonic(&self) -> Option<&str> {
        self.mnemonic.as_deref()
    }

    pub fn entries(&self) -> &[WalletEntry] {
        &self.entries
    }

    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    pub fn is_empty(&self) -> bool {
        self.mnemonic.is_none() && self.entries.is_empty()
    }

    /// 在 `next_index` 处派生新账户并追加
    pub fn add_account(
        &mut self,
        strategy: &dyn DerivationStrategy,
    ) -> Result<WalletEntry, WalletStoreError> {
        if strategy.chain() != self.chain {
            return Err(WalletStoreError::ChainMismatch {
                expected: self.chain,
                actual: strategy.chain(),
            });
        }
        let phrase = self
            .mnemonic
            .as_deref()
            .ok_or(WalletStoreError::MnemonicMissing)?;

        let seed = mnemonic::to_seed(phrase)?;
        let index = self.next_index;
        let key = strategy.derive(&seed, index)?;

        let entry = WalletEntry {
            id: Uuid::new_v4().to_string(),
            index,
            key,
        };
        self.entries.push(entry.clone());
        self.next_index = index.saturating_add(1);
        Ok(entry)
    }

    /// 删除账户，其余账户索引不变
    pub fn remove_account(&mut self, id: &str) -> Result<WalletEntry, WalletStoreError> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| WalletStoreError::NotFound(id.to_string()))?;
        Ok(self.entries.remove(pos))
    }

    /// 导入助记词；校验失败时保持原状
    pub fn import_mnemonic(&mut self, candidate: &str) -> Result<(), WalletStoreError> {
        mnemonic::check(candidate)?;
        self.reset_with(mnemonic::normalize(candidate));
        Ok(())
    }

    /// 生成新助记词并清空已有账户
    pub fn generate_mnemonic(&mut self, word_count: usize) -> Result<&str, WalletStoreError> {
        let phrase = mnemonic::generate(word_count)?;
        self.reset_with(phrase);
        Ok(self.mnemonic.as_deref().unwrap_or_default())
    }

    /// 清空账户并遗忘助记词
    pub fn clear(&mut self) {
        self.mnemonic = None;
        self.entries.clear();
        self.next_index = 0;
    }

    pub fn find_by_id(&self, id: &str) -> Option<&WalletEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Ethereum 地址大小写不敏感，Solana 精确匹配
    pub fn find_by_address(&self, address: &str) -> Option<&WalletEntry> {
        let address = address.trim();
        self.entries.iter().find(|e| match self.chain {
            Chain::Ethereum => e.address().eq_ignore_ascii_case(address),
            Chain::Solana => e.address() == address,
        })
    }

    fn reset_with(&mut self, phrase: String) {
        self.mnemonic = Some(phrase);
        self.entries.clear();
        self.next_index = 0;
    }
}
