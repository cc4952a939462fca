//! 钱包服务
//!
//! 启动时加载每条链的 `WalletStore`，所有修改串行执行：
//! 加锁 → 修改副本 → 落盘 → 替换内存状态。落盘失败时内存保持原样。
//! 文件 IO 在 blocking 线程池上执行。

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::{
    domain::{
        chain::Chain,
        derivation::{DerivationStrategyFactory, SolanaDerivation},
        wallet_store::{WalletEntry, WalletStore, WalletStoreError},
    },
    error::AppError,
    infrastructure::{log_redact::redact_address, storage::StorageError},
    repository::wallet_repository::WalletRepository,
};

pub struct WalletService {
    repository: WalletRepository,
    stores: Mutex<HashMap<Chain, WalletStore>>,
    solana_derivation: SolanaDerivation,
    default_word_count: usize,
}

impl WalletService {
    /// 加载全部链；存储不可读（含口令错误）时失败
    pub fn open(
        repository: WalletRepository,
        solana_derivation: SolanaDerivation,
        default_word_count: usize,
    ) -> Result<Self, StorageError> {
        let mut stores = HashMap::new();
        for chain in Chain::ALL {
            stores.insert(chain, repository.load(chain)?);
        }

        Ok(Self {
            repository,
            stores: Mutex::new(stores),
            solana_derivation,
            default_word_count,
        })
    }

    /// 只读访问
    async fn read<T>(&self, chain: Chain, f: impl FnOnce(&WalletStore) -> T) -> T {
        let stores = self.stores.lock().await;
        match stores.get(&chain) {
            Some(store) => f(store),
            None => f(&WalletStore::empty(chain)),
        }
    }

    /// 修改副本、落盘成功后再提交
    async fn mutate<T>(
        &self,
        chain: Chain,
        f: impl FnOnce(&mut WalletStore) -> Result<T, WalletStoreError>,
    ) -> Result<T, AppError> {
        let mut stores = self.stores.lock().await;
        let current = stores
            .entry(chain)
            .or_insert_with(|| WalletStore::empty(chain));

        let mut draft = current.clone();
        let value = f(&mut draft)?;
        let draft = self
            .blocking(move |repository| repository.save(&draft).map(|()| draft))
            .await?
            .map_err(|e| {
                tracing::error!(chain = %chain, error = %e, "failed to persist wallet store");
                AppError::from(e)
            })?;
        *current = draft;
        Ok(value)
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, AppError>
    where
        T: Send + 'static,
        F: FnOnce(WalletRepository) -> T + Send + 'static,
    {
        let repository = self.repository.clone();
        tokio::task::spawn_blocking(move || f(repository))
            .await
            .map_err(|e| AppError::internal(format!("storage task failed: {}", e)))
    }

    pub async fn mnemonic(&self, chain: Chain) -> Option<String> {
        self.read(chain, |s| s.mnemonic().map(str::to_string)).await
    }

    /// 生成新助记词，清空该链已有账户
    pub async fn generate_mnemonic(
        &self,
        chain: Chain,
        word_count: Option<usize>,
    ) -> Result<String, AppError> {
        let word_count = word_count.unwrap_or(self.default_word_count);
        let phrase = self
            .mutate(chain, |s| s.generate_mnemonic(word_count).map(str::to_string))
            .await?;
        tracing::info!(chain = %chain, words = word_count, "generated new seed phrase");
        Ok(phrase)
    }

    /// 导入助记词，清空该链已有账户
    pub async fn import_mnemonic(&self, chain: Chain, phrase: &str) -> Result<(), AppError> {
        self.mutate(chain, |s| s.import_mnemonic(phrase)).await?;
        tracing::info!(chain = %chain, "imported seed phrase");
        Ok(())
    }

    pub async fn add_account(&self, chain: Chain) -> Result<WalletEntry, AppError> {
        let strategy = DerivationStrategyFactory::create(chain, self.solana_derivation);
        let entry = self
            .mutate(chain, |s| s.add_account(strategy.as_ref()))
            .await?;
        tracing::info!(
            chain = %chain,
            index = entry.index,
            address = %redact_address(entry.address()),
            "wallet added"
        );
        Ok(entry)
    }

    pub async fn remove_account(&self, chain: Chain, id: &str) -> Result<WalletEntry, AppError> {
        let entry = self.mutate(chain, |s| s.remove_account(id)).await?;
        tracing::info!(chain = %chain, index = entry.index, "wallet removed");
        Ok(entry)
    }

    pub async fn clear(&self, chain: Chain) -> Result<(), AppError> {
        self.mutate(chain, |s| {
            s.clear();
            Ok(())
        })
        .await?;
        tracing::info!(chain = %chain, "wallet store cleared");
        Ok(())
    }

    pub async fn list(&self, chain: Chain) -> Vec<WalletEntry> {
        self.read(chain, |s| s.entries().to_vec()).await
    }

    pub async fn next_index(&self, chain: Chain) -> u32 {
        self.read(chain, |s| s.next_index()).await
    }

    pub async fn find_by_address(
        &self,
        chain: Chain,
        address: &str,
    ) -> Result<WalletEntry, AppError> {
        self.read(chain, |s| s.find_by_address(address).cloned())
            .await
            .ok_or_else(|| {
                AppError::wallet_not_found(format!("no {} wallet with address {}", chain, address))
            })
    }

    /// 未保存过时默认 Ethereum
    pub async fn selected_chain(&self) -> Chain {
        self.blocking(|repository| repository.load_selected_chain())
            .await
            .ok()
            .flatten()
            .unwrap_or(Chain::Ethereum)
    }

    pub async fn set_selected_chain(&self, chain: Chain) -> Result<(), AppError> {
        self.blocking(move |repository| repository.save_selected_chain(chain))
            .await??;
        tracing::info!(chain = %chain, "selected blockchain changed");
        Ok(())
    }
}
