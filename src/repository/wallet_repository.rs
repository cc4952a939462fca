// 钱包持久化 Repository
//
// 键布局：
//   {chain}_wallet_store  {seedPhrase, nextIndex, wallets}，一次写入
//   selected_blockchain   ethereum | solana
//
// 旧版钱包数据（只读，首次保存后清理）：
//   {chain}_seed_phrase  助记词明文
//   {chain}_wallets      [{seedPhrase, publicKey, privateKey, path, index, id}]
//   {chain}_next_index   下一个账户索引

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    domain::{
        chain::Chain,
        derivation::AccountKey,
        wallet_store::{WalletEntry, WalletStore},
    },
    infrastructure::storage::{KeyValueStore, StorageError},
};

pub const SELECTED_CHAIN_KEY: &str = "selected_blockchain";

// ============ 存储格式 ============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredWallet {
    pub seed_phrase: String,
    pub public_key: String,
    pub private_key: String,
    pub path: String,
    pub index: u32,
    /// 旧数据里是数字（时间戳 + 随机数）
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "wallet id must be a string or number, got {}",
            other
        ))),
    }
}

impl StoredWallet {
    fn from_entry(entry: &WalletEntry, seed_phrase: &str) -> Self {
        Self {
            seed_phrase: seed_phrase.to_string(),
            public_key: entry.key.public_key.clone(),
            private_key: entry.key.private_key.clone(),
            path: entry.key.path.clone(),
            index: entry.index,
            id: entry.id.clone(),
        }
    }

    fn into_entry(self, chain: Chain) -> WalletEntry {
        WalletEntry {
            id: self.id,
            index: self.index,
            key: AccountKey {
                chain,
                public_key: self.public_key,
                private_key: self.private_key,
                path: self.path,
                account_index: self.index,
            },
        }
    }
}

/// 单链完整记录
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredWalletStore {
    seed_phrase: Option<String>,
    #[serde(default)]
    next_index: Option<u32>,
    #[serde(default)]
    wallets: Vec<StoredWallet>,
}

// ============ Repository ============

#[derive(Clone)]
pub struct WalletRepository {
    storage: Arc<dyn KeyValueStore>,
}

impl WalletRepository {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// 加载单链钱包
    ///
    /// 存储读取失败（IO、口令错误）直接返回错误，避免之后的写入覆盖原数据；
    /// 内容损坏只记录警告并视为空。
    pub fn load(&self, chain: Chain) -> Result<WalletStore, StorageError> {
        let Some(raw) = self.storage.get(&chain.store_key())? else {
            return self.load_legacy(chain);
        };

        match serde_json::from_str::<StoredWalletStore>(&raw) {
            Ok(record) => Ok(assemble(
                chain,
                record.seed_phrase,
                record.wallets,
                record.next_index,
            )),
            Err(e) => {
                tracing::warn!(chain = %chain, error = %e, "corrupt wallet store, starting empty");
                Ok(WalletStore::empty(chain))
            }
        }
    }

    fn load_legacy(&self, chain: Chain) -> Result<WalletStore, StorageError> {
        let mnemonic = self.storage.get(&chain.seed_phrase_key())?;

        let stored: Vec<StoredWallet> = match self.storage.get(&chain.wallets_key())? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(chain = %chain, error = %e, "corrupt wallet list, ignoring it");
                Vec::new()
            }),
            None => Vec::new(),
        };

        let next_index = self
            .storage
            .get(&chain.next_index_key())?
            .and_then(|s| s.trim().parse::<u32>().ok());

        Ok(assemble(chain, mnemonic, stored, next_index))
    }

    /// 整条链一次写入，返回时已落盘；之后清理旧版键
    pub fn save(&self, store: &WalletStore) -> Result<(), StorageError> {
        let chain = store.chain();
        let record = StoredWalletStore {
            seed_phrase: store.mnemonic().map(str::to_string),
            next_index: Some(store.next_index()),
            wallets: match store.mnemonic() {
                Some(mnemonic) => store
                    .entries()
                    .iter()
                    .map(|e| StoredWallet::from_entry(e, mnemonic))
                    .collect(),
                None => Vec::new(),
            },
        };
        let json = serde_json::to_string(&record)
            .map_err(|e| StorageError::Encoding(format!("{}: {}", chain.store_key(), e)))?;
        self.storage.set(&chain.store_key(), &json)?;

        // 记录已生效，旧版键只会被忽略
        for key in [
            chain.wallets_key(),
            chain.next_index_key(),
            chain.seed_phrase_key(),
        ] {
            if let Err(e) = self.storage.remove(&key) {
                tracing::warn!(key = %key, error = %e, "failed to remove legacy wallet key");
            }
        }
        Ok(())
    }

    pub fn load_selected_chain(&self) -> Option<Chain> {
        match self.storage.get(SELECTED_CHAIN_KEY) {
            Ok(value) => value.and_then(|s| s.parse().ok()),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read selected blockchain");
                None
            }
        }
    }

    pub fn save_selected_chain(&self, chain: Chain) -> Result<(), StorageError> {
        self.storage.set(SELECTED_CHAIN_KEY, chain.as_str())
    }
}

/// 只保留属于当前助记词的账户
fn assemble(
    chain: Chain,
    mnemonic: Option<String>,
    stored: Vec<StoredWallet>,
    next_index: Option<u32>,
) -> WalletStore {
    let mnemonic = mnemonic
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let total = stored.len();
    let entries: Vec<WalletEntry> = stored
        .into_iter()
        .filter(|w| mnemonic.as_deref() == Some(w.seed_phrase.trim()))
        .map(|w| w.into_entry(chain))
        .collect();
    if entries.len() != total {
        tracing::warn!(
            chain = %chain,
            dropped = total - entries.len(),
            "dropped wallets that do not belong to the stored seed phrase"
        );
    }

    WalletStore::from_parts(chain, mnemonic, entries, next_index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::derivation::EthereumStrategy, infrastructure::storage::MemoryStorage};

    const TEST_MNEMONIC: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn repo() -> (Arc<MemoryStorage>, WalletRepository) {
        let storage = Arc::new(MemoryStorage::new());
        let repo = WalletRepository::new(storage.clone());
        (storage, repo)
    }

    #[test]
    fn test_roundtrip() {
        let (_, repo) = repo();
        let mut store = WalletStore::empty(Chain::Ethereum);
        store.import_mnemonic(TEST_MNEMONIC).unwrap();
        store.add_account(&EthereumStrategy).unwrap();
        store.add_account(&EthereumStrategy).unwrap();
        repo.save(&store).unwrap();

        assert_eq!(repo.load(Chain::Ethereum).unwrap(), store);
    }

    #[test]
    fn test_stored_format_uses_camel_case_layout() {
        let (storage, repo) = repo();
        let mut store = WalletStore::empty(Chain::Ethereum);
        store.import_mnemonic(TEST_MNEMONIC).unwrap();
        store.add_account(&EthereumStrategy).unwrap();
        repo.save(&store).unwrap();

        let raw = storage.get("ethereum_wallet_store").unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["seedPhrase"], TEST_MNEMONIC);
        assert_eq!(json["nextIndex"], 1);
        let first = &json["wallets"][0];
        assert_eq!(first["seedPhrase"], TEST_MNEMONIC);
        assert_eq!(first["publicKey"], "0x9858EfFD232B4033E47d90003D41EC34EcaEda94");
        assert_eq!(first["path"], "m/44'/60'/0'/0/0");
        assert_eq!(first["index"], 0);
    }

    #[test]
    fn test_corrupt_store_loads_empty() {
        let (storage, repo) = repo();
        storage.set("solana_wallet_store", "{not json").unwrap();
        assert!(repo.load(Chain::Solana).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_legacy_wallet_list_loads_empty() {
        let (storage, repo) = repo();
        storage.set("solana_seed_phrase", TEST_MNEMONIC).unwrap();
        storage.set("solana_wallets", "{not json").unwrap();

        let store = repo.load(Chain::Solana).unwrap();
        assert_eq!(store.mnemonic(), Some(TEST_MNEMONIC));
        assert!(store.entries().is_empty());
    }

    #[test]
    fn test_legacy_numeric_ids_and_missing_next_index() {
        let (storage, repo) = repo();
        storage.set("ethereum_seed_phrase", TEST_MNEMONIC).unwrap();
        let legacy = serde_json::json!([
            {
                "seedPhrase": TEST_MNEMONIC,
                "publicKey": "0x9858EfFD232B4033E47d90003D41EC34EcaEda94",
                "privateKey": "0x1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727",
                "path": "m/44'/60'/0'/0/0",
                "index": 0,
                "id": 1700000000000.123
            },
            {
                "seedPhrase": TEST_MNEMONIC,
                "publicKey": "0x0000000000000000000000000000000000000002",
                "privateKey": "0x02",
                "path": "m/44'/60'/2'/0/0",
                "index": 2,
                "id": "b"
            }
        ]);
        storage
            .set("ethereum_wallets", &legacy.to_string())
            .unwrap();

        let store = repo.load(Chain::Ethereum).unwrap();
        assert_eq!(store.entries().len(), 2);
        assert_eq!(store.entries()[0].id, "1700000000000.123");
        assert_eq!(store.next_index(), 3);
    }

    #[test]
    fn test_legacy_keys_migrate_on_save() {
        let (storage, repo) = repo();
        storage.set("ethereum_seed_phrase", TEST_MNEMONIC).unwrap();
        storage.set("ethereum_wallets", "[]").unwrap();
        storage.set("ethereum_next_index", "4").unwrap();

        let store = repo.load(Chain::Ethereum).unwrap();
        assert_eq!(store.next_index(), 4);
        repo.save(&store).unwrap();

        for key in ["ethereum_seed_phrase", "ethereum_wallets", "ethereum_next_index"] {
            assert!(storage.get(key).unwrap().is_none(), "{} left behind", key);
        }
        assert_eq!(repo.load(Chain::Ethereum).unwrap(), store);
    }

    #[test]
    fn test_legacy_wallets_from_other_mnemonic_are_dropped() {
        let (storage, repo) = repo();
        let mut store = WalletStore::empty(Chain::Ethereum);
        store.import_mnemonic(TEST_MNEMONIC).unwrap();
        store.add_account(&EthereumStrategy).unwrap();
        let wallets: Vec<StoredWallet> = store
            .entries()
            .iter()
            .map(|e| StoredWallet::from_entry(e, TEST_MNEMONIC))
            .collect();

        // 旧版：账户已写入，助记词却是另一组
        storage
            .set("ethereum_wallets", &serde_json::to_string(&wallets).unwrap())
            .unwrap();
        storage
            .set("ethereum_seed_phrase", "zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo wrong")
            .unwrap();
        assert!(repo.load(Chain::Ethereum).unwrap().entries().is_empty());
    }

    #[test]
    fn test_clear_forgets_mnemonic() {
        let (storage, repo) = repo();
        let mut store = WalletStore::empty(Chain::Ethereum);
        store.import_mnemonic(TEST_MNEMONIC).unwrap();
        store.add_account(&EthereumStrategy).unwrap();
        repo.save(&store).unwrap();

        store.clear();
        repo.save(&store).unwrap();
        let raw = storage.get("ethereum_wallet_store").unwrap().unwrap();
        assert!(!raw.contains("abandon"));
        assert!(repo.load(Chain::Ethereum).unwrap().is_empty());
    }

    #[test]
    fn test_storage_errors_are_not_treated_as_empty() {
        struct BrokenStorage;

        impl KeyValueStore for BrokenStorage {
            fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
                Err(StorageError::Crypto(format!("{}: Decryption failed", key)))
            }

            fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
                Ok(())
            }

            fn remove(&self, _key: &str) -> Result<(), StorageError> {
                Ok(())
            }
        }

        let repo = WalletRepository::new(Arc::new(BrokenStorage));
        assert!(matches!(
            repo.load(Chain::Ethereum),
            Err(StorageError::Crypto(_))
        ));
    }

    #[test]
    fn test_selected_chain() {
        let (storage, repo) = repo();
        assert_eq!(repo.load_selected_chain(), None);
        repo.save_selected_chain(Chain::Solana).unwrap();
        assert_eq!(repo.load_selected_chain(), Some(Chain::Solana));

        storage.set(SELECTED_CHAIN_KEY, "dogecoin").unwrap();
        assert_eq!(repo.load_selected_chain(), None);
    }
}
