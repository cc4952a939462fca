//! 地址生成算法验证测试
//!
//! 使用 BIP39 标准测试向量验证派生结果与主流钱包一致

use ed25519_dalek::SigningKey;
use walletx::domain::{
    chain::Chain,
    derivation::{
        derive_ethereum, derive_solana, DerivationStrategy, DerivationStrategyFactory,
        SolanaDerivation,
    },
    mnemonic,
};

const TEST_MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

/// 测试向量：
/// - Mnemonic: "abandon ... about"
/// - Expected Ethereum address (m/44'/60'/0'/0/0): 0x9858EfFD232B4033E47d90003D41EC34EcaEda94
#[test]
fn test_ethereum_address_generation_bip39_vector() {
    let seed = mnemonic::to_seed(TEST_MNEMONIC).unwrap();
    let key = derive_ethereum(seed.as_bytes(), 0).unwrap();

    assert_eq!(key.public_key, "0x9858EfFD232B4033E47d90003D41EC34EcaEda94");
    assert_eq!(
        key.private_key,
        "0x1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727"
    );
    assert_eq!(key.path, "m/44'/60'/0'/0/0");
}

#[test]
fn test_seed_vector() {
    let seed = mnemonic::to_seed(TEST_MNEMONIC).unwrap();
    assert_eq!(
        hex::encode(seed.as_bytes()),
        "5eb00bbddcf069084889a8ab9155568165f5c453ccb85e70811aaed6f6da5fc1\
         9a5ac40b389cd370d086206dec8aa6c43daea6690f20ad3d8d48b2d2ce9e38e4"
    );
}

#[test]
fn test_ethereum_accounts_are_distinct_and_checksummed() {
    let seed = mnemonic::to_seed(TEST_MNEMONIC).unwrap();
    let addresses: Vec<String> = (0..5)
        .map(|i| derive_ethereum(seed.as_bytes(), i).unwrap().public_key)
        .collect();

    for (i, address) in addresses.iter().enumerate() {
        assert!(address.starts_with("0x"));
        assert_eq!(address.len(), 42);
        // 重新计算校验和应得到同一个字符串
        let parsed: ethers::types::Address = address.parse().unwrap();
        assert_eq!(&ethers::utils::to_checksum(&parsed, None), address);
        assert!(!addresses[..i].contains(address), "duplicate at index {}", i);
    }
}

#[test]
fn test_solana_slip10_path_and_format() {
    let seed = mnemonic::to_seed(TEST_MNEMONIC).unwrap();
    let key = derive_solana(seed.as_bytes(), 3, SolanaDerivation::Slip10).unwrap();

    assert_eq!(key.path, "m/44'/501'/3'/0'");
    let pubkey = bs58::decode(&key.public_key).into_vec().unwrap();
    assert_eq!(pubkey.len(), 32);

    // secret key = 32 字节私钥 ‖ 32 字节公钥
    let secret = hex::decode(&key.private_key).unwrap();
    assert_eq!(secret.len(), 64);
    assert_eq!(&secret[32..], pubkey.as_slice());
}

#[test]
fn test_solana_legacy_xor_matches_manual_derivation() {
    let seed = mnemonic::to_seed(TEST_MNEMONIC).unwrap();

    for index in [0u32, 1, 7, 256] {
        let key = derive_solana(seed.as_bytes(), index, SolanaDerivation::LegacyXor).unwrap();

        let mut expected_secret = [0u8; 32];
        for (j, byte) in expected_secret.iter_mut().enumerate() {
            *byte = seed.as_bytes()[j] ^ (index & 0xff) as u8;
        }
        let expected = SigningKey::from_bytes(&expected_secret);
        assert_eq!(
            key.public_key,
            bs58::encode(expected.verifying_key().as_bytes()).into_string()
        );
        assert_eq!(key.path, format!("m/44'/501'/{}'/0'", index));
    }

    // 256 与 0 只看低 8 位，得到同一把密钥
    let a = derive_solana(seed.as_bytes(), 0, SolanaDerivation::LegacyXor).unwrap();
    let b = derive_solana(seed.as_bytes(), 256, SolanaDerivation::LegacyXor).unwrap();
    assert_eq!(a.public_key, b.public_key);
}

#[test]
fn test_solana_schemes_differ() {
    let seed = mnemonic::to_seed(TEST_MNEMONIC).unwrap();
    let slip10 = derive_solana(seed.as_bytes(), 0, SolanaDerivation::Slip10).unwrap();
    let legacy = derive_solana(seed.as_bytes(), 0, SolanaDerivation::LegacyXor).unwrap();
    assert_ne!(slip10.public_key, legacy.public_key);
}

#[test]
fn test_strategy_factory_is_deterministic() {
    let seed = mnemonic::to_seed(TEST_MNEMONIC).unwrap();
    for chain in Chain::ALL {
        let strategy = DerivationStrategyFactory::create(chain, SolanaDerivation::Slip10);
        assert_eq!(strategy.chain(), chain);
        let first = strategy.derive(&seed, 2).unwrap();
        let second = strategy.derive(&seed, 2).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.account_index, 2);
    }
}

#[test]
fn test_different_mnemonics_give_different_addresses() {
    let other = mnemonic::generate(12).unwrap();
    let seed_a = mnemonic::to_seed(TEST_MNEMONIC).unwrap();
    let seed_b = mnemonic::to_seed(&other).unwrap();

    assert_ne!(
        derive_ethereum(seed_a.as_bytes(), 0).unwrap().public_key,
        derive_ethereum(seed_b.as_bytes(), 0).unwrap().public_key
    );
}
