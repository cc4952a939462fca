//! 交易提交流程测试（mock 链客户端）

use std::time::Duration;

use base64::Engine;
use chrono::Utc;
use walletx::{
    domain::{
        chain::{Chain, Network},
        derivation::{derive_ethereum, derive_solana, AccountKey, SolanaDerivation},
        mnemonic,
        submission_state::SubmissionState,
        transfer::{BalanceSnapshot, SendRequest},
    },
    error::AppErrorCode,
    service::{ConfirmationStatus, TransactionSubmitter},
};

mod common;
use common::{MockChainClient, ONE_ETH, ONE_SOL, TEST_MNEMONIC};

const ETH_RECIPIENT: &str = "0x2222222222222222222222222222222222222222";

fn submitter() -> TransactionSubmitter {
    TransactionSubmitter::new(Duration::from_millis(1), 3)
}

fn eth_key() -> AccountKey {
    let seed = mnemonic::to_seed(TEST_MNEMONIC).unwrap();
    derive_ethereum(seed.as_bytes(), 0).unwrap()
}

fn sol_keys() -> (AccountKey, AccountKey) {
    let seed = mnemonic::to_seed(TEST_MNEMONIC).unwrap();
    (
        derive_solana(seed.as_bytes(), 0, SolanaDerivation::Slip10).unwrap(),
        derive_solana(seed.as_bytes(), 1, SolanaDerivation::Slip10).unwrap(),
    )
}

fn snapshot(key: &AccountKey, balance: u128) -> BalanceSnapshot {
    BalanceSnapshot {
        chain: key.chain,
        network: Network::Testnet,
        address: key.public_key.clone(),
        balance,
        fetched_at: Utc::now(),
    }
}

fn request(to: &str, amount: &str) -> SendRequest {
    SendRequest {
        to: to.to_string(),
        amount: amount.to_string(),
        gas_limit: None,
    }
}

#[tokio::test]
async fn test_ethereum_happy_path() {
    let client = MockChainClient::new(Chain::Ethereum);
    client.push_status(ConfirmationStatus::Pending);
    client.push_status(ConfirmationStatus::Confirmed { block: 4_321 });
    let key = eth_key();

    let receipt = submitter()
        .submit(
            &client,
            &key,
            Network::Testnet,
            &request(ETH_RECIPIENT, "0.5"),
            Some(&snapshot(&key, ONE_ETH)),
        )
        .await
        .unwrap();

    assert_eq!(receipt.block_number, 4_321);
    assert_eq!(
        receipt.explorer_url,
        format!("https://sepolia.etherscan.io/tx/{}", receipt.tx_hash)
    );
    assert_eq!(
        receipt.states,
        vec![
            SubmissionState::Idle,
            SubmissionState::Validating,
            SubmissionState::Signing,
            SubmissionState::Broadcasting,
            SubmissionState::Confirming,
            SubmissionState::Confirmed,
        ]
    );

    let broadcasts = client.broadcasts();
    assert_eq!(broadcasts.len(), 1);
    assert!(broadcasts[0].encoded.starts_with("0x"));
    assert_eq!(broadcasts[0].tx_id, receipt.tx_hash);
}

#[tokio::test]
async fn test_solana_happy_path() {
    let client = MockChainClient::new(Chain::Solana);
    client.push_status(ConfirmationStatus::Confirmed { block: 99 });
    let (from, to) = sol_keys();

    let receipt = submitter()
        .submit(
            &client,
            &from,
            Network::Testnet,
            &request(&to.public_key, "0.25"),
            Some(&snapshot(&from, ONE_SOL)),
        )
        .await
        .unwrap();

    assert_eq!(receipt.block_number, 99);
    assert_eq!(receipt.states.last(), Some(&SubmissionState::Confirmed));
    assert!(receipt.explorer_url.ends_with("?cluster=devnet"));

    let wire = base64::engine::general_purpose::STANDARD
        .decode(&client.broadcasts()[0].encoded)
        .unwrap();
    // 1 个签名；指令数据在末尾：02000000 ‖ lamports LE
    assert_eq!(wire[0], 1);
    let data = &wire[wire.len() - 12..];
    assert_eq!(&data[..4], &[2, 0, 0, 0]);
    assert_eq!(&data[4..], &250_000_000u64.to_le_bytes());
}

#[tokio::test]
async fn test_invalid_inputs_make_no_rpc_calls() {
    let key = eth_key();
    let snap = snapshot(&key, ONE_ETH);

    let cases: Vec<(SendRequest, Option<&BalanceSnapshot>, AppErrorCode)> = vec![
        (request(ETH_RECIPIENT, "2"), Some(&snap), AppErrorCode::InsufficientBalance),
        (request("0x1234", "0.1"), Some(&snap), AppErrorCode::InvalidAddress),
        (request(ETH_RECIPIENT, "0"), Some(&snap), AppErrorCode::InvalidAmount),
        (request(ETH_RECIPIENT, "-1"), Some(&snap), AppErrorCode::InvalidAmount),
        (request(ETH_RECIPIENT, "0.1"), None, AppErrorCode::InsufficientBalance),
        (request("", "0.1"), Some(&snap), AppErrorCode::ValidationFailed),
        (
            SendRequest {
                gas_limit: Some(20_999),
                ..request(ETH_RECIPIENT, "0.1")
            },
            Some(&snap),
            AppErrorCode::ValidationFailed,
        ),
    ];

    for (req, snapshot, expected) in cases {
        let client = MockChainClient::new(Chain::Ethereum);
        let err = submitter()
            .submit(&client, &key, Network::Testnet, &req, snapshot)
            .await
            .unwrap_err();
        assert_eq!(err.code, expected, "request {:?}", req);
        assert_eq!(client.calls(), 0, "request {:?} hit the network", req);
    }
}

#[tokio::test]
async fn test_snapshot_for_other_network_is_rejected() {
    let client = MockChainClient::new(Chain::Ethereum);
    let key = eth_key();
    let mut snap = snapshot(&key, ONE_ETH);
    snap.network = Network::Mainnet;

    let err = submitter()
        .submit(
            &client,
            &key,
            Network::Testnet,
            &request(ETH_RECIPIENT, "0.1"),
            Some(&snap),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, AppErrorCode::InsufficientBalance);
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_reverted_transaction_fails() {
    let client = MockChainClient::new(Chain::Ethereum);
    client.push_status(ConfirmationStatus::Failed {
        reason: "transaction reverted in block 10".into(),
    });
    let key = eth_key();

    let err = submitter()
        .submit(
            &client,
            &key,
            Network::Testnet,
            &request(ETH_RECIPIENT, "0.1"),
            Some(&snapshot(&key, ONE_ETH)),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, AppErrorCode::TransactionFailed);
}

#[tokio::test]
async fn test_confirmation_timeout() {
    let client = MockChainClient::new(Chain::Solana);
    let (from, to) = sol_keys();

    let err = submitter()
        .submit(
            &client,
            &from,
            Network::Testnet,
            &request(&to.public_key, "0.1"),
            Some(&snapshot(&from, ONE_SOL)),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, AppErrorCode::ConfirmationTimeout);
    // signing_context + broadcast + 3 次轮询
    assert_eq!(client.calls(), 5);
}

#[tokio::test]
async fn test_broadcast_rejection_is_rpc_error() {
    let client = MockChainClient::new(Chain::Ethereum);
    client.fail_broadcasts();
    let key = eth_key();

    let err = submitter()
        .submit(
            &client,
            &key,
            Network::Testnet,
            &request(ETH_RECIPIENT, "0.1"),
            Some(&snapshot(&key, ONE_ETH)),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, AppErrorCode::RpcError);
    assert!(err.message.contains("insufficient funds"));
}
