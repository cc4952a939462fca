//! 原生币转账构建与本地签名
//!
//! - Ethereum: EIP-155 legacy 交易，RLP 编码后以 `0x` hex 广播
//! - Solana: System Program transfer，legacy message，base64 wire 格式广播
//!
//! 私钥只在本模块内解码，签名完成后立即丢弃。

use std::str::FromStr;

use anyhow::{Context, Result};
use base64::Engine;
use ed25519_dalek::{Signer as _, SigningKey as Ed25519SigningKey};
use ethers::{
    signers::{LocalWallet, Signer as _},
    types::{transaction::eip2718::TypedTransaction, Address, Transaction, TransactionRequest, U256},
};
use zeroize::Zeroizing;

use crate::{
    domain::{chain::Chain, derivation::AccountKey, transfer::ValidatedTransfer},
    service::chain_client::{SignedTransaction, SigningContext},
};

/// System Program 地址（32 个零字节）
const SYSTEM_PROGRAM_ID: [u8; 32] = [0u8; 32];
/// SystemInstruction::Transfer 的枚举序号
const SYSTEM_TRANSFER_INSTRUCTION: u32 = 2;

/// 按链分派签名
pub fn sign_transfer(
    key: &AccountKey,
    transfer: &ValidatedTransfer,
    context: &SigningContext,
) -> Result<SignedTransaction> {
    if key.chain != transfer.chain {
        anyhow::bail!("Signing key is for {}, transfer is for {}", key.chain, transfer.chain);
    }

    match (transfer.chain, context) {
        (
            Chain::Ethereum,
            SigningContext::Ethereum {
                nonce,
                gas_price,
                chain_id,
            },
        ) => sign_ethereum_transfer(key, transfer, *nonce, *gas_price, *chain_id),
        (Chain::Solana, SigningContext::Solana { recent_blockhash }) => {
            sign_solana_transfer(key, transfer, recent_blockhash)
        }
        (chain, _) => anyhow::bail!("Signing context does not match chain {}", chain),
    }
}

// ============ Ethereum ============

pub fn sign_ethereum_transfer(
    key: &AccountKey,
    transfer: &ValidatedTransfer,
    nonce: u64,
    gas_price: u128,
    chain_id: u64,
) -> Result<SignedTransaction> {
    let secret = Zeroizing::new(
        hex::decode(key.private_key.trim_start_matches("0x")).context("Invalid private key hex")?,
    );
    let wallet = LocalWallet::from_bytes(&secret)
        .context("Invalid secp256k1 private key")?
        .with_chain_id(chain_id);

    let from = Address::from_str(&key.public_key).context("Invalid sender address")?;
    if wallet.address() != from {
        anyhow::bail!("Private key does not match sender address");
    }
    let to = Address::from_str(&transfer.to).context("Invalid recipient address")?;

    let tx: TypedTransaction = TransactionRequest::new()
        .from(from)
        .to(to)
        .value(U256::from(transfer.amount))
        .gas(transfer.gas_limit)
        .gas_price(U256::from(gas_price))
        .nonce(nonce)
        .chain_id(chain_id)
        .into();

    let signature = wallet
        .sign_transaction_sync(&tx)
        .context("Failed to sign Ethereum transaction")?;
    let raw = tx.rlp_signed(&signature);

    // 回解码确认签名者
    let decoded: Transaction = rlp::decode(&raw).context("Failed to decode signed transaction")?;
    let signer = decoded
        .recover_from()
        .context("Failed to recover signer from signed transaction")?;
    if signer != from {
        anyhow::bail!("Signed transaction sender mismatch: expected {:?}, got {:?}", from, signer);
    }

    let tx_hash = ethers::utils::keccak256(&raw);
    Ok(SignedTransaction {
        chain: Chain::Ethereum,
        encoded: format!("0x{}", hex::encode(&raw)),
        tx_id: format!("0x{}", hex::encode(tx_hash)),
    })
}

// ============ Solana ============

/// Solana compact-u16（shortvec）长度编码
pub fn encode_compact_u16(mut value: u16, out: &mut Vec<u8>) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        byte |= 0x80;
        out.push(byte);
    }
}

fn decode_pubkey(address: &str) -> Result<[u8; 32]> {
    bs58::decode(address)
        .into_vec()
        .with_context(|| format!("Invalid base58 address: {}", address))?
        .try_into()
        .map_err(|_| anyhow::anyhow!("Address must decode to 32 bytes: {}", address))
}

/// 指令引用的账户及其权限
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountMeta {
    pub pubkey: [u8; 32],
    pub is_signer: bool,
    pub is_writable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub program_id: [u8; 32],
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

/// System Program transfer：data = u32 LE 序号 ‖ u64 LE lamports
pub fn system_transfer_instruction(from: &[u8; 32], to: &[u8; 32], lamports: u64) -> Instruction {
    let mut data = Vec::with_capacity(12);
    data.extend_from_slice(&SYSTEM_TRANSFER_INSTRUCTION.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());

    Instruction {
        program_id: SYSTEM_PROGRAM_ID,
        accounts: vec![
            AccountMeta {
                pubkey: *from,
                is_signer: true,
                is_writable: true,
            },
            AccountMeta {
                pubkey: *to,
                is_signer: false,
                is_writable: true,
            },
        ],
        data,
    }
}

/// 编译 legacy message
///
/// payer 排第一；重复账户合并权限；其余按 签名可写、签名只读、可写、只读 稳定排序，
/// program id 作为只读非签名账户追加。
pub fn compile_message(
    payer: &[u8; 32],
    instructions: &[Instruction],
    recent_blockhash: &[u8; 32],
) -> Vec<u8> {
    let mut keys = vec![AccountMeta {
        pubkey: *payer,
        is_signer: true,
        is_writable: true,
    }];
    let mut merge = |meta: &AccountMeta| match keys.iter_mut().find(|k| k.pubkey == meta.pubkey) {
        Some(existing) => {
            existing.is_signer |= meta.is_signer;
            existing.is_writable |= meta.is_writable;
        }
        None => keys.push(meta.clone()),
    };
    for ix in instructions {
        ix.accounts.iter().for_each(&mut merge);
        merge(&AccountMeta {
            pubkey: ix.program_id,
            is_signer: false,
            is_writable: false,
        });
    }
    keys.sort_by_key(|k| match (k.is_signer, k.is_writable) {
        (true, true) => 0,
        (true, false) => 1,
        (false, true) => 2,
        (false, false) => 3,
    });

    let position = |pubkey: &[u8; 32]| {
        keys.iter()
            .position(|k| &k.pubkey == pubkey)
            .unwrap_or_default() as u8
    };
    let count = |pred: fn(&AccountMeta) -> bool| keys.iter().filter(|k| pred(k)).count() as u8;

    let mut message = Vec::with_capacity(150);
    message.push(count(|k| k.is_signer));
    message.push(count(|k| k.is_signer && !k.is_writable));
    message.push(count(|k| !k.is_signer && !k.is_writable));

    encode_compact_u16(keys.len() as u16, &mut message);
    for key in &keys {
        message.extend_from_slice(&key.pubkey);
    }
    message.extend_from_slice(recent_blockhash);

    encode_compact_u16(instructions.len() as u16, &mut message);
    for ix in instructions {
        message.push(position(&ix.program_id));
        encode_compact_u16(ix.accounts.len() as u16, &mut message);
        for meta in &ix.accounts {
            message.push(position(&meta.pubkey));
        }
        encode_compact_u16(ix.data.len() as u16, &mut message);
        message.extend_from_slice(&ix.data);
    }

    message
}

/// 单条 System transfer 的 legacy message，from 兼任 fee payer
pub fn build_solana_transfer_message(
    from: &[u8; 32],
    to: &[u8; 32],
    lamports: u64,
    recent_blockhash: &[u8; 32],
) -> Vec<u8> {
    let instruction = system_transfer_instruction(from, to, lamports);
    compile_message(from, &[instruction], recent_blockhash)
}

pub fn sign_solana_transfer(
    key: &AccountKey,
    transfer: &ValidatedTransfer,
    recent_blockhash: &[u8; 32],
) -> Result<SignedTransaction> {
    let secret = Zeroizing::new(hex::decode(&key.private_key).context("Invalid private key hex")?);
    let keypair: &[u8; 64] = secret
        .as_slice()
        .try_into()
        .map_err(|_| anyhow::anyhow!("Solana secret key must be 64 bytes"))?;
    let signing_key =
        Ed25519SigningKey::from_keypair_bytes(keypair).context("Invalid ed25519 keypair")?;

    let from = decode_pubkey(&key.public_key)?;
    if signing_key.verifying_key().as_bytes() != &from {
        anyhow::bail!("Private key does not match sender address");
    }
    let to = decode_pubkey(&transfer.to)?;
    let lamports = u64::try_from(transfer.amount).context("Lamport amount exceeds u64")?;

    let message = build_solana_transfer_message(&from, &to, lamports, recent_blockhash);
    let signature = signing_key.sign(&message).to_bytes();

    let mut wire = Vec::with_capacity(1 + 64 + message.len());
    encode_compact_u16(1, &mut wire);
    wire.extend_from_slice(&signature);
    wire.extend_from_slice(&message);

    Ok(SignedTransaction {
        chain: Chain::Solana,
        encoded: base64::engine::general_purpose::STANDARD.encode(&wire),
        tx_id: bs58::encode(signature).into_string(),
    })
}
