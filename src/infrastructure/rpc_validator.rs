// RPC响应校验模块 - 防止链上数据污染

use anyhow::{Context, Result};
use serde_json::Value;

/// 解析 JSON-RPC 十六进制数量（余额 / gas price）
pub fn validate_quantity(quantity_hex: &str) -> Result<u128> {
    let digits = quantity_hex
        .strip_prefix("0x")
        .context("Quantity must be 0x-prefixed")?;

    // u128 最多 32 个十六进制字符
    if digits.is_empty() || digits.len() > 32 {
        anyhow::bail!("Quantity hex string has invalid length: {}", digits.len());
    }

    u128::from_str_radix(digits, 16).context("Failed to parse quantity from hex")
}

/// 验证RPC返回的余额值
pub fn validate_balance(balance_hex: &str) -> Result<u128> {
    let balance = validate_quantity(balance_hex)?;

    // 10^30 wei，约一万亿 ETH
    const MAX_REASONABLE_BALANCE: u128 = 1_000_000_000_000_000_000_000_000_000_000;
    if balance > MAX_REASONABLE_BALANCE {
        anyhow::bail!("Balance exceeds reasonable maximum: {}", balance);
    }

    Ok(balance)
}

/// 验证RPC返回的nonce值
pub fn validate_nonce(nonce_hex: &str) -> Result<u64> {
    let nonce = validate_quantity(nonce_hex)?;
    u64::try_from(nonce).context("Nonce exceeds u64")
}

/// 验证交易哈希格式
pub fn validate_tx_hash(tx_hash: &str) -> Result<String> {
    let hash = tx_hash.trim_start_matches("0x");

    if hash.len() != 64 {
        anyhow::bail!(
            "Invalid transaction hash length: expected 64, got {}",
            hash.len()
        );
    }

    if !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        anyhow::bail!("Invalid transaction hash format: contains non-hex characters");
    }

    Ok(format!("0x{}", hash.to_lowercase()))
}

/// Solana 交易签名：base58，64 字节
pub fn validate_signature(signature: &str) -> Result<String> {
    let bytes = bs58::decode(signature)
        .into_vec()
        .context("Signature is not valid base58")?;
    if bytes.len() != 64 {
        anyhow::bail!("Invalid signature length: expected 64, got {}", bytes.len());
    }
    Ok(signature.to_string())
}

/// 验证RPC响应格式，返回 result 字段
pub fn validate_rpc_response(json: Value) -> Result<Value> {
    if let Some(error) = json.get("error") {
        let error_code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(-1);
        let error_msg = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error");
        anyhow::bail!("RPC error {}: {}", error_code, error_msg);
    }

    if let Some(version) = json.get("jsonrpc") {
        if version.as_str() != Some("2.0") {
            anyhow::bail!("Unsupported JSON-RPC version: {:?}", version);
        }
    }

    match json {
        Value::Object(mut map) => map
            .remove("result")
            .context("Missing result field in RPC response"),
        _ => anyhow::bail!("RPC response is not a JSON object"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_validate_balance() {
        assert_eq!(
            validate_balance("0x1bc16d674ec80000").unwrap(),
            2_000_000_000_000_000_000
        ); // 2 ETH
        assert_eq!(validate_balance("0x0").unwrap(), 0);
        assert!(validate_balance("invalid").is_err());
        assert!(validate_balance("0x").is_err());
    }

    #[test]
    fn test_validate_nonce() {
        assert_eq!(validate_nonce("0x5").unwrap(), 5);
        assert!(validate_nonce("0x10000000000000000").is_err());
    }

    #[test]
    fn test_validate_tx_hash() {
        let hash = "0x1234567890ABCDEF1234567890abcdef1234567890abcdef1234567890abcdef";
        assert_eq!(validate_tx_hash(hash).unwrap(), hash.to_lowercase());
        assert!(validate_tx_hash("invalid").is_err());
    }

    #[test]
    fn test_validate_signature() {
        let sig = bs58::encode([7u8; 64]).into_string();
        assert!(validate_signature(&sig).is_ok());
        assert!(validate_signature(&bs58::encode([7u8; 32]).into_string()).is_err());
    }

    #[test]
    fn test_validate_rpc_response() {
        let ok = json!({"jsonrpc": "2.0", "id": 1, "result": "0x10"});
        assert_eq!(validate_rpc_response(ok).unwrap(), json!("0x10"));

        let null_result = json!({"jsonrpc": "2.0", "id": 1, "result": null});
        assert_eq!(validate_rpc_response(null_result).unwrap(), Value::Null);

        let err = json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32000, "message": "nonce too low"}});
        let msg = validate_rpc_response(err).unwrap_err().to_string();
        assert!(msg.contains("-32000"));
        assert!(msg.contains("nonce too low"));

        assert!(validate_rpc_response(json!({"jsonrpc": "2.0", "id": 1})).is_err());
    }
}
