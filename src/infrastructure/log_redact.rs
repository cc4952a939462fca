//! 日志脱敏
//!
//! 地址只显示首尾；助记词与私钥永远不进日志。
//! 节点或签名库返回的错误文本先经过 `redact_secrets` 再记录。

use once_cell::sync::Lazy;
use regex::Regex;

/// 64 位及以上的十六进制串（私钥 / secret key / 原始交易）
static LONG_HEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:0x)?[0-9a-fA-F]{64,}").expect("static regex"));

/// 连续 12 个以上小写单词（疑似助记词）
static WORD_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:[a-z]{3,8}\s+){11,}[a-z]{3,8}\b").expect("static regex")
});

/// 脱敏十六进制字符串（显示前缀和后缀）
pub fn redact_hex_string(hex: &str, show_chars: usize) -> String {
    if hex.len() <= show_chars * 2 {
        return "*".repeat(hex.len());
    }

    let prefix = &hex[..show_chars];
    let suffix = &hex[hex.len() - show_chars..];
    format!("{}...{}", prefix, suffix)
}

/// 脱敏地址（显示前6位和后4位）
pub fn redact_address(address: &str) -> String {
    if address.len() < 10 || !address.is_ascii() {
        return "*".repeat(address.chars().count());
    }

    let prefix = &address[..6];
    let suffix = &address[address.len() - 4..];
    format!("{}...{}", prefix, suffix)
}

/// 清理自由文本中的疑似密钥材料
pub fn redact_secrets(text: &str) -> String {
    let text = LONG_HEX.replace_all(text, "[REDACTED_HEX]");
    WORD_RUN
        .replace_all(&text, "[REDACTED_MNEMONIC]")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_hex_string() {
        let hex = "0x1234567890abcdef1234567890abcdef12345678";
        assert_eq!(redact_hex_string(hex, 10), "0x12345678...ef12345678");
    }

    #[test]
    fn test_redact_address() {
        let address = "0x742d35Cc6634C0532925a3b844Bc9e7595f0bFd2";
        assert_eq!(redact_address(address), "0x742d...bFd2");
        assert_eq!(redact_address("short"), "*****");
    }

    #[test]
    fn test_redact_private_key_in_text() {
        let msg = "signing failed for key 0x1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727: bad";
        let cleaned = redact_secrets(msg);
        assert!(!cleaned.contains("1ab42cc4"));
        assert!(cleaned.contains("[REDACTED_HEX]"));
        assert!(cleaned.ends_with(": bad"));
    }

    #[test]
    fn test_redact_mnemonic_in_text() {
        let msg = "import failed: abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
        let cleaned = redact_secrets(msg);
        assert!(!cleaned.contains("abandon"));
        assert!(cleaned.starts_with("import failed"));
    }

    #[test]
    fn test_plain_text_untouched() {
        let msg = "RPC error -32000: insufficient funds for gas";
        assert_eq!(redact_secrets(msg), msg);
    }
}
