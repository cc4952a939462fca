//! 金额换算：十进制字符串 ↔ 链上最小单位（wei / lamports）

use std::str::FromStr;

use anyhow::{Context, Result};
use rust_decimal::Decimal;

/// 小数位超出精度时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// 拒绝（ETH）
    Reject,
    /// 向下截断（SOL，等同 floor(amount * 1e9)）
    Truncate,
}

/// 解析正数金额为最小单位
pub fn to_base_units(amount: &str, decimals: u32, rounding: Rounding) -> Result<u128> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        anyhow::bail!("amount is required");
    }
    if trimmed.starts_with('-') {
        anyhow::bail!("amount must be greater than zero");
    }
    // 只接受普通小数写法；Decimal 本身还接受科学计数法和下划线分隔
    if !is_plain_decimal(trimmed) {
        anyhow::bail!("invalid amount: {}", trimmed);
    }

    let value = Decimal::from_str(trimmed)
        .with_context(|| format!("invalid amount: {}", trimmed))?;
    if value <= Decimal::ZERO {
        anyhow::bail!("amount must be greater than zero");
    }

    let scale = value.scale();
    let mantissa = u128::try_from(value.mantissa()).context("amount out of range")?;

    let units = if scale <= decimals {
        10u128
            .checked_pow(decimals - scale)
            .and_then(|factor| mantissa.checked_mul(factor))
            .context("amount out of range")?
    } else {
        match rounding {
            Rounding::Reject => {
                anyhow::bail!("amount has more than {} decimal places", decimals)
            }
            Rounding::Truncate => mantissa / 10u128.pow(scale - decimals),
        }
    };

    if units == 0 {
        anyhow::bail!("amount is below the smallest unit");
    }
    Ok(units)
}

fn is_plain_decimal(s: &str) -> bool {
    let mut parts = s.splitn(2, '.');
    let int_part = parts.next().unwrap_or_default();
    let frac_part = parts.next().unwrap_or_default();
    !(int_part.is_empty() && frac_part.is_empty())
        && int_part.bytes().all(|b| b.is_ascii_digit())
        && frac_part.bytes().all(|b| b.is_ascii_digit())
}

/// 最小单位 → 十进制字符串（去掉尾随 0）
pub fn format_base_units(units: u128, decimals: u32) -> String {
    match to_decimal(units, decimals) {
        Some(value) => value.normalize().to_string(),
        // 超出 Decimal 96 位尾数范围时退回整数部分
        None => (units / 10u128.pow(decimals)).to_string(),
    }
}

pub fn to_decimal(units: u128, decimals: u32) -> Option<Decimal> {
    let signed = i128::try_from(units).ok()?;
    Decimal::try_from_i128_with_scale(signed, decimals).ok()
}
