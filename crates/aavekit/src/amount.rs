use crate::errors::AavekitError;
use alloy::primitives::U256;
use eyre::Context as _;

/// WETH, aWETH and the variable debt token all use 18 decimals.
pub const WETH_DECIMALS: u8 = 18;

/// Unit tokens agents tend to append to amounts ("0.5 WETH", "1eth").
pub const WETH_UNITS: &[&str] = &["weth"];
pub const ETH_UNITS: &[&str] = &["weth", "eth"];

/// Strip unit tokens from either end of an amount, case-insensitively.
///
/// Longer tokens are tried first, so "1weth" loses "weth" rather than "eth".
/// Tokens inside the number are left alone and fail to parse later.
pub fn strip_unit_tokens(raw: &str, units: &[&str]) -> String {
    let mut tokens: Vec<String> = units
        .iter()
        .filter(|u| !u.is_empty())
        .map(|u| u.to_ascii_lowercase())
        .collect();
    tokens.sort_by_key(|t| std::cmp::Reverse(t.len()));

    let mut out = raw.trim();
    'strip: loop {
        let lower = out.to_ascii_lowercase();
        for t in &tokens {
            let rest = if lower.ends_with(t.as_str()) {
                out.get(..out.len() - t.len())
            } else if lower.starts_with(t.as_str()) {
                out.get(t.len()..)
            } else {
                None
            };
            if let Some(rest) = rest {
                out = rest.trim();
                continue 'strip;
            }
        }
        return out.to_owned();
    }
}

pub fn parse_amount_ui_to_base_u128(s: &str, decimals: u32) -> eyre::Result<u128> {
    let s = s.trim();
    if s.is_empty() {
        eyre::bail!("empty amount");
    }

    let (whole, frac) = match s.split_once('.') {
        Some((a, b)) => (a, b),
        None => (s, ""),
    };

    if whole.starts_with('-') {
        eyre::bail!("amount must be non-negative");
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        eyre::bail!("not a decimal number: {s:?}");
    }
    if whole.is_empty() && frac.is_empty() {
        eyre::bail!("not a decimal number: {s:?}");
    }

    let whole_v: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().context("amount overflow")?
    };

    if frac.len() > decimals as usize {
        eyre::bail!("too many decimal places for token (decimals={decimals})");
    }

    let mut frac_s = frac.to_owned();
    while frac_s.len() < decimals as usize {
        frac_s.push('0');
    }
    let frac_v: u128 = if frac_s.is_empty() {
        0
    } else {
        frac_s.parse().context("parse fractional")?
    };

    let scale = 10_u128
        .checked_pow(decimals)
        .ok_or_else(|| eyre::eyre!("decimals too large"))?;

    let base = whole_v
        .checked_mul(scale)
        .and_then(|x| x.checked_add(frac_v))
        .ok_or_else(|| eyre::eyre!("amount overflow"))?;

    Ok(base)
}

/// Sanitise and parse a user amount into an 18-decimal integer. Zero is rejected.
pub fn parse_positive_weth_amount(raw: &str, units: &[&str]) -> Result<U256, AavekitError> {
    let cleaned = strip_unit_tokens(raw, units);
    if cleaned.is_empty() {
        return Err(AavekitError::InvalidAmount("amount is required".into()));
    }
    let base = parse_amount_ui_to_base_u128(&cleaned, u32::from(WETH_DECIMALS))
        .map_err(|e| AavekitError::InvalidAmount(format!("{e:#}")))?;
    if base == 0 {
        return Err(AavekitError::InvalidAmount(
            "amount must be greater than zero".into(),
        ));
    }
    Ok(U256::from(base))
}

/// Like [`parse_positive_weth_amount`], but also accepts `max` for an unlimited allowance.
pub fn parse_allowance_amount(raw: &str) -> Result<U256, AavekitError> {
    let cleaned = strip_unit_tokens(raw, WETH_UNITS);
    if cleaned.eq_ignore_ascii_case("max") || cleaned.eq_ignore_ascii_case("unlimited") {
        return Ok(U256::MAX);
    }
    parse_positive_weth_amount(&cleaned, WETH_UNITS)
}

/// Format a base-unit integer amount into a UI decimal string without using floats.
///
/// Examples:
/// - base=1500000, decimals=6 => "1.5"
/// - base=1, decimals=18 => "0.000000000000000001"
pub fn format_amount_base_to_ui_string(base: U256, decimals: u8) -> eyre::Result<String> {
    if decimals == 0 {
        return Ok(base.to_string());
    }
    let scale = U256::from(10_u8)
        .checked_pow(U256::from(decimals))
        .ok_or_else(|| eyre::eyre!("decimals too large"))?;
    let whole = base / scale;
    let frac = base % scale;
    if frac.is_zero() {
        return Ok(whole.to_string());
    }
    let mut frac_s = format!("{:0>width$}", frac.to_string(), width = usize::from(decimals));
    while frac_s.ends_with('0') {
        frac_s.pop();
    }
    Ok(format!("{whole}.{frac_s}"))
}

/// Render an 18-decimal amount, falling back to the raw integer.
pub fn format_weth(base: U256) -> String {
    format_amount_base_to_ui_string(base, WETH_DECIMALS).unwrap_or_else(|_| base.to_string())
}
