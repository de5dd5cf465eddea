//! Conversion between display amounts ("1.5") and integer base units (wei).
//!
//! The arithmetic is done by `ethers::utils::{parse_units, format_units}`;
//! this module only decides which strings are acceptable amounts.

use ethers::types::U256;
use ethers::utils::{format_units, parse_units, ParseUnits};

/// Largest number of integer digits accepted, chosen so that the scaled
/// value always fits in a U256.
const MAX_TOTAL_DIGITS: usize = 76;

/// Decimal places shown for balances
pub const BALANCE_DISPLAY_PLACES: u32 = 4;

/// Parse a non-negative decimal amount in display units into base units.
pub fn parse_amount(amount: &str, decimals: u32) -> Result<U256, String> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err("amount is required".to_string());
    }
    if amount.starts_with('-') {
        return Err("amount must not be negative".to_string());
    }

    let (integer, fraction) = match amount.split_once('.') {
        Some((i, f)) => (i, f),
        None => (amount, ""),
    };
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(integer) || !all_digits(fraction) || (integer.is_empty() && fraction.is_empty()) {
        return Err("amount must be a decimal number".to_string());
    }
    if fraction.len() > decimals as usize {
        return Err(format!("amount has more than {} decimal places", decimals));
    }
    if integer.trim_start_matches('0').len() + decimals as usize > MAX_TOTAL_DIGITS {
        return Err("amount is too large".to_string());
    }

    match parse_units(amount, decimals).map_err(|e| e.to_string())? {
        ParseUnits::U256(value) => Ok(value),
        ParseUnits::I256(_) => Err("amount must not be negative".to_string()),
    }
}

/// Full-precision display string, e.g. "1.500000000000000000"
pub fn format_amount(value: U256, decimals: u32) -> String {
    format_units(value, decimals).unwrap_or_else(|_| value.to_string())
}

/// Display string rounded to `places` decimal places, e.g. "1.2346"
pub fn format_rounded(value: U256, decimals: u32, places: u32) -> String {
    if places >= decimals {
        return format_amount(value, decimals);
    }
    let scale = U256::exp10((decimals - places) as usize);
    let rounded = value.saturating_add(scale / 2) / scale;
    format_units(rounded, places).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn wei(s: &str) -> U256 {
        U256::from_dec_str(s).unwrap()
    }

    #[test]
    fn test_parse_whole_and_fractional() {
        assert_eq!(parse_amount("1", 18).unwrap(), wei("1000000000000000000"));
        assert_eq!(parse_amount("1.5", 18).unwrap(), wei("1500000000000000000"));
        assert_eq!(parse_amount("0.01", 18).unwrap(), wei("10000000000000000"));
        assert_eq!(parse_amount(".5", 18).unwrap(), wei("500000000000000000"));
        assert_eq!(parse_amount(" 2 ", 18).unwrap(), wei("2000000000000000000"));
        assert_eq!(parse_amount("0.000000000000000001", 18).unwrap(), U256::one());
    }

    #[test]
    fn test_parse_zero_is_allowed() {
        assert_eq!(parse_amount("0", 18).unwrap(), U256::zero());
        assert_eq!(parse_amount("0.0", 18).unwrap(), U256::zero());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "   ", "abc", "1e18", "1.2.3", ".", "0x10", "1_000", "+1", "NaN", "1,5"] {
            assert!(parse_amount(bad, 18).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_parse_rejects_negative() {
        let err = parse_amount("-1", 18).unwrap_err();
        assert!(err.contains("negative"));
        assert!(parse_amount("-0.5", 18).is_err());
    }

    #[test]
    fn test_parse_rejects_excess_precision() {
        assert!(parse_amount("0.0000000000000000001", 18).is_err());
        assert!(parse_amount("1.1234567", 6).is_err());
    }

    #[test]
    fn test_parse_rejects_overflow() {
        let huge = "9".repeat(70);
        assert!(parse_amount(&huge, 18).is_err());
    }

    #[test]
    fn test_format_rounded() {
        assert_eq!(format_rounded(wei("1234567890000000000"), 18, 4), "1.2346");
        assert_eq!(format_rounded(U256::zero(), 18, 4), "0.0000");
        assert_eq!(format_rounded(wei("999990000000000000"), 18, 4), "1.0000");
    }

    proptest! {
        #[test]
        fn prop_parse_matches_base_units(int in 0u64..1_000_000_000_000u64, frac in "[0-9]{0,18}") {
            let input = if frac.is_empty() { int.to_string() } else { format!("{}.{}", int, frac) };
            let mut expected = U256::from(int) * U256::exp10(18);
            if !frac.is_empty() {
                expected += U256::from_dec_str(&frac).unwrap() * U256::exp10(18 - frac.len());
            }
            prop_assert_eq!(parse_amount(&input, 18).unwrap(), expected);
        }

        #[test]
        fn prop_format_then_parse_round_trips(raw in any::<u128>()) {
            let value = U256::from(raw);
            prop_assert_eq!(parse_amount(&format_amount(value, 18), 18).unwrap(), value);
        }

        #[test]
        fn prop_negative_never_parses(int in 0u64..1_000_000u64) {
            let input = format!("-{}", int);
            prop_assert!(parse_amount(&input, 18).is_err());
        }
    }
}
