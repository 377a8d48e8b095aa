//! Human chip-amount notation
//!
//! Users type amounts like `1.5b`, `750m` or `2,5B`; the ledger works in
//! whole chips.

use crate::types::LedgerError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

const BILLION: u64 = 1_000_000_000;
const MILLION: u64 = 1_000_000;
const THOUSAND: u64 = 1_000;

/// Parse a chip amount with an optional `k`/`m`/`b` suffix
///
/// Whitespace is ignored and `,` is read as the decimal separator. The result
/// is rounded to the nearest whole chip.
///
/// # Arguments
///
/// * `input` - Raw user input, e.g. `"1.5b"`
///
/// # Returns
///
/// * `Ok(u64)` - The amount in chips
/// * `Err(LedgerError)` - The input is empty, negative or not a number
pub fn parse_chip_amount(input: &str) -> Result<u64, LedgerError> {
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    if cleaned.is_empty() {
        return Err(LedgerError::validation("chipAmount", "must not be empty"));
    }

    let (digits, multiplier) = match cleaned.chars().last() {
        Some('b') => (&cleaned[..cleaned.len() - 1], BILLION),
        Some('m') => (&cleaned[..cleaned.len() - 1], MILLION),
        Some('k') => (&cleaned[..cleaned.len() - 1], THOUSAND),
        _ => (cleaned.as_str(), 1),
    };

    let value = Decimal::from_str(&digits.replace(',', "."))
        .map_err(|_| LedgerError::validation("chipAmount", format!("'{}' is not a number", input.trim())))?;
    if value.is_sign_negative() {
        return Err(LedgerError::validation("chipAmount", "must not be negative"));
    }

    value
        .checked_mul(Decimal::from(multiplier))
        .map(|chips| chips.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|chips| chips.to_u64())
        .ok_or_else(|| LedgerError::validation("chipAmount", "is too large"))
}

/// Short display form: `1.5B`, `750M`, `2.25K`, or the plain number below 1,000
pub fn format_chip_amount(amount: u64) -> String {
    let (unit, suffix) = match amount {
        a if a >= BILLION => (BILLION, "B"),
        a if a >= MILLION => (MILLION, "M"),
        a if a >= THOUSAND => (THOUSAND, "K"),
        a => return a.to_string(),
    };

    let scaled = (Decimal::from(amount) / Decimal::from(unit))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    format!("{}{}", group_thousands(&scaled.to_string()), suffix)
}

fn group_thousands(number: &str) -> String {
    let (integer, fraction) = match number.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (number, None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match fraction {
        Some(fraction) => format!("{}.{}", grouped, fraction),
        None => grouped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::plain("1500", 1_500)]
    #[case::billions("1.5b", 1_500_000_000)]
    #[case::upper_case_suffix("2B", 2_000_000_000)]
    #[case::millions("750m", 750_000_000)]
    #[case::thousands("12k", 12_000)]
    #[case::comma_decimal("2,5b", 2_500_000_000)]
    #[case::inner_spaces(" 1 . 25 m ", 1_250_000)]
    #[case::rounded("0.0000000015b", 2)]
    fn test_parse_chip_amount(#[case] input: &str, #[case] expected: u64) {
        assert_eq!(parse_chip_amount(input).unwrap(), expected);
    }

    #[rstest]
    #[case::empty("   ")]
    #[case::not_a_number("lots")]
    #[case::suffix_only("b")]
    #[case::negative("-1b")]
    fn test_parse_chip_amount_rejects(#[case] input: &str) {
        assert!(matches!(
            parse_chip_amount(input),
            Err(LedgerError::Validation { .. })
        ));
    }

    #[rstest]
    #[case(999, "999")]
    #[case(1_000, "1K")]
    #[case(2_250, "2.25K")]
    #[case(750_000_000, "750M")]
    #[case(1_500_000_000, "1.5B")]
    #[case(1_234_567_891, "1.23B")]
    #[case(1_234_000_000_000, "1,234B")]
    fn test_format_chip_amount(#[case] amount: u64, #[case] expected: &str) {
        assert_eq!(format_chip_amount(amount), expected);
    }
}
