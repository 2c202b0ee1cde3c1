//! Fixed-point money helpers. Every amount in the ledger carries exactly two
//! fraction digits.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use crate::error::{LedgerError, Result};

pub const SCALE: u32 = 2;

/// Round to cents, halves away from zero
pub fn normalize(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(SCALE);
    rounded
}

/// Normalize an amount and reject anything that is not strictly positive
pub fn positive(amount: Decimal) -> Result<Decimal> {
    let amount = normalize(amount);
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(amount.to_string()));
    }
    Ok(amount)
}

/// Parse user input such as "150", "150.5" or "1,250.00"
pub fn parse_amount(input: &str) -> Result<Decimal> {
    let cleaned: String = input.trim().chars().filter(|c| *c != ',').collect();
    let amount =
        Decimal::from_str(&cleaned).map_err(|_| LedgerError::InvalidAmount(input.to_string()))?;
    positive(amount)
}

/// Format a money amount with two decimal places and thousands separators
pub fn format_money(amount: Decimal, currency_symbol: &str) -> String {
    let rendered = normalize(amount).to_string();
    let (whole, frac) = rendered.split_once('.').unwrap_or((rendered.as_str(), "00"));

    let negative = whole.starts_with('-');
    let digits = whole.trim_start_matches('-');
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{currency_symbol}{grouped}.{frac}")
    } else {
        format!("{currency_symbol}{grouped}.{frac}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_keeps_two_digits() {
        assert_eq!(normalize(Decimal::new(1005, 3)).to_string(), "1.01");
        assert_eq!(normalize(Decimal::from(100)).to_string(), "100.00");
    }

    #[test]
    fn parse_rejects_zero_and_garbage() {
        assert!(parse_amount("0").is_err());
        assert!(parse_amount("-5").is_err());
        assert!(parse_amount("abc").is_err());
        assert_eq!(parse_amount("1,250.5").unwrap().to_string(), "1250.50");
    }

    #[test]
    fn format_groups_thousands() {
        assert_eq!(format_money(Decimal::new(123456789, 2), "$"), "$1,234,567.89");
        assert_eq!(format_money(Decimal::from(50), "$"), "$50.00");
        assert_eq!(format_money(Decimal::new(-100050, 2), "$"), "-$1,000.50");
    }
}
