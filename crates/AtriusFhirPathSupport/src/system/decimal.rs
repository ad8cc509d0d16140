//! Decimal arithmetic on top of `rust_decimal`.
//!
//! Every operation is checked: overflow surfaces as
//! [`EvaluationError::DecimalOverflow`] so the expression layer can turn it
//! into an empty result.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::evaluation_error::EvaluationError;

fn overflow(op: &str, lhs: Decimal, rhs: Decimal) -> EvaluationError {
    EvaluationError::DecimalOverflow(format!("{} {} {}", lhs, op, rhs))
}

pub fn add(lhs: Decimal, rhs: Decimal) -> Result<Decimal, EvaluationError> {
    lhs.checked_add(rhs).ok_or_else(|| overflow("+", lhs, rhs))
}

pub fn sub(lhs: Decimal, rhs: Decimal) -> Result<Decimal, EvaluationError> {
    lhs.checked_sub(rhs).ok_or_else(|| overflow("-", lhs, rhs))
}

pub fn mul(lhs: Decimal, rhs: Decimal) -> Result<Decimal, EvaluationError> {
    lhs.checked_mul(rhs).ok_or_else(|| overflow("*", lhs, rhs))
}

/// The `/` operator.
pub fn divide(lhs: Decimal, rhs: Decimal) -> Result<Decimal, EvaluationError> {
    if rhs.is_zero() {
        return Err(EvaluationError::DivisionByZero);
    }
    lhs.checked_div(rhs)
        .map(|d| d.normalize())
        .ok_or_else(|| overflow("/", lhs, rhs))
}

/// The `div` operator: the truncated quotient as an Integer.
pub fn quotient(lhs: Decimal, rhs: Decimal) -> Result<i32, EvaluationError> {
    let exact = divide(lhs, rhs)?;
    exact
        .trunc()
        .to_i32()
        .ok_or_else(|| EvaluationError::IntOverflow(format!("{} div {}", lhs, rhs)))
}

/// The `mod` operator.
pub fn remainder(lhs: Decimal, rhs: Decimal) -> Result<Decimal, EvaluationError> {
    if rhs.is_zero() {
        return Err(EvaluationError::DivisionByZero);
    }
    lhs.checked_rem(rhs).ok_or_else(|| overflow("mod", lhs, rhs))
}

/// Rounds half away from zero to `precision` fractional digits.
pub fn round(value: Decimal, precision: u32) -> Decimal {
    value.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero)
}

/// Parses a decimal literal (`[+-]digits[.digits]`), keeping its scale.
pub fn parse(literal: &str) -> Result<Decimal, EvaluationError> {
    let digits = literal.strip_prefix(['-', '+']).unwrap_or(literal);
    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (digits, None),
    };
    let well_formed = !whole.is_empty()
        && whole.bytes().all(|b| b.is_ascii_digit())
        && fraction.is_none_or(|f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()));
    if !well_formed {
        return Err(EvaluationError::InvalidLiteral(format!(
            "'{}' is not a decimal",
            literal
        )));
    }
    Decimal::from_str(literal)
        .map_err(|e| EvaluationError::InvalidLiteral(format!("'{}': {}", literal, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_checked_arithmetic() {
        assert_eq!(add(d("1.5"), d("2.25")).unwrap(), d("3.75"));
        assert_eq!(mul(d("1.5"), d("2")).unwrap(), d("3.0"));
        assert!(matches!(
            add(Decimal::MAX, Decimal::ONE),
            Err(EvaluationError::DecimalOverflow(_))
        ));
    }

    #[test]
    fn test_division() {
        assert_eq!(divide(d("1"), d("4")).unwrap(), d("0.25"));
        assert_eq!(quotient(d("5.5"), d("0.7")).unwrap(), 7);
        assert_eq!(remainder(d("5.5"), d("0.7")).unwrap(), d("0.6"));
        assert_eq!(divide(d("1"), d("0")), Err(EvaluationError::DivisionByZero));
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round(d("3.14159"), 3), d("3.142"));
        assert_eq!(round(d("2.5"), 0), d("3"));
        assert_eq!(round(d("-2.5"), 0), d("-3"));
    }

    #[test]
    fn test_parse_keeps_scale() {
        assert_eq!(parse("1.50").unwrap().to_string(), "1.50");
        assert_eq!(parse("-0.5").unwrap(), d("-0.5"));
        assert!(parse("1.").is_err());
        assert!(parse("abc").is_err());
        assert!(parse("1e5").is_err());
    }
}
