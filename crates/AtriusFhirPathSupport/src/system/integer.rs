//! 32-bit signed integer arithmetic.
//!
//! Overflow never wraps: add, subtract and multiply report
//! [`EvaluationError::IntOverflow`].

use rust_decimal::Decimal;

use crate::evaluation_error::EvaluationError;
use crate::system::decimal;

fn overflow(op: &str, lhs: i32, rhs: i32) -> EvaluationError {
    EvaluationError::IntOverflow(format!("{} {} {}", lhs, op, rhs))
}

pub fn add(lhs: i32, rhs: i32) -> Result<i32, EvaluationError> {
    lhs.checked_add(rhs).ok_or_else(|| overflow("+", lhs, rhs))
}

pub fn sub(lhs: i32, rhs: i32) -> Result<i32, EvaluationError> {
    lhs.checked_sub(rhs).ok_or_else(|| overflow("-", lhs, rhs))
}

pub fn mul(lhs: i32, rhs: i32) -> Result<i32, EvaluationError> {
    lhs.checked_mul(rhs).ok_or_else(|| overflow("*", lhs, rhs))
}

/// The `/` operator always produces a Decimal.
pub fn divide(lhs: i32, rhs: i32) -> Result<Decimal, EvaluationError> {
    decimal::divide(Decimal::from(lhs), Decimal::from(rhs))
}

/// The `div` operator (truncating).
pub fn quotient(lhs: i32, rhs: i32) -> Result<i32, EvaluationError> {
    if rhs == 0 {
        return Err(EvaluationError::DivisionByZero);
    }
    lhs.checked_div(rhs).ok_or_else(|| overflow("div", lhs, rhs))
}

/// The `mod` operator.
pub fn remainder(lhs: i32, rhs: i32) -> Result<i32, EvaluationError> {
    if rhs == 0 {
        return Err(EvaluationError::DivisionByZero);
    }
    lhs.checked_rem(rhs).ok_or_else(|| overflow("mod", lhs, rhs))
}

pub fn negate(value: i32) -> Result<i32, EvaluationError> {
    value
        .checked_neg()
        .ok_or_else(|| EvaluationError::IntOverflow(format!("-({})", value)))
}

/// Parses an integer literal (`[+-]digits`).
pub fn parse(literal: &str) -> Result<i32, EvaluationError> {
    let digits = literal.strip_prefix(['-', '+']).unwrap_or(literal);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EvaluationError::InvalidLiteral(format!(
            "'{}' is not an integer",
            literal
        )));
    }
    literal
        .parse::<i32>()
        .map_err(|_| EvaluationError::IntOverflow(format!("'{}' does not fit in 32 bits", literal)))
}
