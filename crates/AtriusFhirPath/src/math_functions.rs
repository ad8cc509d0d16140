//! # FHIRPath Math Functions
//!
//! Implements `abs()`, `ceiling()`, `floor()`, `truncate()`, `round()`, `exp()`, `ln()`,
//! `log()`, `power()` and `sqrt()`.
//!
//! All of them take a singleton numeric input: an empty input gives empty,
//! more than one item fails with `NotSingleton` and a non-numeric value fails
//! with `InvalidType`. Results that cannot be represented (overflow, the
//! logarithm of a non-positive number, the root of a negative one) give
//! empty.

use atrius_fhirpath_support::system::{Any, Quantity, decimal};
use atrius_fhirpath_support::{Collection, EvaluationError};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

/// Fractional digits kept from floating point computations.
const FLOAT_PRECISION: u32 = 8;

/// The numeric input of a math function, or `None` for an empty input.
fn numeric_input(input: &Collection, function: &str) -> Result<Option<Any>, EvaluationError> {
    let Some(item) = input.single()? else {
        return Ok(None);
    };
    match item.to_system() {
        Some(value @ (Any::Integer(_) | Any::Decimal(_))) => Ok(Some(value)),
        Some(value @ Any::Quantity(_)) if function == "abs" => Ok(Some(value)),
        _ => Err(EvaluationError::InvalidType(format!(
            "{}() requires a numeric input, got {:?}",
            function, item
        ))),
    }
}

fn as_decimal(value: &Any) -> Decimal {
    match value {
        Any::Integer(i) => Decimal::from(*i),
        Any::Decimal(d) => *d,
        Any::Quantity(q) => q.value(),
        _ => Decimal::ZERO,
    }
}

/// Computes a transcendental function through `f64`, rounding the result
/// to [`FLOAT_PRECISION`] digits. Non-finite results are `None`.
fn via_f64(value: Decimal, f: impl FnOnce(f64) -> f64) -> Option<Decimal> {
    let computed = f(value.to_f64()?);
    if !computed.is_finite() {
        return None;
    }
    Decimal::from_f64(computed).map(|d| decimal::round(d, FLOAT_PRECISION).normalize())
}

/// Wraps an optional result; `None` (unrepresentable) gives empty.
fn result(value: Option<Any>) -> Result<Collection, EvaluationError> {
    Ok(value.map(Collection::from).unwrap_or_default())
}

/// Applies a Decimal to Decimal function after widening Integer input.
fn decimal_function(
    input: &Collection,
    function: &str,
    f: impl FnOnce(Decimal) -> Option<Decimal>,
) -> Result<Collection, EvaluationError> {
    let Some(value) = numeric_input(input, function)? else {
        return Ok(Collection::new());
    };
    result(f(as_decimal(&value)).map(Any::Decimal))
}

/// Applies a Decimal to Integer function; Integer input passes through.
fn integer_function(
    input: &Collection,
    function: &str,
    f: impl FnOnce(Decimal) -> Decimal,
) -> Result<Collection, EvaluationError> {
    match numeric_input(input, function)? {
        None => Ok(Collection::new()),
        Some(Any::Integer(i)) => Ok(Collection::singleton(i)),
        Some(value) => result(f(as_decimal(&value)).to_i32().map(Any::Integer)),
    }
}

/// Implements the FHIRPath abs() function
///
/// Integer, Decimal and Quantity inputs keep their type (and unit).
pub fn abs_function(input: &Collection) -> Result<Collection, EvaluationError> {
    let value = match numeric_input(input, "abs")? {
        None => None,
        Some(Any::Integer(i)) => i.checked_abs().map(Any::Integer),
        Some(Any::Quantity(q)) => Some(Any::Quantity(Quantity::new(q.value().abs(), q.unit()))),
        Some(value) => Some(Any::Decimal(as_decimal(&value).abs())),
    };
    result(value)
}

/// Implements the FHIRPath ceiling() function
pub fn ceiling_function(input: &Collection) -> Result<Collection, EvaluationError> {
    integer_function(input, "ceiling", |d| d.ceil())
}

/// Implements the FHIRPath floor() function
pub fn floor_function(input: &Collection) -> Result<Collection, EvaluationError> {
    integer_function(input, "floor", |d| d.floor())
}

/// Implements the FHIRPath truncate() function
pub fn truncate_function(input: &Collection) -> Result<Collection, EvaluationError> {
    integer_function(input, "truncate", |d| d.trunc())
}

/// Implements the FHIRPath round([precision]) function
///
/// Rounds half away from zero to `precision` decimal places (default 0).
///
/// # Errors
///
/// `InvalidType` for a negative precision.
pub fn round_function(input: &Collection, precision: Option<i32>) -> Result<Collection, EvaluationError> {
    let precision = precision.unwrap_or(0);
    let precision = u32::try_from(precision).map_err(|_| {
        EvaluationError::InvalidType(format!("round() precision must not be negative, got {}", precision))
    })?;
    decimal_function(input, "round", |d| Some(decimal::round(d, precision)))
}

/// Implements the FHIRPath exp() function
pub fn exp_function(input: &Collection) -> Result<Collection, EvaluationError> {
    decimal_function(input, "exp", |d| via_f64(d, f64::exp))
}

/// Implements the FHIRPath ln() function
pub fn ln_function(input: &Collection) -> Result<Collection, EvaluationError> {
    decimal_function(input, "ln", |d| {
        if d <= Decimal::ZERO { None } else { via_f64(d, f64::ln) }
    })
}

/// Implements the FHIRPath log(base) function
pub fn log_function(input: &Collection, base: Decimal) -> Result<Collection, EvaluationError> {
    decimal_function(input, "log", |d| {
        if d <= Decimal::ZERO || base <= Decimal::ZERO || base == Decimal::ONE {
            return None;
        }
        let base = base.to_f64()?;
        via_f64(d, |x| x.ln() / base.ln())
    })
}

/// Implements the FHIRPath sqrt() function
pub fn sqrt_function(input: &Collection) -> Result<Collection, EvaluationError> {
    decimal_function(input, "sqrt", |d| {
        if d.is_sign_negative() { None } else { via_f64(d, f64::sqrt) }
    })
}

/// Implements the FHIRPath power(exponent) function
///
/// An Integer raised to a non-negative Integer stays an Integer; every other
/// combination is computed as a Decimal. Results that are not real numbers
/// (`(-1).power(0.5)`) or overflow give empty.
pub fn power_function(input: &Collection, exponent: Any) -> Result<Collection, EvaluationError> {
    let Some(base) = numeric_input(input, "power")? else {
        return Ok(Collection::new());
    };
    let value = match (&base, &exponent) {
        (Any::Integer(b), Any::Integer(e)) if *e >= 0 => u32::try_from(*e)
            .ok()
            .and_then(|e| b.checked_pow(e))
            .map(Any::Integer),
        (_, Any::Integer(_) | Any::Decimal(_)) => {
            let exponent = as_decimal(&exponent).to_f64();
            exponent
                .and_then(|e| via_f64(as_decimal(&base), |b| b.powf(e)))
                .map(Any::Decimal)
        }
        _ => {
            return Err(EvaluationError::InvalidReturnType(format!(
                "power() exponent must be a number, got {}",
                exponent.type_name()
            )));
        }
    };
    result(value)
}
