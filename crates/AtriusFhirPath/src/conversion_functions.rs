//! # FHIRPath Type Conversion Functions
//!
//! Implements type conversion functions including `toString()`, `toInteger()`, `toDecimal()`,
//! `toBoolean()`, `toDate()`, `toDateTime()`, `toTime()` and `toQuantity()`, their
//! `convertsTo*()` counterparts, and `iif()`.
//!
//! Every conversion takes a singleton input. An empty input gives empty, more
//! than one item fails with `NotSingleton`, and a value that cannot be
//! converted gives empty (`false` for the `convertsTo*` forms).

use atrius_fhirpath_support::system::{Any, Date, DateTime, Quantity, Time, decimal, integer};
use atrius_fhirpath_support::{Collection, EvaluationError};
use rust_decimal::Decimal;

use crate::collection_functions::evaluate_argument;
use crate::evaluator::EvaluationContext;
use crate::expression::Expression;
use crate::ucum;

/// Applies a conversion to the singleton System value of the input.
fn convert_input(
    input: &Collection,
    convert: impl Fn(&Any) -> Option<Any>,
) -> Result<Collection, EvaluationError> {
    let Some(item) = input.single()? else {
        return Ok(Collection::new());
    };
    Ok(item
        .to_system()
        .as_ref()
        .and_then(convert)
        .map(Collection::from)
        .unwrap_or_default())
}

/// `convertsTo*` form of a conversion: empty for empty input, otherwise
/// whether the conversion succeeds.
fn converts_input(
    input: &Collection,
    convert: impl Fn(&Any) -> Option<Any>,
) -> Result<Collection, EvaluationError> {
    if input.is_empty() {
        return Ok(Collection::new());
    }
    let converted = convert_input(input, convert)?;
    Ok(Collection::singleton(!converted.is_empty()))
}

fn to_boolean(value: &Any) -> Option<Any> {
    let b = match value {
        Any::Boolean(b) => *b,
        Any::Integer(1) => true,
        Any::Integer(0) => false,
        Any::Decimal(d) if *d == Decimal::ONE => true,
        Any::Decimal(d) if d.is_zero() => false,
        Any::String(s) => match s.to_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" | "1.0" => true,
            "false" | "f" | "no" | "n" | "0" | "0.0" => false,
            _ => return None,
        },
        _ => return None,
    };
    Some(Any::Boolean(b))
}

fn to_integer(value: &Any) -> Option<Any> {
    match value {
        Any::Integer(i) => Some(Any::Integer(*i)),
        Any::Boolean(b) => Some(Any::Integer(i32::from(*b))),
        Any::String(s) => integer::parse(s).ok().map(Any::Integer),
        _ => None,
    }
}

fn to_decimal(value: &Any) -> Option<Any> {
    match value {
        Any::Decimal(d) => Some(Any::Decimal(*d)),
        Any::Integer(i) => Some(Any::Decimal(Decimal::from(*i))),
        Any::Boolean(b) => Some(Any::Decimal(if *b { Decimal::new(10, 1) } else { Decimal::new(0, 1) })),
        Any::String(s) => decimal::parse(s).ok().map(Any::Decimal),
        _ => None,
    }
}

fn to_date(value: &Any) -> Option<Any> {
    match value {
        Any::Date(d) => Some(Any::Date(*d)),
        Any::DateTime(dt) => Some(Any::Date(dt.date())),
        Any::String(s) => Date::parse(s)
            .or_else(|_| DateTime::parse(s).map(|dt| dt.date()))
            .ok()
            .map(Any::Date),
        _ => None,
    }
}

fn to_date_time(value: &Any) -> Option<Any> {
    match value {
        Any::DateTime(dt) => Some(Any::DateTime(*dt)),
        Any::Date(d) => Some(Any::DateTime(d.to_date_time())),
        Any::String(s) => DateTime::parse(s).ok().map(Any::DateTime),
        _ => None,
    }
}

fn to_time(value: &Any) -> Option<Any> {
    match value {
        Any::Time(t) => Some(Any::Time(*t)),
        Any::String(s) => Time::parse(s).ok().map(Any::Time),
        _ => None,
    }
}

fn to_string(value: &Any) -> Option<Any> {
    Some(Any::String(value.to_string()))
}

/// Reads a quantity from a System value. Strings use the literal syntax,
/// with an optional unit (`5`, `5 'mg'`, `4 days`).
fn quantity_of(value: &Any) -> Option<Quantity> {
    let quantity = match value {
        Any::Quantity(q) => q.clone(),
        Any::Integer(i) => Quantity::new(Decimal::from(*i), "1"),
        Any::Decimal(d) => Quantity::new(*d, "1"),
        Any::Boolean(b) => Quantity::new(if *b { Decimal::new(10, 1) } else { Decimal::new(0, 1) }, "1"),
        Any::String(s) => Quantity::parse(s).ok()?,
        _ => return None,
    };
    ucum::validate_unit(quantity.unit()).then_some(quantity)
}

fn to_quantity(value: &Any, unit: Option<&str>) -> Option<Any> {
    let quantity = quantity_of(value)?;
    let quantity = match unit {
        Some(unit) if unit != quantity.unit() => {
            let converted = ucum::convert_units(quantity.value(), quantity.unit(), unit).ok()?;
            Quantity::new(converted, unit)
        }
        _ => quantity,
    };
    Some(Any::Quantity(quantity))
}

/// Implements the FHIRPath toBoolean() function
///
/// Booleans pass through; `1`/`0`, `1.0`/`0.0` and the strings `true`, `t`,
/// `yes`, `y`, `1`, `1.0` (and their false counterparts, case-insensitive)
/// convert.
pub fn to_boolean_function(input: &Collection) -> Result<Collection, EvaluationError> {
    convert_input(input, to_boolean)
}

pub fn converts_to_boolean_function(input: &Collection) -> Result<Collection, EvaluationError> {
    converts_input(input, to_boolean)
}

/// Implements the FHIRPath toInteger() function
///
/// Integers pass through, Booleans become 1 or 0, and strings of the form
/// `[+-]digits` are parsed. Decimals do not convert.
pub fn to_integer_function(input: &Collection) -> Result<Collection, EvaluationError> {
    convert_input(input, to_integer)
}

pub fn converts_to_integer_function(input: &Collection) -> Result<Collection, EvaluationError> {
    converts_input(input, to_integer)
}

/// Implements the FHIRPath toDecimal() function
pub fn to_decimal_function(input: &Collection) -> Result<Collection, EvaluationError> {
    convert_input(input, to_decimal)
}

pub fn converts_to_decimal_function(input: &Collection) -> Result<Collection, EvaluationError> {
    converts_input(input, to_decimal)
}

/// Implements the FHIRPath toDate() function
///
/// A DateTime keeps only its date components.
pub fn to_date_function(input: &Collection) -> Result<Collection, EvaluationError> {
    convert_input(input, to_date)
}

pub fn converts_to_date_function(input: &Collection) -> Result<Collection, EvaluationError> {
    converts_input(input, to_date)
}

/// Implements the FHIRPath toDateTime() function
pub fn to_date_time_function(input: &Collection) -> Result<Collection, EvaluationError> {
    convert_input(input, to_date_time)
}

pub fn converts_to_date_time_function(input: &Collection) -> Result<Collection, EvaluationError> {
    converts_input(input, to_date_time)
}

/// Implements the FHIRPath toTime() function
pub fn to_time_function(input: &Collection) -> Result<Collection, EvaluationError> {
    convert_input(input, to_time)
}

pub fn converts_to_time_function(input: &Collection) -> Result<Collection, EvaluationError> {
    converts_input(input, to_time)
}

/// Implements the FHIRPath toString() function
///
/// Every System value has a string form: temporals without the `@`,
/// quantities as `value 'unit'`.
pub fn to_string_function(input: &Collection) -> Result<Collection, EvaluationError> {
    convert_input(input, to_string)
}

pub fn converts_to_string_function(input: &Collection) -> Result<Collection, EvaluationError> {
    converts_input(input, to_string)
}

/// Implements the FHIRPath toQuantity([unit]) function
///
/// Numbers become quantities with unit `'1'`; strings are read with the
/// quantity literal syntax. Units must be valid UCUM codes or calendar
/// keywords. When `unit` is given and differs, the value is converted to it;
/// incompatible units give empty.
pub fn to_quantity_function(input: &Collection, unit: Option<String>) -> Result<Collection, EvaluationError> {
    convert_input(input, |value| to_quantity(value, unit.as_deref()))
}

pub fn converts_to_quantity_function(
    input: &Collection,
    unit: Option<String>,
) -> Result<Collection, EvaluationError> {
    converts_input(input, |value| to_quantity(value, unit.as_deref()))
}

/// Implements the FHIRPath iif(criterion, true-result [, otherwise-result]) function
///
/// Evaluates the criterion against the input; only the selected branch is
/// evaluated. An empty criterion selects the otherwise branch.
///
/// # Errors
///
/// `NotSingleton` if the input or the criterion has more than one item.
pub fn iif_function(
    context: &mut EvaluationContext,
    input: &Collection,
    args: &[Expression],
) -> Result<Collection, EvaluationError> {
    input.single()?;
    let criterion = evaluate_argument(context, input, &args[0])?.to_singleton_boolean()?;
    match (criterion, args.get(2)) {
        (Some(true), _) => evaluate_argument(context, input, &args[1]),
        (_, Some(otherwise)) => evaluate_argument(context, input, otherwise),
        (_, None) => Ok(Collection::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atrius_fhirpath_support::Item;

    fn lit(s: &str) -> Collection {
        Collection::singleton(Any::parse_literal(s).unwrap())
    }

    #[test]
    fn test_to_boolean() {
        assert_eq!(to_boolean_function(&lit("'Yes'")).unwrap(), lit("true"));
        assert_eq!(to_boolean_function(&lit("0")).unwrap(), lit("false"));
        assert!(to_boolean_function(&lit("2")).unwrap().is_empty());
        assert_eq!(converts_to_boolean_function(&lit("'maybe'")).unwrap(), lit("false"));
        assert!(converts_to_boolean_function(&Collection::new()).unwrap().is_empty());
    }

    #[test]
    fn test_to_integer_and_decimal() {
        assert_eq!(to_integer_function(&lit("'-42'")).unwrap(), lit("-42"));
        assert!(to_integer_function(&lit("1.5")).unwrap().is_empty());
        assert_eq!(to_decimal_function(&lit("'1.50'")).unwrap(), lit("1.50"));
        assert_eq!(to_decimal_function(&lit("true")).unwrap(), lit("1.0"));
    }

    #[test]
    fn test_temporal_conversions() {
        assert_eq!(to_date_function(&lit("'2020-03'")).unwrap(), lit("@2020-03"));
        assert_eq!(
            to_date_function(&lit("@2020-03-04T10:30:00Z")).unwrap(),
            lit("@2020-03-04")
        );
        assert_eq!(to_date_time_function(&lit("@2020")).unwrap(), lit("@2020T"));
        assert_eq!(to_time_function(&lit("'12:30'")).unwrap(), lit("@T12:30"));
        assert_eq!(converts_to_time_function(&lit("'25:00'")).unwrap(), lit("false"));
    }

    #[test]
    fn test_to_string() {
        assert_eq!(to_string_function(&lit("@2020-03-04")).unwrap(), lit("'2020-03-04'"));
        assert_eq!(to_string_function(&lit("5 'mg'")).unwrap(), lit("'5 \\'mg\\''"));
    }

    #[test]
    fn test_to_quantity() {
        assert_eq!(to_quantity_function(&lit("5"), None).unwrap(), lit("5 '1'"));
        assert_eq!(to_quantity_function(&lit("'4 days'"), None).unwrap(), lit("4 days"));
        assert_eq!(
            to_quantity_function(&lit("1 'g'"), Some("mg".to_string())).unwrap(),
            lit("1000 'mg'")
        );
        assert!(to_quantity_function(&lit("1 'g'"), Some("m".to_string())).unwrap().is_empty());
        assert!(to_quantity_function(&lit("'5 \\'bogus\\''"), None).unwrap().is_empty());
        assert_eq!(
            converts_to_quantity_function(&lit("'abc'"), None).unwrap(),
            lit("false")
        );
    }

    #[test]
    fn test_multiple_items() {
        let input = Collection::from(vec![Item::from(1), Item::from(2)]);
        assert!(matches!(
            to_string_function(&input),
            Err(EvaluationError::NotSingleton(_))
        ));
    }

    #[test]
    fn test_iif_evaluates_selected_branch() {
        let input = Collection::singleton(1);
        let mut context = EvaluationContext::new(&input);
        let failing = Expression::constant("undefined");
        let args = [Expression::literal(true), Expression::literal("yes"), failing.clone()];
        assert_eq!(
            iif_function(&mut context, &input, &args).unwrap(),
            Collection::singleton("yes")
        );
        let args = [Expression::empty(), failing, Expression::literal("no")];
        assert_eq!(
            iif_function(&mut context, &input, &args).unwrap(),
            Collection::singleton("no")
        );
        let args = [Expression::literal(false), Expression::literal("yes")];
        assert!(iif_function(&mut context, &input, &args).unwrap().is_empty());
    }
}
