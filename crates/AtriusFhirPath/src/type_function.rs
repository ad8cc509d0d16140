//! # FHIRPath Type Functions
//!
//! Implements the function forms of the type operators: `is()`, `as()` and
//! `ofType()`. Their argument is a type specifier written in expression
//! position (`ofType(Quantity)`, `is(FHIR.string)`), which is read back from
//! the argument's expression tree rather than evaluated.

use atrius_fhirpath_support::{Collection, EvaluationError};

use crate::evaluator::{EvaluationContext, is_of_type, unwrap_choice};
use crate::expression::Expression;
use crate::fhir_type_hierarchy::TypeSpecifier;

/// Recovers a dotted type name from an argument expression.
fn type_name_of(expression: &Expression) -> Option<String> {
    match expression {
        Expression::Type(name) | Expression::Field(name) => Some(name.clone()),
        Expression::Literal(Some(atrius_fhirpath_support::system::Any::String(name))) => {
            Some(name.clone())
        }
        Expression::Sequence(stages) => {
            let parts: Option<Vec<String>> = stages.iter().map(type_name_of).collect();
            parts.map(|parts| parts.join("."))
        }
        _ => None,
    }
}

/// Reads the type specifier argument of a type function.
pub(crate) fn type_specifier_argument(
    function: &str,
    args: &[Expression],
) -> Result<TypeSpecifier, EvaluationError> {
    let argument = args.first().ok_or_else(|| {
        EvaluationError::WrongArity(format!("{}() expects a type specifier", function))
    })?;
    let name = type_name_of(argument).ok_or_else(|| {
        EvaluationError::InvalidType(format!(
            "{}() expects a type specifier, got {:?}",
            function, argument
        ))
    })?;
    TypeSpecifier::parse(&name)
}

/// Implements the FHIRPath ofType(type) function
///
/// Keeps the items whose type is `type` or one of its subtypes. Choice
/// wrappers are replaced by their value in the output.
pub fn of_type_function(
    _context: &mut EvaluationContext,
    input: &Collection,
    args: &[Expression],
) -> Result<Collection, EvaluationError> {
    let type_specifier = type_specifier_argument("ofType", args)?;
    Ok(input
        .iter()
        .filter(|item| is_of_type(item, &type_specifier))
        .map(|item| unwrap_choice(item.clone()))
        .collect())
}

/// Implements the FHIRPath is(type) function
///
/// Function form of the `is` operator: the input must hold at most one item;
/// empty input gives empty.
pub fn is_function(
    _context: &mut EvaluationContext,
    input: &Collection,
    args: &[Expression],
) -> Result<Collection, EvaluationError> {
    let type_specifier = type_specifier_argument("is", args)?;
    Ok(match input.single()? {
        Some(item) => Collection::singleton(is_of_type(item, &type_specifier)),
        None => Collection::new(),
    })
}

/// Implements the FHIRPath as(type) function
///
/// Function form of the `as` operator: returns the (choice-unwrapped) input
/// item when its type matches, empty otherwise.
pub fn as_function(
    _context: &mut EvaluationContext,
    input: &Collection,
    args: &[Expression],
) -> Result<Collection, EvaluationError> {
    let type_specifier = type_specifier_argument("as", args)?;
    Ok(match input.single()? {
        Some(item) if is_of_type(item, &type_specifier) => {
            Collection::from(vec![unwrap_choice(item.clone())])
        }
        _ => Collection::new(),
    })
}
