//! # FHIRPath Collection Functions
//!
//! Implements collection manipulation functions including `count()`, `empty()`, `exists()`,
//! `select()`, `where()`, and the subsetting functions `single()`, `first()` and `last()`.
//!
//! `exists`, `all`, `where` and `select` take their argument unevaluated and
//! evaluate it once per input item, with that item as the focus.

use atrius_fhirpath_support::{Collection, EvaluationError, Item};

use crate::evaluator::{EvaluationContext, evaluate};
use crate::expression::Expression;

/// Evaluates `expression` with a single item as its input, on a cloned
/// context.
pub(crate) fn evaluate_for_item(
    context: &EvaluationContext,
    expression: &Expression,
    item: &Item,
) -> Result<Collection, EvaluationError> {
    let mut branch = context.clone();
    evaluate(&mut branch, expression, &Collection::from(vec![item.clone()]))
}

/// Evaluates a collection-valued argument once against the function's input,
/// on a cloned context.
pub(crate) fn evaluate_argument(
    context: &EvaluationContext,
    input: &Collection,
    argument: &Expression,
) -> Result<Collection, EvaluationError> {
    let mut branch = context.clone();
    evaluate(&mut branch, argument, input)
}

/// Singleton evaluation of a criterion for one item: empty counts as false.
fn criterion_holds(
    context: &EvaluationContext,
    criterion: &Expression,
    item: &Item,
) -> Result<bool, EvaluationError> {
    Ok(evaluate_for_item(context, criterion, item)?
        .to_singleton_boolean()?
        .unwrap_or(false))
}

/// Implements the FHIRPath empty() function
///
/// Returns true if the input collection is empty and false otherwise.
pub fn empty_function(input: &Collection) -> Result<Collection, EvaluationError> {
    Ok(Collection::singleton(input.is_empty()))
}

/// Implements the FHIRPath exists([criteria]) function
///
/// Without an argument, returns true if the input has any items. With a
/// criterion, returns true if any item satisfies it, which is the same as
/// `where(criteria).exists()`.
pub fn exists_function(
    context: &mut EvaluationContext,
    input: &Collection,
    args: &[Expression],
) -> Result<Collection, EvaluationError> {
    let Some(criterion) = args.first() else {
        return Ok(Collection::singleton(!input.is_empty()));
    };
    for item in input {
        if criterion_holds(context, criterion, item)? {
            return Ok(Collection::singleton(true));
        }
    }
    Ok(Collection::singleton(false))
}

/// Implements the FHIRPath all(criteria) function
///
/// Returns true if the criterion holds for every item of the input, and true
/// for an empty input.
pub fn all_function(
    context: &mut EvaluationContext,
    input: &Collection,
    args: &[Expression],
) -> Result<Collection, EvaluationError> {
    let criterion = &args[0];
    for item in input {
        if !criterion_holds(context, criterion, item)? {
            return Ok(Collection::singleton(false));
        }
    }
    Ok(Collection::singleton(true))
}

/// Implements the FHIRPath count() function
pub fn count_function(input: &Collection) -> Result<Collection, EvaluationError> {
    let count = i32::try_from(input.len())
        .map_err(|_| EvaluationError::IntOverflow(format!("count of {} items", input.len())))?;
    Ok(Collection::singleton(count))
}

/// Implements the FHIRPath hasValue() function
///
/// True when the input is a single item carrying a primitive value.
pub fn has_value_function(input: &Collection) -> Result<Collection, EvaluationError> {
    let has_value = match input.items() {
        [item] => item.to_system().is_some(),
        _ => false,
    };
    Ok(Collection::singleton(has_value))
}

/// Implements the FHIRPath where(criteria) function
///
/// Keeps the items for which the criterion evaluates to true. An empty
/// criterion result excludes the item; a non-Boolean singleton keeps it.
///
/// # Errors
///
/// `NotSingleton` if the criterion produces more than one item for some input
/// item.
pub fn where_function(
    context: &mut EvaluationContext,
    input: &Collection,
    args: &[Expression],
) -> Result<Collection, EvaluationError> {
    let criterion = &args[0];
    let mut output = Collection::new();
    for item in input {
        if criterion_holds(context, criterion, item)? {
            output.push(item.clone());
        }
    }
    Ok(output)
}

/// Implements the FHIRPath select(projection) function
///
/// Evaluates the projection for each item and flattens the results in input
/// order.
pub fn select_function(
    context: &mut EvaluationContext,
    input: &Collection,
    args: &[Expression],
) -> Result<Collection, EvaluationError> {
    let projection = &args[0];
    let mut output = Collection::new();
    for item in input {
        output.extend(evaluate_for_item(context, projection, item)?);
    }
    Ok(output)
}

/// Implements the FHIRPath single() function
///
/// Returns the input if it has at most one item, fails with `NotSingleton`
/// otherwise.
pub fn single_function(input: &Collection) -> Result<Collection, EvaluationError> {
    input.single()?;
    Ok(input.clone())
}

/// Implements the FHIRPath first() function
pub fn first_function(input: &Collection) -> Result<Collection, EvaluationError> {
    Ok(input.iter().take(1).cloned().collect())
}

/// Implements the FHIRPath last() function
pub fn last_function(input: &Collection) -> Result<Collection, EvaluationError> {
    Ok(input.iter().last().cloned().into_iter().collect())
}
