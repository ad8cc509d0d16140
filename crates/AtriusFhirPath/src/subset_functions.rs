//! # FHIRPath Subset Functions
//!
//! Implements subset testing functions: `subsetOf()` and `supersetOf()` for collection comparison.

use atrius_fhirpath_support::{Collection, EvaluationError};

use crate::collection_functions::evaluate_argument;
use crate::evaluator::EvaluationContext;
use crate::expression::Expression;

fn is_subset(subset: &Collection, superset: &Collection) -> bool {
    subset.iter().all(|item| superset.contains_item(item))
}

/// Implements the FHIRPath `subsetOf` function
///
/// Syntax: collection.subsetOf(other : collection) : Boolean
///
/// Returns true if every item of the input is also in `other`.
///
/// # Examples
///
/// ```text
/// (1 | 2).subsetOf(1 | 2 | 3) // true
/// {}.subsetOf(1 | 2 | 3) // true
/// (1 | 2 | 3).subsetOf({}) // false
/// ```
pub fn subset_of_function(
    context: &mut EvaluationContext,
    input: &Collection,
    args: &[Expression],
) -> Result<Collection, EvaluationError> {
    let other = evaluate_argument(context, input, &args[0])?;
    Ok(Collection::singleton(is_subset(input, &other)))
}

/// Implements the FHIRPath `supersetOf` function
///
/// Returns true if every item of `other` is also in the input.
pub fn superset_of_function(
    context: &mut EvaluationContext,
    input: &Collection,
    args: &[Expression],
) -> Result<Collection, EvaluationError> {
    let other = evaluate_argument(context, input, &args[0])?;
    Ok(Collection::singleton(is_subset(&other, input)))
}
