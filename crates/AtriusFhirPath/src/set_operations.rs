//! # FHIRPath Set Operations
//!
//! Implements set operations including `union()`, `combine()`, `intersect()`, and `exclude()` for collections.
//!
//! Membership uses FHIRPath equality (see [`Collection::contains_item`]), so
//! an Integer and an equal Decimal count as the same item.

use atrius_fhirpath_support::{Collection, EvaluationError};

use crate::collection_functions::evaluate_argument;
use crate::distinct_functions::deduplicate;
use crate::evaluator::EvaluationContext;
use crate::expression::Expression;

/// Implements the FHIRPath `intersect` function
///
/// Syntax: collection.intersect(other : collection) : collection
///
/// Returns the items of the input that also appear in `other`, without
/// duplicates and in input order.
///
/// # Examples
///
/// ```text
/// (1 | 2 | 3).intersect(2 | 3 | 4) = (2 | 3)
/// (1 | 2 | 3).intersect({}) = {}
/// ```
pub fn intersect_function(
    context: &mut EvaluationContext,
    input: &Collection,
    args: &[Expression],
) -> Result<Collection, EvaluationError> {
    let other = evaluate_argument(context, input, &args[0])?;
    Ok(deduplicate(
        input.iter().filter(|item| other.contains_item(item)),
    ))
}

/// Implements the FHIRPath `exclude` function
///
/// Returns the items of the input that do not appear in `other`. Order and
/// duplicates of the input are preserved.
pub fn exclude_function(
    context: &mut EvaluationContext,
    input: &Collection,
    args: &[Expression],
) -> Result<Collection, EvaluationError> {
    let other = evaluate_argument(context, input, &args[0])?;
    Ok(input
        .iter()
        .filter(|item| !other.contains_item(item))
        .cloned()
        .collect())
}

/// Implements the FHIRPath `union` function
///
/// Merges the input and `other`, removing duplicates. Same as the `|`
/// operator.
pub fn union_function(
    context: &mut EvaluationContext,
    input: &Collection,
    args: &[Expression],
) -> Result<Collection, EvaluationError> {
    let other = evaluate_argument(context, input, &args[0])?;
    Ok(deduplicate(input.iter().chain(other.iter())))
}

/// Implements the FHIRPath `combine` function
///
/// Concatenates the input and `other`, keeping duplicates.
pub fn combine_function(
    context: &mut EvaluationContext,
    input: &Collection,
    args: &[Expression],
) -> Result<Collection, EvaluationError> {
    let mut output = input.clone();
    output.extend(evaluate_argument(context, input, &args[0])?);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use atrius_fhirpath_support::Item;

    fn ints(values: &[i32]) -> Collection {
        values.iter().copied().map(Item::from).collect()
    }

    fn run(
        function: fn(&mut EvaluationContext, &Collection, &[Expression]) -> Result<Collection, EvaluationError>,
        input: &[i32],
        other: &[i32],
    ) -> Collection {
        let input = ints(input);
        let mut context = EvaluationContext::new(&input).with_constant("other", ints(other));
        function(&mut context, &input, &[Expression::constant("other")]).unwrap()
    }

    #[test]
    fn test_intersect() {
        assert_eq!(run(intersect_function, &[1, 2, 1, 3], &[1, 3, 4]), ints(&[1, 3]));
        assert_eq!(run(intersect_function, &[1, 2], &[]), ints(&[]));
    }

    #[test]
    fn test_exclude_keeps_duplicates() {
        assert_eq!(run(exclude_function, &[1, 2, 2, 3], &[3]), ints(&[1, 2, 2]));
    }

    #[test]
    fn test_union_and_combine() {
        assert_eq!(run(union_function, &[1, 2, 2], &[2, 3]), ints(&[1, 2, 3]));
        assert_eq!(run(combine_function, &[1, 2, 2], &[2, 3]), ints(&[1, 2, 2, 2, 3]));
    }
}
