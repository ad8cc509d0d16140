//! # FHIRPath Repeat Function
//!
//! Implements the `repeat()` function for recursive traversal of tree structures.

use std::collections::VecDeque;

use atrius_fhirpath_support::{Collection, EvaluationError};

use crate::collection_functions::evaluate_for_item;
use crate::evaluator::EvaluationContext;
use crate::expression::Expression;

/// Implements the FHIRPath repeat() function
///
/// Applies the projection to every input item, then to every item that
/// projection produced, and so on, until no new items appear. The output
/// holds each projected item once, in discovery order, and does not include
/// the input items themselves unless a projection reaches them again.
///
/// Items are compared with FHIRPath equality, which also stops the traversal
/// on cyclic projections.
///
/// # Syntax
/// `repeat(projection: expression) : collection`
pub fn repeat_function(
    context: &mut EvaluationContext,
    input: &Collection,
    args: &[Expression],
) -> Result<Collection, EvaluationError> {
    let projection = &args[0];
    let mut output = Collection::new();
    let mut pending: VecDeque<_> = input.iter().cloned().collect();

    while let Some(item) = pending.pop_front() {
        for projected in evaluate_for_item(context, projection, &item)? {
            if !output.contains_item(&projected) {
                output.push(projected.clone());
                pending.push_back(projected);
            }
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{ArithmeticOp, ComparisonOp};

    #[test]
    fn test_repeat_until_fixed_point() {
        // repeat(iif($this < 5, $this + 1, {})) starting from 1
        let table = crate::function_table::FunctionTable::builtin();
        let step = Expression::function(
            &table,
            "iif",
            vec![
                Expression::comparison(
                    ComparisonOp::Less,
                    Expression::Identity,
                    Expression::literal(5),
                ),
                Expression::arithmetic(
                    ArithmeticOp::Add,
                    Expression::Identity,
                    Expression::literal(1),
                ),
                Expression::empty(),
            ],
        )
        .unwrap();
        let input = Collection::singleton(1);
        let mut context = EvaluationContext::new(&input);
        let output = repeat_function(&mut context, &input, &[step]).unwrap();
        let expected: Collection = (2..=5).map(atrius_fhirpath_support::Item::from).collect();
        assert_eq!(output, expected);
    }

    #[test]
    fn test_repeat_stops_on_cycle() {
        let input = Collection::singleton(1);
        let mut context = EvaluationContext::new(&input);
        let output = repeat_function(&mut context, &input, &[Expression::Identity]).unwrap();
        assert_eq!(output, Collection::singleton(1));
    }
}
