//! # FHIRPath Trace Function
//!
//! Implements the `trace()` function for debugging FHIRPath expressions by logging intermediate values.

use atrius_fhirpath_support::system::Any;
use atrius_fhirpath_support::{Collection, EvaluationError};
use tracing::info;

use crate::collection_functions::{evaluate_argument, evaluate_for_item};
use crate::evaluator::EvaluationContext;
use crate::expression::Expression;

/// Implements the FHIRPath trace(name [, projection]) function
///
/// Logs the input collection (or, with a projection, the projection of each
/// input item) at `info` level under `name`, and returns the input
/// unchanged. The library installs no subscriber; the output goes wherever
/// the application routes `tracing` events.
///
/// # Errors
///
/// `InvalidReturnType` if `name` does not evaluate to a single String.
pub fn trace_function(
    context: &mut EvaluationContext,
    input: &Collection,
    args: &[Expression],
) -> Result<Collection, EvaluationError> {
    let name = match evaluate_argument(context, input, &args[0])?.single()? {
        Some(item) => match item.to_system() {
            Some(Any::String(name)) => name,
            _ => {
                return Err(EvaluationError::InvalidReturnType(format!(
                    "trace() name must be a String, got {:?}",
                    item
                )));
            }
        },
        None => {
            return Err(EvaluationError::InvalidReturnType(
                "trace() name evaluated to empty".to_string(),
            ));
        }
    };

    let traced = match args.get(1) {
        Some(projection) => {
            let mut projected = Collection::new();
            for item in input {
                projected.extend(evaluate_for_item(context, projection, item)?);
            }
            projected
        }
        None => input.clone(),
    };
    info!(name = %name, items = traced.len(), values = ?traced, "trace");

    Ok(input.clone())
}
