//! # FHIRPath Current Date and Time Functions
//!
//! `now()`, `today()` and `timeOfDay()`. All three read the instant fixed in
//! the [`EvaluationContext`] when it was created, so repeated calls within
//! one evaluation agree with each other.

use atrius_fhirpath_support::{Collection, EvaluationError};

use crate::evaluator::EvaluationContext;
use crate::expression::Expression;

/// Implements the FHIRPath now() function
///
/// Returns the evaluation instant as a DateTime with millisecond precision
/// and the local offset.
pub fn now_function(
    context: &mut EvaluationContext,
    _input: &Collection,
    _args: &[Expression],
) -> Result<Collection, EvaluationError> {
    Ok(Collection::singleton(context.now_date_time()))
}

/// Implements the FHIRPath today() function
pub fn today_function(
    context: &mut EvaluationContext,
    _input: &Collection,
    _args: &[Expression],
) -> Result<Collection, EvaluationError> {
    Ok(Collection::singleton(context.today()))
}

/// Implements the FHIRPath timeOfDay() function
pub fn time_of_day_function(
    context: &mut EvaluationContext,
    _input: &Collection,
    _args: &[Expression],
) -> Result<Collection, EvaluationError> {
    Ok(Collection::singleton(context.time_of_day()))
}
