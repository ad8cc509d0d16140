//! # FHIRPath Distinct Functions
//!
//! Implements `distinct()` and `isDistinct()`. Items are compared with
//! FHIRPath equality, so `1` and `1.0` are duplicates while a partial date
//! and a full date sharing their components are not.

use atrius_fhirpath_support::{Collection, EvaluationError, Item};

/// Removes later duplicates, keeping the first occurrence of each item.
pub(crate) fn deduplicate<'a>(items: impl IntoIterator<Item = &'a Item>) -> Collection {
    let mut output = Collection::new();
    for item in items {
        if !output.contains_item(item) {
            output.push(item.clone());
        }
    }
    output
}

/// Implements the FHIRPath distinct() function
///
/// Returns the input without duplicate items, in first-occurrence order.
///
/// # Examples
///
/// ```text
/// (1 | 2 | 1).distinct() = (1 | 2)
/// (1 | 1.0).distinct() = (1)
/// ```
pub fn distinct_function(input: &Collection) -> Result<Collection, EvaluationError> {
    Ok(deduplicate(input))
}

/// Implements the FHIRPath isDistinct() function
///
/// True if no two items of the input are equal; true for an empty input.
pub fn is_distinct_function(input: &Collection) -> Result<Collection, EvaluationError> {
    Ok(Collection::singleton(deduplicate(input).len() == input.len()))
}
