//! # FHIRPath Boolean Functions
//!
//! Implements boolean logic functions including `allTrue()`, `anyTrue()`, `allFalse()`, and `anyFalse()`.
//! These functions work with collections of Boolean values; any other item is
//! an error.

use atrius_fhirpath_support::system::Any;
use atrius_fhirpath_support::{Collection, EvaluationError};

fn booleans(input: &Collection, function: &str) -> Result<Vec<bool>, EvaluationError> {
    input
        .iter()
        .map(|item| match item.to_system() {
            Some(Any::Boolean(b)) => Ok(b),
            _ => Err(EvaluationError::InvalidType(format!(
                "{}() expects a collection of Booleans, found {:?}",
                function, item
            ))),
        })
        .collect()
}

/// Implements the FHIRPath allTrue() function
///
/// True if every item is true; true for an empty collection.
pub fn all_true_function(input: &Collection) -> Result<Collection, EvaluationError> {
    Ok(Collection::singleton(booleans(input, "allTrue")?.into_iter().all(|b| b)))
}

/// Implements the FHIRPath anyTrue() function
///
/// True if at least one item is true; false for an empty collection.
pub fn any_true_function(input: &Collection) -> Result<Collection, EvaluationError> {
    Ok(Collection::singleton(booleans(input, "anyTrue")?.into_iter().any(|b| b)))
}

/// Implements the FHIRPath allFalse() function
pub fn all_false_function(input: &Collection) -> Result<Collection, EvaluationError> {
    Ok(Collection::singleton(booleans(input, "allFalse")?.into_iter().all(|b| !b)))
}

/// Implements the FHIRPath anyFalse() function
pub fn any_false_function(input: &Collection) -> Result<Collection, EvaluationError> {
    Ok(Collection::singleton(booleans(input, "anyFalse")?.into_iter().any(|b| !b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use atrius_fhirpath_support::Item;

    fn bools(values: &[bool]) -> Collection {
        values.iter().copied().map(Item::from).collect()
    }

    #[test]
    fn test_empty_collection() {
        let empty = Collection::new();
        assert_eq!(all_true_function(&empty).unwrap(), Collection::singleton(true));
        assert_eq!(any_true_function(&empty).unwrap(), Collection::singleton(false));
        assert_eq!(all_false_function(&empty).unwrap(), Collection::singleton(true));
        assert_eq!(any_false_function(&empty).unwrap(), Collection::singleton(false));
    }

    #[test]
    fn test_mixed_collection() {
        let mixed = bools(&[true, false, true]);
        assert_eq!(all_true_function(&mixed).unwrap(), Collection::singleton(false));
        assert_eq!(any_true_function(&mixed).unwrap(), Collection::singleton(true));
        assert_eq!(all_false_function(&mixed).unwrap(), Collection::singleton(false));
        assert_eq!(any_false_function(&mixed).unwrap(), Collection::singleton(true));
    }

    #[test]
    fn test_non_boolean_item() {
        let input = Collection::from(vec![Item::from(true), Item::from(1)]);
        assert!(matches!(
            all_true_function(&input),
            Err(EvaluationError::InvalidType(_))
        ));
    }
}
