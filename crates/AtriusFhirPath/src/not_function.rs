//! # FHIRPath not() Function

use atrius_fhirpath_support::{Collection, EvaluationError};

/// Implements the FHIRPath not() function
///
/// Negates the singleton Boolean value of the input. An empty input gives
/// empty, and a non-Boolean singleton counts as true (so its negation is
/// false).
pub fn not_function(input: &Collection) -> Result<Collection, EvaluationError> {
    Ok(input
        .to_singleton_boolean()?
        .map(|value| Collection::singleton(!value))
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use atrius_fhirpath_support::Item;

    #[test]
    fn test_not() {
        assert_eq!(not_function(&Collection::singleton(true)).unwrap(), Collection::singleton(false));
        assert_eq!(not_function(&Collection::singleton(false)).unwrap(), Collection::singleton(true));
        assert!(not_function(&Collection::new()).unwrap().is_empty());
        assert_eq!(not_function(&Collection::singleton("x")).unwrap(), Collection::singleton(false));
    }

    #[test]
    fn test_not_on_multiple_items() {
        let input = Collection::from(vec![Item::from(true), Item::from(false)]);
        assert!(matches!(not_function(&input), Err(EvaluationError::NotSingleton(_))));
    }
}
