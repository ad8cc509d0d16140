//! # FHIRPath String Functions
//!
//! Implements the string manipulation functions: `startsWith()`, `endsWith()`, `contains()`,
//! `length()`, `upper()`, `lower()`, `trim()`, `toChars()`, `substring()`, `indexOf()`,
//! `matches()`, `replace()`, `replaceMatches()` and `join()`.
//!
//! Except for `join()`, these operate on a singleton String input: an empty
//! input gives empty, more than one item fails with `NotSingleton` and any
//! other type fails with `InvalidType`. Positions and lengths count
//! characters, not bytes.

use atrius_fhirpath_support::system::Any;
use atrius_fhirpath_support::{Collection, EvaluationError, Item};
use regex::Regex;

fn string_input(input: &Collection, function: &str) -> Result<Option<String>, EvaluationError> {
    let Some(item) = input.single()? else {
        return Ok(None);
    };
    match item.to_system() {
        Some(Any::String(s)) => Ok(Some(s)),
        _ => Err(EvaluationError::InvalidType(format!(
            "{}() requires a String input, got {:?}",
            function, item
        ))),
    }
}

/// Runs `f` on the String input, or returns empty for an empty input.
fn with_string<F>(input: &Collection, function: &str, f: F) -> Result<Collection, EvaluationError>
where
    F: FnOnce(&str) -> Result<Collection, EvaluationError>,
{
    match string_input(input, function)? {
        Some(s) => f(&s),
        None => Ok(Collection::new()),
    }
}

fn compile(pattern: &str) -> Result<Regex, EvaluationError> {
    Regex::new(pattern).map_err(|e| EvaluationError::InvalidRegex(format!("'{}': {}", pattern, e)))
}

/// Implements the FHIRPath startsWith(prefix) function
pub fn starts_with_function(input: &Collection, prefix: String) -> Result<Collection, EvaluationError> {
    with_string(input, "startsWith", |s| Ok(Collection::singleton(s.starts_with(&prefix))))
}

/// Implements the FHIRPath endsWith(suffix) function
pub fn ends_with_function(input: &Collection, suffix: String) -> Result<Collection, EvaluationError> {
    with_string(input, "endsWith", |s| Ok(Collection::singleton(s.ends_with(&suffix))))
}

/// Implements the FHIRPath contains(substring) function
///
/// The string form of `contains`; membership in a collection is the `in`
/// / `contains` operator, not this function.
pub fn contains_function(input: &Collection, substring: String) -> Result<Collection, EvaluationError> {
    with_string(input, "contains", |s| Ok(Collection::singleton(s.contains(&substring))))
}

/// Implements the FHIRPath length() function
pub fn length_function(input: &Collection) -> Result<Collection, EvaluationError> {
    with_string(input, "length", |s| {
        let length = i32::try_from(s.chars().count())
            .map_err(|_| EvaluationError::IntOverflow("string length".to_string()))?;
        Ok(Collection::singleton(length))
    })
}

pub fn upper_function(input: &Collection) -> Result<Collection, EvaluationError> {
    with_string(input, "upper", |s| Ok(Collection::singleton(s.to_uppercase())))
}

pub fn lower_function(input: &Collection) -> Result<Collection, EvaluationError> {
    with_string(input, "lower", |s| Ok(Collection::singleton(s.to_lowercase())))
}

/// Implements the FHIRPath trim() function
pub fn trim_function(input: &Collection) -> Result<Collection, EvaluationError> {
    with_string(input, "trim", |s| Ok(Collection::singleton(s.trim())))
}

/// Implements the FHIRPath toChars() function
///
/// Returns one single-character String per character of the input.
pub fn to_chars_function(input: &Collection) -> Result<Collection, EvaluationError> {
    with_string(input, "toChars", |s| {
        Ok(s.chars().map(|c| Item::from(c.to_string())).collect())
    })
}

/// Implements the FHIRPath substring(start [, length]) function
///
/// Returns the characters from `start` (zero based), up to `length` of them
/// or to the end of the string. A `start` outside the string gives empty; a
/// `length` of zero or less gives the empty string.
///
/// # Examples
///
/// ```text
/// 'abcdefg'.substring(3) = 'defg'
/// 'abcdefg'.substring(1, 2) = 'bc'
/// 'abcdefg'.substring(7) = {}
/// ```
pub fn substring_function(
    input: &Collection,
    start: i32,
    length: Option<i32>,
) -> Result<Collection, EvaluationError> {
    with_string(input, "substring", |s| {
        let char_count = s.chars().count();
        let Some(start) = usize::try_from(start).ok().filter(|start| *start < char_count) else {
            return Ok(Collection::new());
        };
        let take = match length {
            Some(length) => usize::try_from(length).unwrap_or(0),
            None => char_count,
        };
        Ok(Collection::singleton(
            s.chars().skip(start).take(take).collect::<String>(),
        ))
    })
}

/// Implements the FHIRPath indexOf(substring) function
///
/// Returns the character position of the first occurrence, 0 for an empty
/// substring and -1 when not found.
pub fn index_of_function(input: &Collection, substring: String) -> Result<Collection, EvaluationError> {
    with_string(input, "indexOf", |s| {
        let index = match s.find(&substring) {
            Some(byte_index) => i32::try_from(s[..byte_index].chars().count())
                .map_err(|_| EvaluationError::IntOverflow("string index".to_string()))?,
            None => -1,
        };
        Ok(Collection::singleton(index))
    })
}

/// Implements the FHIRPath matches(regex) function
///
/// True when the pattern matches anywhere in the input; anchor the pattern
/// with `^...$` to match the whole string.
pub fn matches_function(input: &Collection, pattern: String) -> Result<Collection, EvaluationError> {
    with_string(input, "matches", |s| {
        let regex = compile(&pattern)?;
        Ok(Collection::singleton(regex.is_match(s)))
    })
}

/// Implements the FHIRPath replace(pattern, substitution) function
///
/// Replaces every literal occurrence of `pattern`. An empty pattern inserts
/// the substitution around every character.
pub fn replace_function(
    input: &Collection,
    pattern: String,
    substitution: String,
) -> Result<Collection, EvaluationError> {
    with_string(input, "replace", |s| {
        Ok(Collection::singleton(s.replace(&pattern, &substitution)))
    })
}

/// Implements the FHIRPath replaceMatches(regex, substitution) function
///
/// The substitution may refer to capture groups as `$1` or `${name}`.
pub fn replace_matches_function(
    input: &Collection,
    pattern: String,
    substitution: String,
) -> Result<Collection, EvaluationError> {
    with_string(input, "replaceMatches", |s| {
        let regex = compile(&pattern)?;
        Ok(Collection::singleton(
            regex.replace_all(s, substitution.as_str()).into_owned(),
        ))
    })
}

/// Implements the FHIRPath join([separator]) function
///
/// Concatenates the String items of the input with `separator` (default
/// none) between them. Empty input gives empty.
pub fn join_function(input: &Collection, separator: Option<String>) -> Result<Collection, EvaluationError> {
    if input.is_empty() {
        return Ok(Collection::new());
    }
    let parts = input
        .iter()
        .map(|item| match item.to_system() {
            Some(Any::String(s)) => Ok(s),
            _ => Err(EvaluationError::InvalidType(format!(
                "join() requires String items, got {:?}",
                item
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Collection::singleton(parts.join(separator.as_deref().unwrap_or(""))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(value: &str) -> Collection {
        Collection::singleton(value)
    }

    #[test]
    fn test_empty_and_invalid_input() {
        assert!(upper_function(&Collection::new()).unwrap().is_empty());
        assert!(matches!(
            upper_function(&Collection::singleton(1)),
            Err(EvaluationError::InvalidType(_))
        ));
        let two = Collection::from(vec![Item::from("a"), Item::from("b")]);
        assert!(matches!(length_function(&two), Err(EvaluationError::NotSingleton(_))));
    }

    #[test]
    fn test_substring() {
        let input = s("abcdefg");
        assert_eq!(substring_function(&input, 3, None).unwrap(), s("defg"));
        assert_eq!(substring_function(&input, 1, Some(2)).unwrap(), s("bc"));
        assert_eq!(substring_function(&input, 5, Some(10)).unwrap(), s("fg"));
        assert!(substring_function(&input, 7, None).unwrap().is_empty());
        assert!(substring_function(&input, -1, Some(2)).unwrap().is_empty());
        assert_eq!(substring_function(&input, 2, Some(-1)).unwrap(), s(""));
    }

    #[test]
    fn test_index_of_counts_characters() {
        assert_eq!(index_of_function(&s("héllo"), "l".into()).unwrap(), Collection::singleton(2));
        assert_eq!(index_of_function(&s("abc"), "".into()).unwrap(), Collection::singleton(0));
        assert_eq!(index_of_function(&s("abc"), "z".into()).unwrap(), Collection::singleton(-1));
    }

    #[test]
    fn test_matches_is_unanchored() {
        assert_eq!(
            matches_function(&s("hello world"), "o w".into()).unwrap(),
            Collection::singleton(true)
        );
        assert_eq!(
            matches_function(&s("hello world"), "^world".into()).unwrap(),
            Collection::singleton(false)
        );
        assert!(matches!(
            matches_function(&s("x"), "(".into()),
            Err(EvaluationError::InvalidRegex(_))
        ));
    }

    #[test]
    fn test_replace() {
        assert_eq!(replace_function(&s("abc"), "".into(), "x".into()).unwrap(), s("xaxbxcx"));
        assert_eq!(
            replace_matches_function(&s("2020-01-31"), r"(\d+)-(\d+)-(\d+)".into(), "$3/$2/$1".into())
                .unwrap(),
            s("31/01/2020")
        );
    }

    #[test]
    fn test_join_and_chars() {
        let chars = to_chars_function(&s("ab")).unwrap();
        assert_eq!(chars, Collection::from(vec![Item::from("a"), Item::from("b")]));
        assert_eq!(join_function(&chars, Some(",".into())).unwrap(), s("a,b"));
        assert_eq!(join_function(&chars, None).unwrap(), s("ab"));
        assert!(join_function(&Collection::new(), None).unwrap().is_empty());
    }

    #[test]
    fn test_trim_and_case() {
        assert_eq!(trim_function(&s("  a b ")).unwrap(), s("a b"));
        assert_eq!(upper_function(&s("abc")).unwrap(), s("ABC"));
        assert_eq!(lower_function(&s("ABC")).unwrap(), s("abc"));
        assert_eq!(starts_with_function(&s("abc"), "".into()).unwrap(), Collection::singleton(true));
        assert_eq!(ends_with_function(&s("abc"), "bc".into()).unwrap(), Collection::singleton(true));
        assert_eq!(contains_function(&s("abc"), "d".into()).unwrap(), Collection::singleton(false));
    }
}
