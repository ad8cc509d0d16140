//! # FHIRPath Collection Navigation
//!
//! Implements the positional subsetting functions `tail()`, `skip()` and
//! `take()`, and the tree navigation functions `children()` and
//! `descendants()`.

use std::collections::VecDeque;

use atrius_fhirpath_support::{Collection, EvaluationError, Item};

use crate::evaluator::normalize_field_item;

/// Implements the FHIRPath `tail` function
///
/// Returns all but the first item of the input.
pub fn tail_function(input: &Collection) -> Result<Collection, EvaluationError> {
    Ok(input.iter().skip(1).cloned().collect())
}

/// Implements the FHIRPath `skip` function
///
/// Syntax: collection.skip(num : Integer) : collection
///
/// Returns all but the first `num` items. If `num` is less than or equal to
/// 0 the input is returned unchanged.
///
/// # Examples
///
/// ```text
/// (1 | 2 | 3).skip(1) = (2 | 3)
/// (1 | 2 | 3).skip(4) = {}
/// (1 | 2 | 3).skip(0) = (1 | 2 | 3)
/// ```
pub fn skip_function(input: &Collection, num: i32) -> Result<Collection, EvaluationError> {
    let num = usize::try_from(num).unwrap_or(0);
    Ok(input.iter().skip(num).cloned().collect())
}

/// Implements the FHIRPath `take` function
///
/// Syntax: collection.take(num : Integer) : collection
///
/// Returns the first `num` items, or empty when `num` is less than or equal
/// to 0.
pub fn take_function(input: &Collection, num: i32) -> Result<Collection, EvaluationError> {
    let num = usize::try_from(num).unwrap_or(0);
    Ok(input.iter().take(num).cloned().collect())
}

fn children_of(item: &Item) -> impl Iterator<Item = Item> {
    item.as_node()
        .map(|node| node.children())
        .unwrap_or_default()
        .into_iter()
        .map(normalize_field_item)
}

/// Implements the FHIRPath `children` function
///
/// Returns the direct children of every input node, in input order. System
/// values have no children.
pub fn children_function(input: &Collection) -> Result<Collection, EvaluationError> {
    Ok(input.iter().flat_map(children_of).collect())
}

/// Implements the FHIRPath `descendants` function
///
/// Returns every node reachable through `children()`, breadth first,
/// excluding the input items themselves.
pub fn descendants_function(input: &Collection) -> Result<Collection, EvaluationError> {
    let mut output = Collection::new();
    let mut pending: VecDeque<Item> = input.iter().flat_map(children_of).collect();
    while let Some(item) = pending.pop_front() {
        pending.extend(children_of(&item));
        output.push(item);
    }
    Ok(output)
}
