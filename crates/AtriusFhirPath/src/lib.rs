//! # FHIRPath Expression Engine
//!
//! This crate evaluates FHIRPath expression trees against collections of
//! System values and structured nodes. FHIRPath is a path-based navigation
//! and extraction language designed for FHIR resources.
//!
//! ## Overview
//!
//! The engine lets you:
//! - **Navigate structured data** with path expressions (`Patient.name.family`)
//! - **Filter collections** with boolean predicates (`telecom.where(system = 'email')`)
//! - **Transform data** with built-in functions (`name.given.first()`)
//! - **Calculate** with three-valued, precision-aware arithmetic and comparison
//! - **Work with types** through `is`, `as` and `ofType` over the FHIR type hierarchy
//!
//! ## Architecture
//!
//! - **Expression tree** ([`expression`]): the closed set of node kinds. There
//!   is no text parser; trees are built with the [`Expression`] constructors.
//! - **Evaluator** ([`evaluator`]): [`evaluate`] and the [`EvaluationContext`]
//!   that carries the evaluation time, external constants and navigation mode.
//! - **Function catalog** ([`function_table`]): the standard functions and the
//!   registration API for new ones.
//! - **Type hierarchy** ([`fhir_type_hierarchy`]): `System` and `FHIR`
//!   namespaces and the subtype walk behind `is`.
//! - **Values** (`atrius_fhirpath_support`): System types, collections, the
//!   [`Node`] trait and [`EvaluationError`].
//! - **JSON nodes** ([`json_node`], feature `json`): a [`Node`] over
//!   `serde_json` values.
//!
//! ## Usage Example
//!
//! ```rust
//! use atrius_fhir_path::{evaluate_expression, Collection, Expression, FunctionTable};
//! use atrius_fhir_path::expression::ComparisonOp;
//!
//! let table = FunctionTable::builtin();
//! // (1 | 2 | 3).where($this > 1).count()
//! let input: Collection = (1..=3).map(Into::into).collect();
//! let expression = Expression::sequence(vec![
//!     Expression::function(
//!         &table,
//!         "where",
//!         vec![Expression::comparison(
//!             ComparisonOp::Greater,
//!             Expression::Identity,
//!             Expression::literal(1),
//!         )],
//!     )?,
//!     Expression::function(&table, "count", vec![])?,
//! ]);
//!
//! let result = evaluate_expression(&expression, &input)?;
//! assert_eq!(result, Collection::singleton(2));
//! # Ok::<(), atrius_fhir_path::EvaluationError>(())
//! ```
//!
//! ## Logging
//!
//! The engine emits `tracing` events: `trace` per sequence stage, `debug` for
//! function dispatch and skipped fields, `info` for the `trace()` function.
//! No subscriber is installed by the library.

mod boolean_functions;
mod collection_functions;
mod collection_navigation;
mod conversion_functions;
mod date_functions;
mod distinct_functions;
mod extension_function;
mod math_functions;
mod not_function;
mod repeat_function;
mod set_operations;
mod string_functions;
mod subset_functions;
mod trace_function;
mod type_function;
mod ucum;

pub mod evaluator;
pub mod expression;
pub mod fhir_type_hierarchy;
pub mod function_table;
#[cfg(feature = "json")]
pub mod json_node;

pub use atrius_fhirpath_support::system::Any;
pub use atrius_fhirpath_support::{Collection, EvaluationError, Item, Node};
pub use evaluator::{EvaluationContext, evaluate};
pub use expression::Expression;
pub use fhir_type_hierarchy::TypeSpecifier;
pub use function_table::{Function, FunctionTable};

/// Evaluates an expression against `input` with a fresh context.
///
/// The context binds `%context` to the input and uses the current time. Use
/// [`EvaluationContext`] with [`evaluate`] directly to pin the time, supply
/// constants or navigate permissively.
pub fn evaluate_expression(
    expression: &Expression,
    input: &Collection,
) -> Result<Collection, EvaluationError> {
    let mut context = EvaluationContext::new(input);
    evaluate(&mut context, expression, input)
}
