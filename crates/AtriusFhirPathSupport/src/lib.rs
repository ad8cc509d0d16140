//! # FHIRPath Support Types
//!
//! This crate holds the value layer shared by the FHIRPath evaluator and by
//! anything that feeds data into it:
//!
//! - [`system`] - the eight FHIRPath System types with their equality,
//!   ordering, arithmetic, coercion and literal syntax
//! - [`Collection`] / [`Item`] - the ordered collections every expression
//!   produces and consumes
//! - [`Node`] - the capability a structured value (resource, datatype,
//!   primitive element) exposes to the evaluator
//! - [`EvaluationError`] - the error type for every evaluation failure
//!
//! ## Usage Example
//!
//! ```rust
//! use atrius_fhirpath_support::system::{Any, Equality};
//! use atrius_fhirpath_support::Collection;
//!
//! let partial = Collection::singleton(Any::parse_literal("@2020").unwrap());
//! let full = Collection::singleton(Any::parse_literal("@2020-06-01").unwrap());
//! assert_eq!(partial.try_equal(&full), Equality::Indeterminate);
//! ```

pub mod collection;
pub mod evaluation_error;
pub mod system;
pub mod traits;

pub use collection::{Collection, Item};
pub use evaluation_error::EvaluationError;
pub use traits::Node;
