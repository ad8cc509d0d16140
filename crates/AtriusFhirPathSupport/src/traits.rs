use std::fmt;

use crate::collection::Item;
use crate::system::Any;

/// A structured value the evaluator can navigate.
///
/// The evaluator never sees the concrete resource model. Everything it needs
/// from a resource, a complex datatype or a primitive element goes through
/// this trait: the declared type (for `is`/`as`/`ofType`), named fields (for
/// path navigation), child enumeration (for `children()`/`descendants()`), and
/// the System value a primitive element carries.
///
/// Implementations are shared across collections as `Arc<dyn Node>`, so they
/// must be cheap to clone by reference and safe to send between threads.
///
/// # Example
///
/// ```rust,ignore
/// impl Node for HumanName {
///     fn type_name(&self) -> Option<String> {
///         Some("HumanName".to_string())
///     }
///
///     fn field(&self, name: &str) -> Option<Vec<Item>> {
///         match name {
///             "family" => Some(self.family.iter().map(Item::from).collect()),
///             "given" => Some(self.given.iter().map(Item::from).collect()),
///             _ => None,
///         }
///     }
///     // ...
/// }
/// ```
pub trait Node: fmt::Debug + Send + Sync {
    /// Declared FHIR type name (`Patient`, `HumanName`, `string`). `None`
    /// when the value has no known type; type checks against it are false.
    fn type_name(&self) -> Option<String>;

    /// True for coded-enum values, which report the FHIR type `code`
    /// regardless of their declared type.
    fn is_code(&self) -> bool {
        false
    }

    /// Items held by a named field, flattened when the field is a list.
    /// `Some(vec![])` for a known but absent field, `None` for an unknown one.
    fn field(&self, name: &str) -> Option<Vec<Item>>;

    /// Fields the model recognizes but that FHIRPath cannot navigate into
    /// (for example the `_field` primitive extension holders of JSON).
    fn is_virtual_field(&self, _name: &str) -> bool {
        false
    }

    /// Inner value of a choice wrapper, `None` when this is not a wrapper.
    fn unwrap_choice(&self) -> Option<Item> {
        None
    }

    /// `Type/Id[/_history/Version]` for values shaped like a reference.
    fn reference_string(&self) -> Option<String> {
        None
    }

    /// Direct children, in declaration order.
    fn children(&self) -> Vec<Item>;

    /// The System value of a primitive element.
    fn to_system(&self) -> Option<Any> {
        None
    }

    /// Structural equality with another node.
    fn equals(&self, other: &dyn Node) -> bool;

    /// Access to the concrete type, for `equals` implementations.
    fn as_any(&self) -> &dyn std::any::Any;
}
