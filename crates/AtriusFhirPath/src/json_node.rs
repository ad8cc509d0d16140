//! # JSON Node
//!
//! A [`Node`] over `serde_json` values, for evaluating FHIRPath directly
//! against FHIR JSON without a generated resource model.
//!
//! - Objects are structured nodes. Their type is the `resourceType` member
//!   when present, or the type named by the choice suffix they were reached
//!   through (`valueQuantity` gives `Quantity`).
//! - JSON primitives are primitive nodes typed `boolean`, `string`, `integer`
//!   or `decimal` from their JSON kind, or by a choice suffix
//!   (`valueDateTime` gives `dateTime`, which converts to a System DateTime).
//! - A field name without a member of that name resolves choice members:
//!   `value` finds `valueQuantity`, `valueString` and so on.
//! - `_name` members (primitive extensions) are virtual fields; their
//!   `id` and `extension` are exposed on the primitive node itself.
//! - Absent members of an object read as empty.
//!
//! ```
//! use atrius_fhir_path::json_node::JsonNode;
//! use atrius_fhir_path::{EvaluationContext, Expression, evaluate};
//! use serde_json::json;
//!
//! let patient = JsonNode::collection(json!({
//!     "resourceType": "Patient",
//!     "name": [{"given": ["Jim", "Peter"]}]
//! }));
//! let path = Expression::sequence(vec![
//!     Expression::type_name("Patient"),
//!     Expression::field("name"),
//!     Expression::field("given"),
//! ]);
//! let mut context = EvaluationContext::new(&patient);
//! let given = evaluate(&mut context, &path, &patient).unwrap();
//! assert_eq!(given.len(), 2);
//! ```

use std::str::FromStr;
use std::sync::Arc;

use atrius_fhirpath_support::system::{Any, Date, DateTime, Quantity, Time};
use atrius_fhirpath_support::{Collection, Item, Node};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::fhir_type_hierarchy::{FhirType, TypeSpecifier};

/// A JSON value seen as a FHIRPath node.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonNode {
    value: Value,
    type_name: Option<String>,
    /// The `_name` sibling of a primitive: its `id` and `extension`.
    element: Option<Value>,
}

impl JsonNode {
    /// Wraps a JSON value; objects take their type from `resourceType`.
    pub fn new(value: Value) -> Self {
        let type_name = match &value {
            Value::Object(map) => map
                .get("resourceType")
                .and_then(Value::as_str)
                .map(str::to_string),
            other => primitive_type(other).map(str::to_string),
        };
        Self {
            value,
            type_name,
            element: None,
        }
    }

    /// Wraps a JSON value with an explicit FHIR type, e.g. `date` for a
    /// string member known to hold a date.
    pub fn typed(value: Value, type_name: impl Into<String>) -> Self {
        Self {
            value,
            type_name: Some(type_name.into()),
            element: None,
        }
    }

    /// Parses JSON text into a node.
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(Self::new)
    }

    /// The evaluation input for a JSON document: one node, or one per
    /// element of a top-level array.
    pub fn collection(value: Value) -> Collection {
        match value {
            Value::Array(values) => values.into_iter().map(|v| JsonNode::new(v).into_item()).collect(),
            value => Collection::from(vec![JsonNode::new(value).into_item()]),
        }
    }

    pub fn into_item(self) -> Item {
        Item::node(self)
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    fn object(&self) -> Option<&Map<String, Value>> {
        self.value.as_object()
    }

    /// Items for one member, flattening arrays and pairing each primitive
    /// with the matching entry of its `_name` sibling.
    fn member_items(&self, map: &Map<String, Value>, key: &str, type_name: Option<String>) -> Vec<Item> {
        let Some(value) = map.get(key) else {
            return Vec::new();
        };
        let element = map.get(&format!("_{}", key));
        let child = |value: &Value, element: Option<&Value>| {
            let mut node = match &type_name {
                Some(type_name) => JsonNode::typed(value.clone(), type_name.clone()),
                None => JsonNode::new(value.clone()),
            };
            node.element = element.filter(|e| !e.is_null()).cloned();
            node.into_item()
        };
        match value {
            Value::Array(values) => {
                let elements = element.and_then(Value::as_array);
                values
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| !v.is_null())
                    .map(|(i, v)| child(v, elements.and_then(|e| e.get(i))))
                    .collect()
            }
            Value::Null => Vec::new(),
            value => vec![child(value, element)],
        }
    }

    /// Members named `name` followed by a type suffix, e.g. `valueString`.
    fn choice_items(&self, map: &Map<String, Value>, name: &str) -> Vec<Item> {
        map.keys()
            .filter_map(|key| {
                let suffix = key.strip_prefix(name)?;
                suffix
                    .chars()
                    .next()
                    .is_some_and(char::is_uppercase)
                    .then(|| (key, choice_type(suffix)))
            })
            .flat_map(|(key, type_name)| self.member_items(map, key, Some(type_name)))
            .collect()
    }

    fn primitive_value(&self) -> Option<Any> {
        let type_name = self.type_name.as_deref().unwrap_or_default();
        match &self.value {
            Value::Bool(b) => Some(Any::Boolean(*b)),
            Value::Number(n) => {
                let text = n.to_string();
                let is_integer = matches!(
                    FhirType::from_name(type_name),
                    Some(FhirType::Integer | FhirType::PositiveInt | FhirType::UnsignedInt)
                ) || (type_name != "decimal" && n.is_i64());
                if is_integer {
                    if let Some(i) = n.as_i64().and_then(|i| i32::try_from(i).ok()) {
                        return Some(Any::Integer(i));
                    }
                }
                Decimal::from_str(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .ok()
                    .map(Any::Decimal)
            }
            Value::String(s) => Some(match type_name {
                "date" => Date::parse(s).map(Any::Date).unwrap_or_else(|_| Any::String(s.clone())),
                "dateTime" | "instant" => DateTime::parse(s)
                    .map(Any::DateTime)
                    .unwrap_or_else(|_| Any::String(s.clone())),
                "time" => Time::parse(s).map(Any::Time).unwrap_or_else(|_| Any::String(s.clone())),
                _ => Any::String(s.clone()),
            }),
            _ => None,
        }
    }

    /// FHIR quantity datatypes convert to System Quantities.
    fn quantity_value(&self) -> Option<Any> {
        let type_name = self.type_name.as_deref()?;
        if !TypeSpecifier::fhir(type_name).is(&TypeSpecifier::fhir("Quantity")) {
            return None;
        }
        let map = self.object()?;
        let value = match map.get("value")? {
            Value::Number(n) => Decimal::from_str(&n.to_string()).ok()?,
            _ => return None,
        };
        let unit = map
            .get("code")
            .or_else(|| map.get("unit"))
            .and_then(Value::as_str)
            .unwrap_or("1");
        Some(Any::Quantity(Quantity::new(value, unit)))
    }
}

fn primitive_type(value: &Value) -> Option<&'static str> {
    match value {
        Value::Bool(_) => Some("boolean"),
        Value::String(_) => Some("string"),
        Value::Number(n) if n.is_i64() => Some("integer"),
        Value::Number(_) => Some("decimal"),
        _ => None,
    }
}

/// The FHIR type a choice suffix names: `Quantity` stays as is, primitive
/// suffixes lose their capital (`DateTime` gives `dateTime`).
fn choice_type(suffix: &str) -> String {
    if FhirType::from_name(suffix).is_some() {
        return suffix.to_string();
    }
    let mut chars = suffix.chars();
    let lowered: String = match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    };
    if FhirType::from_name(&lowered).is_some() {
        lowered
    } else {
        suffix.to_string()
    }
}

impl Node for JsonNode {
    fn type_name(&self) -> Option<String> {
        self.type_name.clone()
    }

    fn field(&self, name: &str) -> Option<Vec<Item>> {
        let Some(map) = self.object() else {
            // Primitives expose the id and extensions of their `_name` sibling.
            let element = self.element.as_ref().and_then(Value::as_object);
            return match name {
                "id" | "extension" => Some(
                    element
                        .map(|element| self.member_items(element, name, None))
                        .unwrap_or_default(),
                ),
                _ => None,
            };
        };
        if map.contains_key(name) {
            return Some(self.member_items(map, name, None));
        }
        Some(self.choice_items(map, name))
    }

    fn is_virtual_field(&self, name: &str) -> bool {
        name.starts_with('_')
    }

    fn children(&self) -> Vec<Item> {
        match self.object() {
            Some(map) => map
                .keys()
                .filter(|key| !key.starts_with('_') && key.as_str() != "resourceType")
                .flat_map(|key| self.member_items(map, key, None))
                .collect(),
            None => Vec::new(),
        }
    }

    fn to_system(&self) -> Option<Any> {
        match &self.value {
            Value::Object(_) => self.quantity_value(),
            _ => self.primitive_value(),
        }
    }

    fn equals(&self, other: &dyn Node) -> bool {
        other
            .as_any()
            .downcast_ref::<JsonNode>()
            .is_some_and(|other| self.value == other.value)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl From<JsonNode> for Item {
    fn from(node: JsonNode) -> Self {
        Item::Node(Arc::new(node))
    }
}
