#![allow(dead_code)]

use std::sync::Arc;

use atrius_fhir_path::json_node::JsonNode;
use atrius_fhir_path::{Any, Collection, EvaluationContext, EvaluationError, Expression, FunctionTable};
use atrius_fhir_path::{Item, Node, evaluate};
use chrono::{FixedOffset, TimeZone};
use once_cell::sync::Lazy;
use serde_json::json;

static BUILTIN: Lazy<FunctionTable> = Lazy::new(FunctionTable::builtin);

/// 2024-02-29T13:45:30+02:00, the clock every test context runs on.
pub fn pinned_now() -> chrono::DateTime<FixedOffset> {
    FixedOffset::east_opt(2 * 3600)
        .and_then(|offset| offset.with_ymd_and_hms(2024, 2, 29, 13, 45, 30).single())
        .expect("valid fixed instant")
}

pub fn context_for(input: &Collection) -> EvaluationContext {
    EvaluationContext::new(input).with_now(pinned_now())
}

pub fn eval(expression: &Expression, input: &Collection) -> Result<Collection, EvaluationError> {
    let mut context = context_for(input);
    evaluate(&mut context, expression, input)
}

pub fn eval_ok(expression: &Expression, input: &Collection) -> Collection {
    eval(expression, input).unwrap_or_else(|e| panic!("evaluation of {:?} failed: {}", expression, e))
}

/// Evaluates against an empty input.
pub fn eval_empty(expression: &Expression) -> Result<Collection, EvaluationError> {
    eval(expression, &Collection::new())
}

/// A call of a builtin function.
pub fn call(name: &str, args: Vec<Expression>) -> Expression {
    Expression::function(&BUILTIN, name, args)
        .unwrap_or_else(|e| panic!("cannot build call to {}: {}", name, e))
}

/// `input.name(args)`
pub fn invoke(input: Expression, name: &str, args: Vec<Expression>) -> Expression {
    Expression::sequence(vec![input, call(name, args)])
}

/// A FHIRPath literal token such as `@2021-01-31`, `5 'kg'` or `'text'`.
pub fn lit(literal: &str) -> Expression {
    Expression::Literal(Some(value(literal)))
}

pub fn value(literal: &str) -> Any {
    Any::parse_literal(literal).unwrap_or_else(|e| panic!("bad literal {}: {}", literal, e))
}

/// A collection literal, `(1 | 2 | 3)` without the union's deduplication.
pub fn list(literals: &[&str]) -> Collection {
    literals.iter().map(|literal| Item::from(value(literal))).collect()
}

/// `a.b.c` as a sequence of field navigations.
pub fn path(fields: &[&str]) -> Expression {
    Expression::sequence(fields.iter().map(|f| Expression::field(*f)).collect())
}

/// `Patient.a.b` starting from a type name.
pub fn typed_path(type_name: &str, fields: &[&str]) -> Expression {
    let mut stages = vec![Expression::type_name(type_name)];
    stages.extend(fields.iter().map(|f| Expression::field(*f)));
    Expression::sequence(stages)
}

/// Replaces primitive nodes by their System values, so JSON navigation
/// results compare against plain literals.
pub fn systems(collection: Collection) -> Collection {
    collection
        .into_iter()
        .map(|item| item.to_system().map(Item::from).unwrap_or(item))
        .collect()
}

/// [`eval_ok`] followed by [`systems`].
pub fn eval_values(expression: &Expression, input: &Collection) -> Collection {
    systems(eval_ok(expression, input))
}

pub fn singleton(literal: &str) -> Collection {
    Collection::singleton(value(literal))
}

pub fn boolean(b: bool) -> Collection {
    Collection::singleton(b)
}

pub fn strings(values: &[&str]) -> Collection {
    values.iter().map(|s| Item::from(*s)).collect()
}

pub fn patient() -> Collection {
    JsonNode::collection(json!({
        "resourceType": "Patient",
        "id": "example",
        "active": true,
        "name": [
            {"use": "official", "family": "Chalmers", "given": ["Peter", "James"]},
            {"use": "usual", "given": ["Jim"]},
            {"use": "maiden", "family": "Windsor", "given": ["Peter", "James"]}
        ],
        "telecom": [
            {"system": "phone", "value": "(03) 5555 6473", "use": "work", "rank": 1},
            {"system": "email", "value": "p.chalmers@example.org"}
        ],
        "gender": "male",
        "birthDate": "1974-12-25",
        "_birthDate": {
            "extension": [{
                "url": "http://hl7.org/fhir/StructureDefinition/patient-birthTime",
                "valueDateTime": "1974-12-25T14:35:45-05:00"
            }]
        },
        "deceasedBoolean": false,
        "managingOrganization": {"reference": "Organization/1"}
    }))
}

pub fn observation() -> Collection {
    JsonNode::collection(json!({
        "resourceType": "Observation",
        "id": "weight",
        "status": "final",
        "code": {"coding": [{"system": "http://loinc.org", "code": "29463-7"}]},
        "effectiveDateTime": "2016-12-01T10:00:00Z",
        "valueQuantity": {
            "value": 185,
            "unit": "lbs",
            "system": "http://unitsofmeasure.org",
            "code": "[lb_av]"
        }
    }))
}

/// A hand-built node for the parts of the [`Node`] contract JSON cannot
/// express: choice wrappers, references, coded enums and virtual fields.
#[derive(Debug, Clone, Default)]
pub struct TestNode {
    type_name: Option<String>,
    fields: Vec<(String, Vec<Item>)>,
    virtual_fields: Vec<String>,
    value: Option<Any>,
    choice: Option<Item>,
    reference: Option<String>,
    code: bool,
}

impl TestNode {
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: Some(type_name.to_string()),
            ..Default::default()
        }
    }

    pub fn primitive(type_name: &str, value: Any) -> Self {
        Self {
            value: Some(value),
            ..Self::new(type_name)
        }
    }

    /// A coded enum value, typed `code` whatever its declared type.
    pub fn code(type_name: &str, code: &str) -> Self {
        Self {
            code: true,
            ..Self::primitive(type_name, Any::String(code.to_string()))
        }
    }

    /// A one-of wrapper around `inner`.
    pub fn choice(inner: Item) -> Self {
        Self {
            choice: Some(inner),
            ..Default::default()
        }
    }

    pub fn reference(reference: &str) -> Self {
        Self {
            reference: Some(reference.to_string()),
            ..Self::new("Reference")
        }
    }

    pub fn with(mut self, name: &str, items: Vec<Item>) -> Self {
        self.fields.push((name.to_string(), items));
        self
    }

    pub fn with_virtual(mut self, name: &str) -> Self {
        self.virtual_fields.push(name.to_string());
        self
    }

    pub fn item(self) -> Item {
        Item::Node(Arc::new(self))
    }

    pub fn collection(self) -> Collection {
        Collection::from(vec![self.item()])
    }
}

impl Node for TestNode {
    fn type_name(&self) -> Option<String> {
        self.type_name.clone()
    }

    fn is_code(&self) -> bool {
        self.code
    }

    fn field(&self, name: &str) -> Option<Vec<Item>> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, items)| items.clone())
    }

    fn is_virtual_field(&self, name: &str) -> bool {
        self.virtual_fields.iter().any(|field| field == name)
    }

    fn unwrap_choice(&self) -> Option<Item> {
        self.choice.clone()
    }

    fn reference_string(&self) -> Option<String> {
        self.reference.clone()
    }

    fn children(&self) -> Vec<Item> {
        self.fields
            .iter()
            .flat_map(|(_, items)| items.iter().cloned())
            .collect()
    }

    fn to_system(&self) -> Option<Any> {
        self.value.clone()
    }

    fn equals(&self, other: &dyn Node) -> bool {
        other.as_any().downcast_ref::<TestNode>().is_some_and(|other| {
            self.type_name == other.type_name
                && self.value == other.value
                && self.fields == other.fields
                && self.reference == other.reference
        })
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
