//! # FHIRPath Expression Evaluator
//!
//! This module provides the core evaluation engine for FHIRPath expressions.
//! It walks an [`Expression`] tree against an input [`Collection`] and
//! produces an output collection or an [`EvaluationError`].
//!
//! ## Overview
//!
//! The evaluator handles:
//!
//! - **Path navigation**: fields of structured [`Node`](atrius_fhirpath_support::Node)s, with
//!   choice wrappers unwrapped and references rendered as strings
//! - **Function invocation**: dispatch through the [`Function`](crate::function_table::Function)
//!   carried by each call node
//! - **Operators**: equality, comparison, arithmetic, concatenation and the
//!   three-valued boolean operators
//! - **Type operations**: `is` and `as` against the FHIR type hierarchy
//! - **External constants**: `%context`, `%ucum` and caller supplied values
//!
//! ## Empty results
//!
//! Most operators propagate an empty operand as an empty result. A few
//! failures are also reported as empty rather than as errors: arithmetic
//! overflow and division by zero, indeterminate equality, and comparisons
//! between temporal values of different precision or quantities in
//! different units. Every other failure aborts the evaluation.
//!
//! ## Contexts
//!
//! Each binary operator and each function call evaluates its branches on a
//! clone of the [`EvaluationContext`], so nothing a branch records leaks into
//! its siblings.

use std::collections::HashMap;

use atrius_fhirpath_support::system::{Any, Date, DateTime, Time};
use atrius_fhirpath_support::{Collection, EvaluationError, Item};
use chrono::FixedOffset;
use tracing::{debug, trace};

use crate::expression::{ArithmeticOp, BooleanOp, ComparisonOp, Expression};
use crate::fhir_type_hierarchy::{TypeSpecifier, type_of};

/// Evaluation context for FHIRPath expressions
///
/// The `EvaluationContext` holds the state shared by one evaluation:
/// - the instant returned by `now()`, `today()` and `timeOfDay()`, fixed when
///   the context is created so that every call agrees
/// - the external constants reachable as `%name`
/// - the outputs of the two most recent sequence stages, kept for callers
///   that patch the last navigated location
/// - the navigation mode (`permissive` skips unknown fields instead of
///   failing)
///
/// # Examples
///
/// ```
/// use atrius_fhir_path::EvaluationContext;
/// use atrius_fhirpath_support::Collection;
///
/// let input = Collection::singleton("Hello");
/// let context = EvaluationContext::new(&input)
///     .with_permissive(true)
///     .with_constant("greeting", Collection::singleton("hi"));
///
/// assert!(context.constant("context").is_some());
/// assert!(context.constant("ucum").is_some());
/// ```
#[derive(Debug)]
pub struct EvaluationContext {
    /// Evaluation timestamp.
    pub now: chrono::DateTime<FixedOffset>,

    /// External constants by name, without the leading `%`.
    pub constants: HashMap<String, Collection>,

    /// Output of the last completed sequence stage.
    pub last_result: Option<Collection>,

    /// Output of the stage before `last_result`.
    pub before_last_result: Option<Collection>,

    /// When set, unknown fields are skipped instead of raising `InvalidField`.
    pub permissive: bool,
}

impl Clone for EvaluationContext {
    fn clone(&self) -> Self {
        EvaluationContext {
            now: self.now,
            constants: self.constants.clone(),
            last_result: self.last_result.clone(),
            // Only the most recent trailing result survives into a branch.
            before_last_result: None,
            permissive: self.permissive,
        }
    }
}

impl EvaluationContext {
    /// Creates a context for evaluating against `input`.
    ///
    /// `%context` is bound to the input, and `%ucum`, `%sct` and `%loinc` to
    /// their code system URLs. The evaluation time is the current local time.
    pub fn new(input: &Collection) -> Self {
        let mut constants = HashMap::new();
        constants.insert("context".to_string(), input.clone());
        constants.insert(
            "ucum".to_string(),
            Collection::singleton("http://unitsofmeasure.org"),
        );
        constants.insert(
            "sct".to_string(),
            Collection::singleton("http://snomed.info/sct"),
        );
        constants.insert("loinc".to_string(), Collection::singleton("http://loinc.org"));

        Self {
            now: chrono::Local::now().fixed_offset(),
            constants,
            last_result: None,
            before_last_result: None,
            permissive: false,
        }
    }

    /// Pins the evaluation time.
    pub fn with_now(mut self, now: chrono::DateTime<FixedOffset>) -> Self {
        self.now = now;
        self
    }

    pub fn with_permissive(mut self, permissive: bool) -> Self {
        self.permissive = permissive;
        self
    }

    /// Adds or replaces an external constant.
    pub fn with_constant(mut self, name: impl Into<String>, value: Collection) -> Self {
        self.set_constant(name, value);
        self
    }

    pub fn set_constant(&mut self, name: impl Into<String>, value: Collection) {
        self.constants.insert(name.into(), value);
    }

    pub fn constant(&self, name: &str) -> Option<&Collection> {
        self.constants.get(name)
    }

    /// `now()` as a System DateTime.
    pub fn now_date_time(&self) -> DateTime {
        DateTime::from_chrono(self.now)
    }

    /// `today()` as a System Date.
    pub fn today(&self) -> Date {
        Date::from_naive(self.now.date_naive())
    }

    /// `timeOfDay()` as a System Time.
    pub fn time_of_day(&self) -> Time {
        Time::from_naive(self.now.time())
    }

    fn record_result(&mut self, output: &Collection) {
        self.before_last_result = self.last_result.take();
        self.last_result = Some(output.clone());
    }
}

impl Expression {
    /// Evaluates this node; see [`evaluate`].
    pub fn evaluate(
        &self,
        context: &mut EvaluationContext,
        input: &Collection,
    ) -> Result<Collection, EvaluationError> {
        evaluate(context, self, input)
    }
}

/// Evaluates an expression tree against an input collection.
///
/// # Arguments
///
/// * `context` - The evaluation context; sequence stages record their
///   outputs into it
/// * `expression` - The expression tree to evaluate
/// * `input` - The focus collection (`$this`)
///
/// # Returns
///
/// The output collection, or the first error that is not one of the
/// failures FHIRPath reports as empty.
pub fn evaluate(
    context: &mut EvaluationContext,
    expression: &Expression,
    input: &Collection,
) -> Result<Collection, EvaluationError> {
    match expression {
        Expression::Sequence(stages) => evaluate_sequence(context, stages, input),
        Expression::Identity => Ok(input.clone()),
        Expression::Field(name) => evaluate_field(context, name, input),
        Expression::Type(name) => Ok(input
            .iter()
            .filter(|item| {
                item.as_node()
                    .and_then(|node| node.type_name())
                    .is_some_and(|type_name| type_name == *name)
            })
            .cloned()
            .collect()),
        Expression::Literal(value) => Ok(value.clone().map(Collection::from).unwrap_or_default()),
        Expression::Index(index) => evaluate_index(context, index, input),
        Expression::Equality { left, right, not } => {
            evaluate_equality(context, left, right, *not, input)
        }
        Expression::Function {
            name,
            function,
            args,
        } => {
            debug!(function = %name, args = args.len(), "invoking function");
            let mut branch = context.clone();
            function.call(&mut branch, input, args)
        }
        Expression::Is {
            expr,
            type_specifier,
        } => {
            let operand = evaluate(context, expr, input)?;
            Ok(match operand.single()? {
                Some(item) => Collection::singleton(is_of_type(item, type_specifier)),
                None => Collection::new(),
            })
        }
        Expression::As {
            expr,
            type_specifier,
        } => {
            let operand = evaluate(context, expr, input)?;
            Ok(match operand.single()? {
                Some(item) if is_of_type(item, type_specifier) => {
                    Collection::from(vec![unwrap_choice(item.clone())])
                }
                _ => Collection::new(),
            })
        }
        Expression::Boolean { op, left, right } => {
            evaluate_boolean(context, *op, left, right, input)
        }
        Expression::Comparison { op, left, right } => {
            evaluate_comparison(context, *op, left, right, input)
        }
        Expression::Arithmetic { op, left, right } => {
            evaluate_arithmetic(context, *op, left, right, input)
        }
        Expression::Concat { left, right } => evaluate_concat(context, left, right, input),
        Expression::ExternalConstant(name) => context
            .constant(name)
            .cloned()
            .ok_or_else(|| EvaluationError::ConstantNotFound(name.clone())),
        Expression::Negation(operand) => evaluate_negation(context, operand, input),
    }
}

fn evaluate_sequence(
    context: &mut EvaluationContext,
    stages: &[Expression],
    input: &Collection,
) -> Result<Collection, EvaluationError> {
    let mut current = input.clone();
    for (position, stage) in stages.iter().enumerate() {
        current = evaluate(context, stage, &current)?;
        trace!(stage = position, items = current.len(), "sequence stage complete");
        context.record_result(&current);
    }
    Ok(current)
}

/// Choice wrappers are replaced by their value, reference-shaped nodes by
/// their `Type/Id` string.
pub(crate) fn normalize_field_item(item: Item) -> Item {
    match &item {
        Item::Node(node) => {
            if let Some(inner) = node.unwrap_choice() {
                return normalize_field_item(inner);
            }
            match node.reference_string() {
                Some(reference) => Item::from(reference),
                None => item,
            }
        }
        Item::System(_) => item,
    }
}

pub(crate) fn unwrap_choice(item: Item) -> Item {
    match item.as_node().and_then(|node| node.unwrap_choice()) {
        Some(inner) => unwrap_choice(inner),
        None => item,
    }
}

fn evaluate_field(
    context: &EvaluationContext,
    name: &str,
    input: &Collection,
) -> Result<Collection, EvaluationError> {
    let mut output = Collection::new();
    for item in input {
        let node = match item {
            Item::Node(node) => node,
            Item::System(value) => {
                if context.permissive {
                    debug!(field = name, value_type = value.type_name(), "skipping field of System value");
                    continue;
                }
                return Err(EvaluationError::InvalidField(format!(
                    "{} has no field '{}'",
                    value.type_name(),
                    name
                )));
            }
        };
        if node.is_virtual_field(name) {
            continue;
        }
        match node.field(name) {
            Some(children) => {
                for child in children {
                    output.push(normalize_field_item(child));
                }
            }
            None if context.permissive => {
                debug!(field = name, node_type = ?node.type_name(), "skipping unknown field");
            }
            None => {
                return Err(EvaluationError::InvalidField(format!(
                    "{} has no field '{}'",
                    node.type_name().unwrap_or_else(|| "value".to_string()),
                    name
                )));
            }
        }
    }
    Ok(output)
}

fn evaluate_index(
    context: &EvaluationContext,
    index: &Expression,
    input: &Collection,
) -> Result<Collection, EvaluationError> {
    let mut branch = context.clone();
    let value = evaluate(&mut branch, index, input)?;
    let Some(item) = value.single()? else {
        return Ok(Collection::new());
    };
    let position = match item.to_system() {
        Some(Any::Integer(position)) => position,
        _ => {
            return Err(EvaluationError::TypeMismatch(format!(
                "index must be an Integer, got {:?}",
                item
            )));
        }
    };
    Ok(usize::try_from(position)
        .ok()
        .and_then(|position| input.get(position))
        .cloned()
        .map(|item| Collection::from(vec![item]))
        .unwrap_or_default())
}

fn evaluate_branches(
    context: &EvaluationContext,
    left: &Expression,
    right: &Expression,
    input: &Collection,
) -> Result<(Collection, Collection), EvaluationError> {
    let lhs = evaluate(&mut context.clone(), left, input)?;
    let rhs = evaluate(&mut context.clone(), right, input)?;
    Ok((lhs, rhs))
}

fn evaluate_equality(
    context: &EvaluationContext,
    left: &Expression,
    right: &Expression,
    not: bool,
    input: &Collection,
) -> Result<Collection, EvaluationError> {
    let (lhs, rhs) = evaluate_branches(context, left, right, input)?;
    if lhs.is_empty() || rhs.is_empty() {
        return Ok(Collection::new());
    }
    let equality = lhs.try_equal(&rhs);
    let equality = if not { equality.negate() } else { equality };
    Ok(equality
        .to_option()
        .map(Collection::singleton)
        .unwrap_or_default())
}

pub(crate) fn is_of_type(item: &Item, type_specifier: &TypeSpecifier) -> bool {
    type_of(item).is_some_and(|actual| actual.is(type_specifier))
}

fn evaluate_boolean(
    context: &EvaluationContext,
    op: BooleanOp,
    left: &Expression,
    right: &Expression,
    input: &Collection,
) -> Result<Collection, EvaluationError> {
    let (lhs, rhs) = evaluate_branches(context, left, right, input)?;
    let lhs = lhs.to_singleton_boolean()?;
    let rhs = rhs.to_singleton_boolean()?;
    let result = match op {
        BooleanOp::And => match (lhs, rhs) {
            (Some(false), _) | (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        },
        BooleanOp::Or => match (lhs, rhs) {
            (Some(true), _) | (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        },
        BooleanOp::Xor => match (lhs, rhs) {
            (Some(a), Some(b)) => Some(a != b),
            _ => None,
        },
        BooleanOp::Implies => match (lhs, rhs) {
            (Some(false), _) | (_, Some(true)) => Some(true),
            (Some(true), Some(false)) => Some(false),
            _ => None,
        },
    };
    Ok(result.map(Collection::singleton).unwrap_or_default())
}

/// The System value of an operand for comparison or arithmetic.
fn operand_value(item: &Item, op: &str) -> Result<Any, EvaluationError> {
    item.to_system().ok_or_else(|| {
        EvaluationError::TypeMismatch(format!(
            "'{}' needs a System value, got {:?}",
            op, item
        ))
    })
}

/// Evaluates both sides of a binary operator down to normalized singleton
/// System values; `None` when either side is empty.
fn binary_operands(
    context: &EvaluationContext,
    op: &str,
    left: &Expression,
    right: &Expression,
    input: &Collection,
) -> Result<Option<(Any, Any)>, EvaluationError> {
    let (lhs, rhs) = evaluate_branches(context, left, right, input)?;
    let (Some(lhs), Some(rhs)) = (lhs.single()?, rhs.single()?) else {
        return Ok(None);
    };
    let lhs = operand_value(lhs, op)?;
    let rhs = operand_value(rhs, op)?;
    Ok(Some((lhs.normalize(&rhs), rhs.normalize(&lhs))))
}

fn evaluate_comparison(
    context: &EvaluationContext,
    op: ComparisonOp,
    left: &Expression,
    right: &Expression,
    input: &Collection,
) -> Result<Collection, EvaluationError> {
    let Some((lhs, rhs)) = binary_operands(context, &op.to_string(), left, right, input)? else {
        return Ok(Collection::new());
    };
    let result = match op {
        ComparisonOp::Less => lhs.less(&rhs),
        ComparisonOp::Greater => rhs.less(&lhs),
        ComparisonOp::LessOrEqual => rhs.less(&lhs).map(|greater| !greater),
        ComparisonOp::GreaterOrEqual => lhs.less(&rhs).map(|less| !less),
    };
    match result {
        Ok(value) => Ok(Collection::singleton(value)),
        Err(e) if e.is_incomparable() => {
            debug!(error = %e, "comparison is indeterminate");
            Ok(Collection::new())
        }
        Err(e) => Err(e),
    }
}

fn evaluate_arithmetic(
    context: &EvaluationContext,
    op: ArithmeticOp,
    left: &Expression,
    right: &Expression,
    input: &Collection,
) -> Result<Collection, EvaluationError> {
    let Some((lhs, rhs)) = binary_operands(context, &op.to_string(), left, right, input)? else {
        return Ok(Collection::new());
    };
    let result = match op {
        ArithmeticOp::Add => lhs.add(&rhs),
        ArithmeticOp::Sub => lhs.sub(&rhs),
        ArithmeticOp::Mul => lhs.mul(&rhs),
        ArithmeticOp::Div => lhs.divide(&rhs),
        ArithmeticOp::FloorDiv => lhs.quotient(&rhs),
        ArithmeticOp::Mod => lhs.remainder(&rhs),
    };
    match result {
        Ok(value) => Ok(Collection::singleton(value)),
        Err(e) if e.collapses_to_empty() => {
            debug!(error = %e, "arithmetic result is empty");
            Ok(Collection::new())
        }
        Err(e) => Err(e),
    }
}

/// A concatenation operand: empty reads as the empty string.
fn concat_operand(operand: &Collection) -> Result<String, EvaluationError> {
    let Some(item) = operand.single()? else {
        return Ok(String::new());
    };
    match item.to_system() {
        Some(Any::String(s)) => Ok(s),
        _ => Err(EvaluationError::TypeMismatch(format!(
            "'&' needs String operands, got {:?}",
            item
        ))),
    }
}

fn evaluate_concat(
    context: &EvaluationContext,
    left: &Expression,
    right: &Expression,
    input: &Collection,
) -> Result<Collection, EvaluationError> {
    let (lhs, rhs) = evaluate_branches(context, left, right, input)?;
    let mut result = concat_operand(&lhs)?;
    result.push_str(&concat_operand(&rhs)?);
    Ok(Collection::singleton(result))
}

fn evaluate_negation(
    context: &mut EvaluationContext,
    operand: &Expression,
    input: &Collection,
) -> Result<Collection, EvaluationError> {
    let value = evaluate(context, operand, input)?;
    let Some(item) = value.single()? else {
        return Ok(Collection::new());
    };
    let value = item.to_system().ok_or_else(|| {
        EvaluationError::InvalidType(format!("cannot negate {:?}", item))
    })?;
    match value.negate() {
        Ok(negated) => Ok(Collection::singleton(negated)),
        Err(e) if e.collapses_to_empty() => Ok(Collection::new()),
        Err(e) => Err(e),
    }
}
