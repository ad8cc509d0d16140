//! # Function Table
//!
//! Maps FHIRPath function names to their implementations.
//!
//! A [`Function`] is an arity range plus a callable that receives the
//! evaluation context, the input collection and the *unevaluated* argument
//! expressions. Functions that evaluate an argument once per input item
//! (`where`, `select`, `repeat`, ...) are written directly against that
//! signature. Everything else is an ordinary Rust function over typed
//! arguments, wrapped by one of the `native*` adapters which evaluate,
//! check and convert the arguments before the call.
//!
//! [`FunctionTable::builtin`] returns the standard catalog. Callers can clone
//! it and [`register`](FunctionTable::register) their own functions.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use atrius_fhirpath_support::system::{Any, Date, DateTime, FromSystem, Quantity, Time};
use atrius_fhirpath_support::{Collection, EvaluationError, Item};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;

use crate::evaluator::{EvaluationContext, evaluate};
use crate::expression::Expression;
use crate::{
    boolean_functions, collection_functions, collection_navigation, conversion_functions,
    date_functions, distinct_functions, extension_function, math_functions, not_function,
    repeat_function, set_operations, string_functions, subset_functions, trace_function,
    type_function,
};

/// Signature shared by every function implementation.
pub type FunctionImpl = Arc<
    dyn Fn(&mut EvaluationContext, &Collection, &[Expression]) -> Result<Collection, EvaluationError>
        + Send
        + Sync,
>;

/// A callable FHIRPath function with its accepted argument count.
#[derive(Clone)]
pub struct Function {
    pub min_arity: usize,
    pub max_arity: usize,
    pub func: FunctionImpl,
}

impl Function {
    pub fn new<F>(min_arity: usize, max_arity: usize, func: F) -> Self
    where
        F: Fn(&mut EvaluationContext, &Collection, &[Expression]) -> Result<Collection, EvaluationError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            min_arity,
            max_arity,
            func: Arc::new(func),
        }
    }

    pub fn check_arity(&self, name: &str, count: usize) -> Result<(), EvaluationError> {
        check_argument_count(self.min_arity, self.max_arity, count)
            .map_err(|e| EvaluationError::WrongArity(format!("{}(): {}", name, e)))
    }

    /// Checks the argument count, then runs the implementation.
    pub fn call(
        &self,
        context: &mut EvaluationContext,
        input: &Collection,
        args: &[Expression],
    ) -> Result<Collection, EvaluationError> {
        check_argument_count(self.min_arity, self.max_arity, args.len())
            .map_err(EvaluationError::WrongArity)?;
        (self.func)(context, input, args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("min_arity", &self.min_arity)
            .field("max_arity", &self.max_arity)
            .finish_non_exhaustive()
    }
}

fn check_argument_count(min: usize, max: usize, count: usize) -> Result<(), String> {
    if count < min || count > max {
        let expected = if min == max {
            format!("{}", min)
        } else {
            format!("{} to {}", min, max)
        };
        return Err(format!("expected {} arguments, got {}", expected, count));
    }
    Ok(())
}

/// A parameter type the native adapters can produce from an evaluated
/// argument.
pub trait NativeArg: Sized {
    /// Optional parameters may be omitted and accept an empty argument.
    const OPTIONAL: bool = false;

    /// Converts the argument's single item (`None` when it evaluated to
    /// empty or was omitted). `Ok(None)` makes the whole call return empty;
    /// `Err` names the type that was expected.
    fn from_argument(item: Option<&Item>) -> Result<Option<Self>, &'static str>;
}

macro_rules! system_native_arg {
    ($($ty:ty),* $(,)?) => {
        $(
            impl NativeArg for $ty {
                fn from_argument(item: Option<&Item>) -> Result<Option<Self>, &'static str> {
                    let Some(item) = item else {
                        return Ok(None);
                    };
                    item.to_system()
                        .as_ref()
                        .and_then(<$ty as FromSystem>::from_system)
                        .map(Some)
                        .ok_or(<$ty as FromSystem>::TYPE_NAME)
                }
            }
        )*
    };
}

system_native_arg!(Any, bool, i32, Decimal, String, Date, Time, DateTime, Quantity);

impl<T: NativeArg> NativeArg for Option<T> {
    const OPTIONAL: bool = true;

    fn from_argument(item: Option<&Item>) -> Result<Option<Self>, &'static str> {
        match item {
            None => Ok(Some(None)),
            Some(_) => T::from_argument(item).map(|value| value.map(Some)),
        }
    }
}

/// Smallest accepted argument count: everything up to the last required
/// parameter.
fn required_arity(optional: &[bool]) -> usize {
    optional
        .iter()
        .rposition(|is_optional| !is_optional)
        .map_or(0, |position| position + 1)
}

/// Evaluates one argument against the function's input on a cloned context.
fn argument(
    context: &EvaluationContext,
    input: &Collection,
    args: &[Expression],
    position: usize,
) -> Result<Option<Item>, EvaluationError> {
    let Some(expression) = args.get(position) else {
        return Ok(None);
    };
    let mut branch = context.clone();
    let value = evaluate(&mut branch, expression, input)?;
    if value.len() > 1 {
        return Err(EvaluationError::NotSingleton(format!(
            "argument {} evaluated to {} items",
            position + 1,
            value.len()
        )));
    }
    Ok(value.into_iter().next())
}

fn convert<A: NativeArg>(item: Option<Item>, position: usize) -> Result<Option<A>, EvaluationError> {
    A::from_argument(item.as_ref()).map_err(|expected| {
        EvaluationError::InvalidReturnType(format!(
            "argument {} must be a {}, got {:?}",
            position + 1,
            expected,
            item
        ))
    })
}

/// Wraps a function of the input collection alone.
pub fn native0<F>(f: F) -> Function
where
    F: Fn(&Collection) -> Result<Collection, EvaluationError> + Send + Sync + 'static,
{
    Function::new(0, 0, move |_context, input, args| {
        check_argument_count(0, 0, args.len()).map_err(EvaluationError::WrongArity)?;
        f(input)
    })
}

/// Wraps a function of the input and one typed argument.
pub fn native1<A, F>(f: F) -> Function
where
    A: NativeArg + 'static,
    F: Fn(&Collection, A) -> Result<Collection, EvaluationError> + Send + Sync + 'static,
{
    let min = required_arity(&[A::OPTIONAL]);
    Function::new(min, 1, move |context, input, args| {
        check_argument_count(min, 1, args.len()).map_err(EvaluationError::WrongArity)?;
        let Some(a) = convert::<A>(argument(context, input, args, 0)?, 0)? else {
            return Ok(Collection::new());
        };
        f(input, a)
    })
}

/// Wraps a function of the input and two typed arguments.
pub fn native2<A, B, F>(f: F) -> Function
where
    A: NativeArg + 'static,
    B: NativeArg + 'static,
    F: Fn(&Collection, A, B) -> Result<Collection, EvaluationError> + Send + Sync + 'static,
{
    let min = required_arity(&[A::OPTIONAL, B::OPTIONAL]);
    Function::new(min, 2, move |context, input, args| {
        check_argument_count(min, 2, args.len()).map_err(EvaluationError::WrongArity)?;
        let a = convert::<A>(argument(context, input, args, 0)?, 0)?;
        let b = convert::<B>(argument(context, input, args, 1)?, 1)?;
        match (a, b) {
            (Some(a), Some(b)) => f(input, a, b),
            _ => Ok(Collection::new()),
        }
    })
}

/// Wraps a function of the input and three typed arguments.
pub fn native3<A, B, C, F>(f: F) -> Function
where
    A: NativeArg + 'static,
    B: NativeArg + 'static,
    C: NativeArg + 'static,
    F: Fn(&Collection, A, B, C) -> Result<Collection, EvaluationError> + Send + Sync + 'static,
{
    let min = required_arity(&[A::OPTIONAL, B::OPTIONAL, C::OPTIONAL]);
    Function::new(min, 3, move |context, input, args| {
        check_argument_count(min, 3, args.len()).map_err(EvaluationError::WrongArity)?;
        let a = convert::<A>(argument(context, input, args, 0)?, 0)?;
        let b = convert::<B>(argument(context, input, args, 1)?, 1)?;
        let c = convert::<C>(argument(context, input, args, 2)?, 2)?;
        match (a, b, c) {
            (Some(a), Some(b), Some(c)) => f(input, a, b, c),
            _ => Ok(Collection::new()),
        }
    })
}

/// A registered name without an implementation.
pub fn not_implemented(name: &'static str, min_arity: usize, max_arity: usize) -> Function {
    Function::new(min_arity, max_arity, move |_context, _input, _args| {
        Err(EvaluationError::NotYetImplemented(name.to_string()))
    })
}

/// Case-sensitive function name to implementation map.
#[derive(Clone, Default)]
pub struct FunctionTable {
    functions: HashMap<String, Function>,
}

static BUILTIN: Lazy<FunctionTable> = Lazy::new(FunctionTable::standard_catalog);

impl FunctionTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard FHIRPath function catalog.
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// Adds a function. Fails on a name that is already taken or on an
    /// inverted arity range.
    pub fn register(&mut self, name: &str, function: Function) -> Result<(), EvaluationError> {
        if function.min_arity > function.max_arity {
            return Err(EvaluationError::InvalidFunction(format!(
                "{}: min arity {} exceeds max arity {}",
                name, function.min_arity, function.max_arity
            )));
        }
        if self.functions.contains_key(name) {
            return Err(EvaluationError::InvalidFunction(format!(
                "{} is already registered",
                name
            )));
        }
        self.functions.insert(name.to_string(), function);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn define(&mut self, name: &str, function: Function) {
        self.functions.insert(name.to_string(), function);
    }

    fn standard_catalog() -> Self {
        let mut table = Self::new();

        // Existence
        table.define("empty", native0(collection_functions::empty_function));
        table.define("exists", Function::new(0, 1, collection_functions::exists_function));
        table.define("all", Function::new(1, 1, collection_functions::all_function));
        table.define("allTrue", native0(boolean_functions::all_true_function));
        table.define("anyTrue", native0(boolean_functions::any_true_function));
        table.define("allFalse", native0(boolean_functions::all_false_function));
        table.define("anyFalse", native0(boolean_functions::any_false_function));
        table.define("count", native0(collection_functions::count_function));
        table.define("hasValue", native0(collection_functions::has_value_function));
        table.define("subsetOf", Function::new(1, 1, subset_functions::subset_of_function));
        table.define("supersetOf", Function::new(1, 1, subset_functions::superset_of_function));
        table.define("distinct", native0(distinct_functions::distinct_function));
        table.define("isDistinct", native0(distinct_functions::is_distinct_function));

        // Filtering and projection
        table.define("where", Function::new(1, 1, collection_functions::where_function));
        table.define("select", Function::new(1, 1, collection_functions::select_function));
        table.define("repeat", Function::new(1, 1, repeat_function::repeat_function));
        table.define("ofType", Function::new(1, 1, type_function::of_type_function));

        // Subsetting
        table.define("single", native0(collection_functions::single_function));
        table.define("first", native0(collection_functions::first_function));
        table.define("last", native0(collection_functions::last_function));
        table.define("tail", native0(collection_navigation::tail_function));
        table.define("skip", native1(collection_navigation::skip_function));
        table.define("take", native1(collection_navigation::take_function));
        table.define("intersect", Function::new(1, 1, set_operations::intersect_function));
        table.define("exclude", Function::new(1, 1, set_operations::exclude_function));

        // Combining
        table.define("union", Function::new(1, 1, set_operations::union_function));
        table.define("combine", Function::new(1, 1, set_operations::combine_function));

        // Conversion
        table.define("iif", Function::new(2, 3, conversion_functions::iif_function));
        table.define("toBoolean", native0(conversion_functions::to_boolean_function));
        table.define(
            "convertsToBoolean",
            native0(conversion_functions::converts_to_boolean_function),
        );
        table.define("toInteger", native0(conversion_functions::to_integer_function));
        table.define(
            "convertsToInteger",
            native0(conversion_functions::converts_to_integer_function),
        );
        table.define("toDecimal", native0(conversion_functions::to_decimal_function));
        table.define(
            "convertsToDecimal",
            native0(conversion_functions::converts_to_decimal_function),
        );
        table.define("toDate", native0(conversion_functions::to_date_function));
        table.define("convertsToDate", native0(conversion_functions::converts_to_date_function));
        table.define("toDateTime", native0(conversion_functions::to_date_time_function));
        table.define(
            "convertsToDateTime",
            native0(conversion_functions::converts_to_date_time_function),
        );
        table.define("toTime", native0(conversion_functions::to_time_function));
        table.define("convertsToTime", native0(conversion_functions::converts_to_time_function));
        table.define("toString", native0(conversion_functions::to_string_function));
        table.define(
            "convertsToString",
            native0(conversion_functions::converts_to_string_function),
        );
        table.define("toQuantity", native1(conversion_functions::to_quantity_function));
        table.define(
            "convertsToQuantity",
            native1(conversion_functions::converts_to_quantity_function),
        );

        // Strings
        table.define("startsWith", native1(string_functions::starts_with_function));
        table.define("endsWith", native1(string_functions::ends_with_function));
        table.define("contains", native1(string_functions::contains_function));
        table.define("length", native0(string_functions::length_function));
        table.define("upper", native0(string_functions::upper_function));
        table.define("lower", native0(string_functions::lower_function));
        table.define("trim", native0(string_functions::trim_function));
        table.define("toChars", native0(string_functions::to_chars_function));
        table.define("substring", native2(string_functions::substring_function));
        table.define("indexOf", native1(string_functions::index_of_function));
        table.define("matches", native1(string_functions::matches_function));
        table.define("replace", native2(string_functions::replace_function));
        table.define("replaceMatches", native2(string_functions::replace_matches_function));
        table.define("join", native1(string_functions::join_function));

        // Math
        table.define("abs", native0(math_functions::abs_function));
        table.define("ceiling", native0(math_functions::ceiling_function));
        table.define("floor", native0(math_functions::floor_function));
        table.define("truncate", native0(math_functions::truncate_function));
        table.define("round", native1(math_functions::round_function));
        table.define("exp", native0(math_functions::exp_function));
        table.define("ln", native0(math_functions::ln_function));
        table.define("log", native1(math_functions::log_function));
        table.define("power", native1(math_functions::power_function));
        table.define("sqrt", native0(math_functions::sqrt_function));

        // Tree navigation
        table.define("children", native0(collection_navigation::children_function));
        table.define("descendants", native0(collection_navigation::descendants_function));

        // Utility
        table.define("now", Function::new(0, 0, date_functions::now_function));
        table.define("today", Function::new(0, 0, date_functions::today_function));
        table.define("timeOfDay", Function::new(0, 0, date_functions::time_of_day_function));
        table.define("trace", Function::new(1, 2, trace_function::trace_function));
        table.define("not", native0(not_function::not_function));
        table.define("is", Function::new(1, 1, type_function::is_function));
        table.define("as", Function::new(1, 1, type_function::as_function));
        table.define("extension", native1(extension_function::extension_function));

        // Registered for arity checking; evaluation fails with NotYetImplemented.
        table.define("resolve", not_implemented("resolve", 0, 0));
        table.define("memberOf", not_implemented("memberOf", 1, 1));
        table.define("conformsTo", not_implemented("conformsTo", 1, 1));
        table.define("htmlChecks", not_implemented("htmlChecks", 0, 0));
        table.define("aggregate", not_implemented("aggregate", 1, 2));
        table.define("encode", not_implemented("encode", 1, 1));
        table.define("decode", not_implemented("decode", 1, 1));
        table.define("escape", not_implemented("escape", 1, 1));
        table.define("unescape", not_implemented("unescape", 1, 1));

        table
    }
}

impl fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionTable")
            .field("functions", &self.names())
            .finish()
    }
}
