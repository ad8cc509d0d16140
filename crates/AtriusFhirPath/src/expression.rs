//! # FHIRPath Expression Tree
//!
//! The closed set of node kinds the evaluator understands. Trees are built
//! once (by a parser or by hand through the constructors below) and can be
//! evaluated any number of times; see [`crate::evaluator`] for the semantics
//! of each node.

use std::fmt;

use atrius_fhirpath_support::EvaluationError;
use atrius_fhirpath_support::system::Any;

use crate::fhir_type_hierarchy::TypeSpecifier;
use crate::function_table::{Function, FunctionTable};

/// `and`, `or`, `xor`, `implies`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    And,
    Or,
    Xor,
    Implies,
}

/// `<`, `>`, `<=`, `>=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
}

/// `+`, `-`, `*`, `/`, `div`, `mod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
}

impl fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BooleanOp::And => "and",
            BooleanOp::Or => "or",
            BooleanOp::Xor => "xor",
            BooleanOp::Implies => "implies",
        })
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComparisonOp::Less => "<",
            ComparisonOp::Greater => ">",
            ComparisonOp::LessOrEqual => "<=",
            ComparisonOp::GreaterOrEqual => ">=",
        })
    }
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Sub => "-",
            ArithmeticOp::Mul => "*",
            ArithmeticOp::Div => "/",
            ArithmeticOp::FloorDiv => "div",
            ArithmeticOp::Mod => "mod",
        })
    }
}

/// A FHIRPath expression node.
#[derive(Debug, Clone)]
pub enum Expression {
    /// `a.b.c`: each stage consumes the previous stage's output.
    Sequence(Vec<Expression>),
    /// `$this`
    Identity,
    /// A named field of each input item.
    Field(String),
    /// A type name in path position, e.g. the leading `Patient`.
    Type(String),
    /// A literal value; `None` is the empty literal `{}`.
    Literal(Option<Any>),
    /// `[index]`
    Index(Box<Expression>),
    /// `=` or, when `not` is set, `!=`.
    Equality {
        left: Box<Expression>,
        right: Box<Expression>,
        not: bool,
    },
    /// A call to a function resolved from a [`FunctionTable`].
    Function {
        name: String,
        function: Function,
        args: Vec<Expression>,
    },
    Is {
        expr: Box<Expression>,
        type_specifier: TypeSpecifier,
    },
    As {
        expr: Box<Expression>,
        type_specifier: TypeSpecifier,
    },
    Boolean {
        op: BooleanOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Comparison {
        op: ComparisonOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Arithmetic {
        op: ArithmeticOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// `&`
    Concat {
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// `%name`
    ExternalConstant(String),
    /// Unary `-`.
    Negation(Box<Expression>),
}

impl Expression {
    pub fn sequence(stages: Vec<Expression>) -> Self {
        Expression::Sequence(stages)
    }

    pub fn field(name: impl Into<String>) -> Self {
        Expression::Field(name.into())
    }

    pub fn type_name(name: impl Into<String>) -> Self {
        Expression::Type(name.into())
    }

    pub fn literal(value: impl Into<Any>) -> Self {
        Expression::Literal(Some(value.into()))
    }

    /// The empty literal `{}`.
    pub fn empty() -> Self {
        Expression::Literal(None)
    }

    pub fn index(index: Expression) -> Self {
        Expression::Index(Box::new(index))
    }

    pub fn constant(name: impl Into<String>) -> Self {
        Expression::ExternalConstant(name.into())
    }

    pub fn equal(left: Expression, right: Expression) -> Self {
        Expression::Equality {
            left: Box::new(left),
            right: Box::new(right),
            not: false,
        }
    }

    pub fn not_equal(left: Expression, right: Expression) -> Self {
        Expression::Equality {
            left: Box::new(left),
            right: Box::new(right),
            not: true,
        }
    }

    pub fn boolean(op: BooleanOp, left: Expression, right: Expression) -> Self {
        Expression::Boolean {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn comparison(op: ComparisonOp, left: Expression, right: Expression) -> Self {
        Expression::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn arithmetic(op: ArithmeticOp, left: Expression, right: Expression) -> Self {
        Expression::Arithmetic {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn concat(left: Expression, right: Expression) -> Self {
        Expression::Concat {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn is_type(expr: Expression, type_specifier: TypeSpecifier) -> Self {
        Expression::Is {
            expr: Box::new(expr),
            type_specifier,
        }
    }

    pub fn as_type(expr: Expression, type_specifier: TypeSpecifier) -> Self {
        Expression::As {
            expr: Box::new(expr),
            type_specifier,
        }
    }

    pub fn negate(expr: Expression) -> Self {
        Expression::Negation(Box::new(expr))
    }

    /// Builds a function call node, resolving `name` in `table` and checking
    /// the number of arguments against the registered arity.
    pub fn function(
        table: &FunctionTable,
        name: &str,
        args: Vec<Expression>,
    ) -> Result<Self, EvaluationError> {
        let function = table
            .get(name)
            .ok_or_else(|| EvaluationError::FunctionNotFound(name.to_string()))?;
        function.check_arity(name, args.len())?;
        Ok(Expression::Function {
            name: name.to_string(),
            function: function.clone(),
            args,
        })
    }
}
