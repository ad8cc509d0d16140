use thiserror::Error;

/// Error type for FHIRPath evaluation failures.
///
/// The variants are categories rather than individual messages: each carries a
/// human readable detail string describing the offending operands or names.
///
/// Two layers use this type. The value layer (`system`) reports every problem
/// it finds, including overflow and precision/unit mismatches. The expression
/// layer then turns the FHIRPath-mandated subset of those failures into an
/// empty collection (see [`EvaluationError::collapses_to_empty`]) and
/// propagates the rest.
///
/// # Examples
///
/// ```rust
/// use atrius_fhirpath_support::EvaluationError;
///
/// let error = EvaluationError::TypeMismatch("cannot add String and Integer".to_string());
/// assert_eq!(error.to_string(), "type mismatch: cannot add String and Integer");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    /// Incompatible operand types for an operator or function.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// An operation required at most (or exactly) one item.
    #[error("not a singleton: {0}")]
    NotSingleton(String),

    /// A value does not have the primitive type the operation requires.
    #[error("invalid type: {0}")]
    InvalidType(String),

    /// A value cannot be cast to the requested primitive.
    #[error("cannot be cast: {0}")]
    CantBeCast(String),

    /// Unknown operator in an expression tree.
    #[error("invalid operator: {0}")]
    InvalidOperator(String),

    /// Unknown or non-navigable field name.
    #[error("invalid field: {0}")]
    InvalidField(String),

    /// External constant (`%name`) that is not defined in the context.
    #[error("external constant not found: %{0}")]
    ConstantNotFound(String),

    /// A function was called with the wrong number of arguments.
    #[error("wrong arity: {0}")]
    WrongArity(String),

    /// An argument expression produced a value of the wrong type.
    #[error("invalid return type: {0}")]
    InvalidReturnType(String),

    /// A collection could not be converted to a native value.
    #[error("not convertible: {0}")]
    NotConvertible(String),

    /// Temporal values whose precisions do not allow an ordering.
    #[error("mismatched precision: {0}")]
    MismatchedPrecision(String),

    /// Quantities (or temporal arithmetic) with incompatible units.
    #[error("mismatched unit: {0}")]
    MismatchedUnit(String),

    /// 32-bit integer arithmetic overflowed.
    #[error("integer overflow: {0}")]
    IntOverflow(String),

    /// Decimal arithmetic overflowed the representable range.
    #[error("decimal overflow: {0}")]
    DecimalOverflow(String),

    /// Division (`/`, `div`, `mod`) by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Invalid regular expression pattern.
    #[error("invalid regex: {0}")]
    InvalidRegex(String),

    /// A registered placeholder function that has no implementation yet.
    #[error("function not yet implemented: {0}")]
    NotYetImplemented(String),

    /// A function name that is not registered in the function table.
    #[error("function not found: {0}")]
    FunctionNotFound(String),

    /// A function definition rejected by the function table.
    #[error("invalid function definition: {0}")]
    InvalidFunction(String),

    /// A literal string that does not parse as the requested System type.
    #[error("invalid literal: {0}")]
    InvalidLiteral(String),
}

impl EvaluationError {
    /// Returns true for value-layer failures that an arithmetic expression
    /// reports as an empty collection instead of an error.
    pub fn collapses_to_empty(&self) -> bool {
        matches!(
            self,
            EvaluationError::IntOverflow(_)
                | EvaluationError::DecimalOverflow(_)
                | EvaluationError::DivisionByZero
        )
    }

    /// Returns true for ordering failures that a comparison expression
    /// reports as an empty collection.
    pub fn is_incomparable(&self) -> bool {
        matches!(
            self,
            EvaluationError::MismatchedPrecision(_) | EvaluationError::MismatchedUnit(_)
        )
    }
}
