use std::fmt;

use rust_decimal::Decimal;

use crate::evaluation_error::EvaluationError;
use crate::system::{decimal, integer, string};
use crate::system::{Date, DateTime, Equality, Quantity, Time};

/// A FHIRPath System value.
///
/// This is the closed set of primitive types the language computes with.
/// Structured values never appear here; they travel through collections as
/// [`Node`](crate::traits::Node)s and only become an `Any` when they wrap a
/// primitive.
///
/// # Examples
///
/// ```rust
/// use atrius_fhirpath_support::system::{Any, Equality};
///
/// let one = Any::Integer(1);
/// let also_one = Any::parse_literal("1.0").unwrap();
/// assert_eq!(one.normalize(&also_one).try_equal(&also_one), Equality::Equal);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Any {
    Boolean(bool),
    String(String),
    Integer(i32),
    Decimal(Decimal),
    Date(Date),
    Time(Time),
    DateTime(DateTime),
    Quantity(Quantity),
}

impl Any {
    /// The System type name, as used by `System.<name>` type specifiers.
    pub fn type_name(&self) -> &'static str {
        match self {
            Any::Boolean(_) => "Boolean",
            Any::String(_) => "String",
            Any::Integer(_) => "Integer",
            Any::Decimal(_) => "Decimal",
            Any::Date(_) => "Date",
            Any::Time(_) => "Time",
            Any::DateTime(_) => "DateTime",
            Any::Quantity(_) => "Quantity",
        }
    }

    /// Three-valued equality. Values of different System types are never
    /// equal; callers normalize operands first when coercion applies.
    pub fn try_equal(&self, other: &Any) -> Equality {
        match self {
            Any::Boolean(a) => match other {
                Any::Boolean(b) => Equality::from_bool(a == b),
                _ => Equality::NotEqual,
            },
            Any::String(a) => match other {
                Any::String(b) => Equality::from_bool(a == b),
                _ => Equality::NotEqual,
            },
            Any::Integer(a) => match other {
                Any::Integer(b) => Equality::from_bool(a == b),
                _ => Equality::NotEqual,
            },
            Any::Decimal(a) => match other {
                Any::Decimal(b) => Equality::from_bool(a == b),
                _ => Equality::NotEqual,
            },
            Any::Date(a) => match other {
                Any::Date(b) => a.try_equal(b),
                _ => Equality::NotEqual,
            },
            Any::Time(a) => match other {
                Any::Time(b) => a.try_equal(b),
                _ => Equality::NotEqual,
            },
            Any::DateTime(a) => match other {
                Any::DateTime(b) => a.try_equal(b),
                _ => Equality::NotEqual,
            },
            Any::Quantity(a) => match other {
                Any::Quantity(b) => a.try_equal(b),
                _ => Equality::NotEqual,
            },
        }
    }

    /// Determinate equality: true only when [`Any::try_equal`] says `Equal`.
    pub fn equal(&self, other: &Any) -> bool {
        self.try_equal(other) == Equality::Equal
    }

    fn mismatch(&self, op: &str, other: &Any) -> EvaluationError {
        EvaluationError::TypeMismatch(format!(
            "cannot apply '{}' to {} and {}",
            op,
            self.type_name(),
            other.type_name()
        ))
    }

    /// Strict ordering between two values of the same System type.
    pub fn less(&self, other: &Any) -> Result<bool, EvaluationError> {
        match (self, other) {
            (Any::String(a), Any::String(b)) => Ok(a < b),
            (Any::Integer(a), Any::Integer(b)) => Ok(a < b),
            (Any::Decimal(a), Any::Decimal(b)) => Ok(a < b),
            (Any::Date(a), Any::Date(b)) => a.less(b),
            (Any::Time(a), Any::Time(b)) => a.less(b),
            (Any::DateTime(a), Any::DateTime(b)) => a.less(b),
            (Any::Quantity(a), Any::Quantity(b)) => a.less(b),
            _ => Err(self.mismatch("<", other)),
        }
    }

    /// Widens `self` toward the type of `target` when FHIRPath defines an
    /// implicit conversion (Integer to Decimal, a number to a Quantity in the
    /// target's unit, Date to DateTime). Otherwise returns `self` unchanged.
    pub fn normalize(&self, target: &Any) -> Any {
        match (self, target) {
            (Any::Integer(i), Any::Decimal(_)) => Any::Decimal(Decimal::from(*i)),
            (Any::Integer(i), Any::Quantity(q)) => {
                Any::Quantity(Quantity::new(Decimal::from(*i), q.unit()))
            }
            (Any::Decimal(d), Any::Quantity(q)) => Any::Quantity(Quantity::new(*d, q.unit())),
            (Any::Date(d), Any::DateTime(_)) => Any::DateTime(d.to_date_time()),
            _ => self.clone(),
        }
    }

    /// Unary minus.
    pub fn negate(&self) -> Result<Any, EvaluationError> {
        match self {
            Any::Integer(i) => Ok(Any::Integer(integer::negate(*i)?)),
            Any::Decimal(d) => Ok(Any::Decimal(-*d)),
            Any::Quantity(q) => Ok(Any::Quantity(q.negate())),
            other => Err(EvaluationError::InvalidType(format!(
                "cannot negate {}",
                other.type_name()
            ))),
        }
    }

    pub fn add(&self, other: &Any) -> Result<Any, EvaluationError> {
        match (self, other) {
            (Any::Integer(a), Any::Integer(b)) => Ok(Any::Integer(integer::add(*a, *b)?)),
            (Any::Decimal(a), Any::Decimal(b)) => Ok(Any::Decimal(decimal::add(*a, *b)?)),
            (Any::Quantity(a), Any::Quantity(b)) => Ok(Any::Quantity(a.add(b)?)),
            (Any::String(a), Any::String(b)) => Ok(Any::String(format!("{}{}", a, b))),
            (Any::Date(a), Any::Quantity(q)) => Ok(Any::Date(a.add(q)?)),
            (Any::DateTime(a), Any::Quantity(q)) => Ok(Any::DateTime(a.add(q)?)),
            (Any::Time(a), Any::Quantity(q)) => Ok(Any::Time(a.add(q)?)),
            _ => Err(self.mismatch("+", other)),
        }
    }

    pub fn sub(&self, other: &Any) -> Result<Any, EvaluationError> {
        match (self, other) {
            (Any::Integer(a), Any::Integer(b)) => Ok(Any::Integer(integer::sub(*a, *b)?)),
            (Any::Decimal(a), Any::Decimal(b)) => Ok(Any::Decimal(decimal::sub(*a, *b)?)),
            (Any::Quantity(a), Any::Quantity(b)) => Ok(Any::Quantity(a.sub(b)?)),
            (Any::Date(a), Any::Quantity(q)) => Ok(Any::Date(a.sub(q)?)),
            (Any::DateTime(a), Any::Quantity(q)) => Ok(Any::DateTime(a.sub(q)?)),
            (Any::Time(a), Any::Quantity(q)) => Ok(Any::Time(a.sub(q)?)),
            _ => Err(self.mismatch("-", other)),
        }
    }

    pub fn mul(&self, other: &Any) -> Result<Any, EvaluationError> {
        match (self, other) {
            (Any::Integer(a), Any::Integer(b)) => Ok(Any::Integer(integer::mul(*a, *b)?)),
            (Any::Decimal(a), Any::Decimal(b)) => Ok(Any::Decimal(decimal::mul(*a, *b)?)),
            _ => Err(self.mismatch("*", other)),
        }
    }

    /// The `/` operator; the result is always a Decimal.
    pub fn divide(&self, other: &Any) -> Result<Any, EvaluationError> {
        match (self, other) {
            (Any::Integer(a), Any::Integer(b)) => Ok(Any::Decimal(integer::divide(*a, *b)?)),
            (Any::Decimal(a), Any::Decimal(b)) => Ok(Any::Decimal(decimal::divide(*a, *b)?)),
            _ => Err(self.mismatch("/", other)),
        }
    }

    /// The `div` operator; the result is always an Integer.
    pub fn quotient(&self, other: &Any) -> Result<Any, EvaluationError> {
        match (self, other) {
            (Any::Integer(a), Any::Integer(b)) => Ok(Any::Integer(integer::quotient(*a, *b)?)),
            (Any::Decimal(a), Any::Decimal(b)) => Ok(Any::Integer(decimal::quotient(*a, *b)?)),
            _ => Err(self.mismatch("div", other)),
        }
    }

    /// The `mod` operator.
    pub fn remainder(&self, other: &Any) -> Result<Any, EvaluationError> {
        match (self, other) {
            (Any::Integer(a), Any::Integer(b)) => Ok(Any::Integer(integer::remainder(*a, *b)?)),
            (Any::Decimal(a), Any::Decimal(b)) => Ok(Any::Decimal(decimal::remainder(*a, *b)?)),
            _ => Err(self.mismatch("mod", other)),
        }
    }

    /// Parses a FHIRPath literal token: `true`/`false`, a quoted string, an
    /// `@` date, date-time or time, a number, or a quantity.
    pub fn parse_literal(literal: &str) -> Result<Any, EvaluationError> {
        let literal = literal.trim();
        match literal {
            "true" => return Ok(Any::Boolean(true)),
            "false" => return Ok(Any::Boolean(false)),
            _ => {}
        }
        if literal.starts_with('\'') {
            return string::parse_literal(literal).map(Any::String);
        }
        if let Some(temporal) = literal.strip_prefix('@') {
            if temporal.starts_with('T') {
                return Time::parse(temporal).map(Any::Time);
            }
            if temporal.contains('T') {
                return DateTime::parse(temporal).map(Any::DateTime);
            }
            return Date::parse(temporal).map(Any::Date);
        }
        if literal.contains(char::is_whitespace) {
            return Quantity::parse(literal).map(Any::Quantity);
        }
        if literal.contains('.') {
            return decimal::parse(literal).map(Any::Decimal);
        }
        integer::parse(literal).map(Any::Integer)
    }

    /// Renders the value as a literal that [`Any::parse_literal`] reads back.
    pub fn to_literal(&self) -> String {
        match self {
            Any::String(s) => string::render_literal(s),
            Any::Date(d) => format!("@{}", d),
            Any::DateTime(dt) => match dt.time() {
                Some(_) => format!("@{}", dt),
                None => format!("@{}T", dt),
            },
            Any::Time(t) => format!("@T{}", t),
            other => other.to_string(),
        }
    }
}

/// The `toString()` rendering: strings are unquoted, temporals carry no `@`.
impl fmt::Display for Any {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Any::Boolean(b) => write!(f, "{}", b),
            Any::String(s) => f.write_str(s),
            Any::Integer(i) => write!(f, "{}", i),
            Any::Decimal(d) => write!(f, "{}", d),
            Any::Date(d) => write!(f, "{}", d),
            Any::Time(t) => write!(f, "{}", t),
            Any::DateTime(dt) => write!(f, "{}", dt),
            Any::Quantity(q) => write!(f, "{}", q),
        }
    }
}

impl From<bool> for Any {
    fn from(value: bool) -> Self {
        Any::Boolean(value)
    }
}

impl From<i32> for Any {
    fn from(value: i32) -> Self {
        Any::Integer(value)
    }
}

impl From<Decimal> for Any {
    fn from(value: Decimal) -> Self {
        Any::Decimal(value)
    }
}

impl From<String> for Any {
    fn from(value: String) -> Self {
        Any::String(value)
    }
}

impl From<&str> for Any {
    fn from(value: &str) -> Self {
        Any::String(value.to_string())
    }
}

impl From<Date> for Any {
    fn from(value: Date) -> Self {
        Any::Date(value)
    }
}

impl From<Time> for Any {
    fn from(value: Time) -> Self {
        Any::Time(value)
    }
}

impl From<DateTime> for Any {
    fn from(value: DateTime) -> Self {
        Any::DateTime(value)
    }
}

impl From<Quantity> for Any {
    fn from(value: Quantity) -> Self {
        Any::Quantity(value)
    }
}

/// Extraction of a native Rust value from a System value.
///
/// Implementations accept the exact System type and the implicit widenings
/// FHIRPath allows toward it (an Integer is a valid Decimal argument, a Date
/// a valid DateTime argument).
pub trait FromSystem: Sized {
    /// System type name used in conversion error messages.
    const TYPE_NAME: &'static str;

    fn from_system(value: &Any) -> Option<Self>;
}

impl FromSystem for Any {
    const TYPE_NAME: &'static str = "Any";

    fn from_system(value: &Any) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromSystem for bool {
    const TYPE_NAME: &'static str = "Boolean";

    fn from_system(value: &Any) -> Option<Self> {
        match value {
            Any::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromSystem for String {
    const TYPE_NAME: &'static str = "String";

    fn from_system(value: &Any) -> Option<Self> {
        match value {
            Any::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromSystem for i32 {
    const TYPE_NAME: &'static str = "Integer";

    fn from_system(value: &Any) -> Option<Self> {
        match value {
            Any::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl FromSystem for Decimal {
    const TYPE_NAME: &'static str = "Decimal";

    fn from_system(value: &Any) -> Option<Self> {
        match value {
            Any::Decimal(d) => Some(*d),
            Any::Integer(i) => Some(Decimal::from(*i)),
            _ => None,
        }
    }
}

impl FromSystem for Date {
    const TYPE_NAME: &'static str = "Date";

    fn from_system(value: &Any) -> Option<Self> {
        match value {
            Any::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl FromSystem for Time {
    const TYPE_NAME: &'static str = "Time";

    fn from_system(value: &Any) -> Option<Self> {
        match value {
            Any::Time(t) => Some(*t),
            _ => None,
        }
    }
}

impl FromSystem for DateTime {
    const TYPE_NAME: &'static str = "DateTime";

    fn from_system(value: &Any) -> Option<Self> {
        match value {
            Any::DateTime(dt) => Some(*dt),
            Any::Date(d) => Some(d.to_date_time()),
            _ => None,
        }
    }
}

impl FromSystem for Quantity {
    const TYPE_NAME: &'static str = "Quantity";

    fn from_system(value: &Any) -> Option<Self> {
        match value {
            Any::Quantity(q) => Some(q.clone()),
            Any::Integer(i) => Some(Quantity::new(Decimal::from(*i), "1")),
            Any::Decimal(d) => Some(Quantity::new(*d, "1")),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(s: &str) -> Any {
        Any::parse_literal(s).unwrap()
    }

    #[test]
    fn test_parse_literal_kinds() {
        assert_eq!(lit("true"), Any::Boolean(true));
        assert_eq!(lit("'abc'"), Any::String("abc".into()));
        assert_eq!(lit("42"), Any::Integer(42));
        assert_eq!(lit("4.20").type_name(), "Decimal");
        assert_eq!(lit("@2020-01").type_name(), "Date");
        assert_eq!(lit("@2020-01-01T10:00").type_name(), "DateTime");
        assert_eq!(lit("@2020-01-01T").type_name(), "DateTime");
        assert_eq!(lit("@T10:00").type_name(), "Time");
        assert_eq!(lit("10 'mg'").type_name(), "Quantity");
    }

    #[test]
    fn test_literal_round_trip() {
        for literal in [
            "'it\\'s'",
            "@2020-02",
            "@2020-02-01T",
            "@2020-02-01T10:30:00.500+01:00",
            "@T23:59:59.999",
            "1.50",
            "-7",
            "4 weeks",
            "2.5 'mg/dL'",
        ] {
            assert_eq!(lit(literal).to_literal(), literal);
        }
    }

    #[test]
    fn test_equality_across_types() {
        assert_eq!(Any::Integer(1).try_equal(&Any::Decimal(Decimal::ONE)), Equality::NotEqual);
        assert_eq!(lit("1.0").try_equal(&lit("1.00")), Equality::Equal);
        assert_eq!(lit("'a'").try_equal(&Any::Boolean(true)), Equality::NotEqual);
    }

    #[test]
    fn test_normalize() {
        let widened = Any::Integer(2).normalize(&lit("1 'mg'"));
        assert_eq!(widened, lit("2 'mg'"));
        assert_eq!(Any::Integer(2).normalize(&lit("0.5")), Any::Decimal(Decimal::from(2)));
        assert_eq!(lit("@2020").normalize(&lit("@2020-01-01T10:00")).type_name(), "DateTime");
        assert_eq!(lit("'x'").normalize(&Any::Integer(1)), lit("'x'"));
    }

    #[test]
    fn test_less_type_mismatch() {
        assert!(matches!(
            Any::Boolean(true).less(&Any::Boolean(false)),
            Err(EvaluationError::TypeMismatch(_))
        ));
        assert!(matches!(
            Any::Integer(1).less(&lit("'1'")),
            Err(EvaluationError::TypeMismatch(_))
        ));
        assert!(lit("'abc'").less(&lit("'abd'")).unwrap());
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(lit("'a'").add(&lit("'b'")).unwrap(), lit("'ab'"));
        assert_eq!(Any::Integer(7).divide(&Any::Integer(2)).unwrap(), lit("3.5"));
        assert_eq!(lit("7.5").quotient(&lit("2.0")).unwrap(), Any::Integer(3));
        assert_eq!(lit("@2021-01-31").add(&lit("1 month")).unwrap(), lit("@2021-02-28"));
        assert!(matches!(
            lit("1 'mg'").mul(&lit("2 'mg'")),
            Err(EvaluationError::TypeMismatch(_))
        ));
        assert!(matches!(
            Any::Integer(i32::MAX).add(&Any::Integer(1)),
            Err(EvaluationError::IntOverflow(_))
        ));
    }

    #[test]
    fn test_negate() {
        assert_eq!(Any::Integer(3).negate().unwrap(), Any::Integer(-3));
        assert!(matches!(
            lit("'a'").negate(),
            Err(EvaluationError::InvalidType(_))
        ));
    }

    #[test]
    fn test_from_system_widening() {
        assert_eq!(Decimal::from_system(&Any::Integer(3)), Some(Decimal::from(3)));
        assert!(DateTime::from_system(&lit("@2020")).is_some());
        assert_eq!(i32::from_system(&lit("3.0")), None);
    }
}
