use std::cmp::Ordering;
use std::fmt;

use rust_decimal::Decimal;

use crate::evaluation_error::EvaluationError;
use crate::system::decimal;
use crate::system::temporal::CALENDAR_KEYWORDS;
use crate::system::Equality;

/// A decimal magnitude with a unit.
///
/// The unit is either a UCUM code (`'mg'`, `'wk'`) or one of the FHIRPath
/// calendar duration keywords (`days`, `month`). Units are compared as plain
/// strings: `1 'd'` and `1 day` are not comparable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Quantity {
    value: Decimal,
    unit: String,
}

impl Quantity {
    pub fn new(value: Decimal, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Parses a quantity literal: a number followed by a calendar keyword or
    /// a quoted UCUM code, e.g. `4 days` or `5.5 'mg'`. A bare number gets
    /// the default unit `'1'`.
    pub fn parse(literal: &str) -> Result<Self, EvaluationError> {
        let literal = literal.trim();
        let (number, unit) = match literal.split_once(char::is_whitespace) {
            Some((number, unit)) => (number, unit.trim()),
            None => (literal, "'1'"),
        };
        let value = decimal::parse(number)?;
        let unit = if let Some(quoted) = unit.strip_prefix('\'').and_then(|u| u.strip_suffix('\'')) {
            if quoted.is_empty() {
                return Err(EvaluationError::InvalidLiteral(format!(
                    "empty unit in quantity '{}'",
                    literal
                )));
            }
            quoted.to_string()
        } else if CALENDAR_KEYWORDS.contains(&unit) {
            unit.to_string()
        } else {
            return Err(EvaluationError::InvalidLiteral(format!(
                "'{}' is not a calendar keyword or quoted UCUM unit",
                unit
            )));
        };
        Ok(Self { value, unit })
    }

    fn check_unit(&self, other: &Quantity) -> Result<(), EvaluationError> {
        if self.unit == other.unit {
            Ok(())
        } else {
            Err(EvaluationError::MismatchedUnit(format!(
                "'{}' and '{}'",
                self.unit, other.unit
            )))
        }
    }

    /// Equality is indeterminate when the units differ.
    pub fn try_equal(&self, other: &Quantity) -> Equality {
        if self.unit != other.unit {
            return Equality::Indeterminate;
        }
        Equality::from_bool(self.value == other.value)
    }

    pub fn less(&self, other: &Quantity) -> Result<bool, EvaluationError> {
        self.check_unit(other)?;
        Ok(self.value.cmp(&other.value) == Ordering::Less)
    }

    pub fn add(&self, other: &Quantity) -> Result<Quantity, EvaluationError> {
        self.check_unit(other)?;
        Ok(Quantity::new(decimal::add(self.value, other.value)?, self.unit.clone()))
    }

    pub fn sub(&self, other: &Quantity) -> Result<Quantity, EvaluationError> {
        self.check_unit(other)?;
        Ok(Quantity::new(decimal::sub(self.value, other.value)?, self.unit.clone()))
    }

    pub fn negate(&self) -> Quantity {
        Quantity::new(-self.value, self.unit.clone())
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if CALENDAR_KEYWORDS.contains(&self.unit.as_str()) {
            write!(f, "{} {}", self.value, self.unit)
        } else {
            write!(f, "{} '{}'", self.value, self.unit)
        }
    }
}
