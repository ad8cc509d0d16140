use std::fmt;

use chrono::{Datelike, NaiveDate};

use crate::evaluation_error::EvaluationError;
use crate::system::temporal::{
    self, add_calendar, add_days, add_months, compare_components, parse_digits, temporal_amount,
    whole_amount, whole_coarse_units, ComponentOrdering, CoarseUnit, NANOS_PER_DAY,
};
use crate::system::{DateTime, Equality, Quantity};

/// Precision levels for Date values.
///
/// A date literal may stop after the year or the month; the missing
/// components are unknown, not zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DatePrecision {
    /// `YYYY`
    Year,
    /// `YYYY-MM`
    Month,
    /// `YYYY-MM-DD`
    Day,
}

/// A calendar date with partial precision.
///
/// The stored `NaiveDate` is always truncated to the precision (missing
/// month and day are 1), so two dates with the same precision compare
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Date {
    date: NaiveDate,
    precision: DatePrecision,
}

pub(crate) fn truncate_date(date: NaiveDate, precision: DatePrecision) -> NaiveDate {
    let date = match precision {
        DatePrecision::Year => date.with_day(1).and_then(|d| d.with_month(1)),
        DatePrecision::Month => date.with_day(1),
        DatePrecision::Day => Some(date),
    };
    // Day 1 of month 1 exists for every representable year.
    date.unwrap_or(NaiveDate::MIN)
}

/// Parses `YYYY[-MM[-DD]]`.
pub(crate) fn parse_date_part(s: &str) -> Option<(NaiveDate, DatePrecision)> {
    let mut parts = s.split('-');
    let year = parse_digits(parts.next()?, 4)? as i32;
    let month = match parts.next() {
        Some(m) => Some(parse_digits(m, 2)?),
        None => None,
    };
    let day = match parts.next() {
        Some(d) => Some(parse_digits(d, 2)?),
        None => None,
    };
    if parts.next().is_some() {
        return None;
    }
    let precision = match (month, day) {
        (None, _) => DatePrecision::Year,
        (Some(_), None) => DatePrecision::Month,
        (Some(_), Some(_)) => DatePrecision::Day,
    };
    let date = NaiveDate::from_ymd_opt(year, month.unwrap_or(1), day.unwrap_or(1))?;
    Some((date, precision))
}

pub(crate) fn render_date_part(
    f: &mut fmt::Formatter<'_>,
    date: NaiveDate,
    precision: DatePrecision,
) -> fmt::Result {
    write!(f, "{:04}", date.year())?;
    if precision >= DatePrecision::Month {
        write!(f, "-{:02}", date.month())?;
    }
    if precision >= DatePrecision::Day {
        write!(f, "-{:02}", date.day())?;
    }
    Ok(())
}

impl Date {
    pub fn new(date: NaiveDate, precision: DatePrecision) -> Self {
        Self {
            date: truncate_date(date, precision),
            precision,
        }
    }

    /// A full-precision date.
    pub fn from_naive(date: NaiveDate) -> Self {
        Self::new(date, DatePrecision::Day)
    }

    /// Parses a date literal, with or without the leading `@`.
    pub fn parse(literal: &str) -> Result<Self, EvaluationError> {
        let s = literal.strip_prefix('@').unwrap_or(literal);
        parse_date_part(s)
            .map(|(date, precision)| Self { date, precision })
            .ok_or_else(|| EvaluationError::InvalidLiteral(format!("'{}' is not a date", literal)))
    }

    pub fn precision(&self) -> DatePrecision {
        self.precision
    }

    pub fn naive(&self) -> NaiveDate {
        self.date
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> Option<u32> {
        (self.precision >= DatePrecision::Month).then(|| self.date.month())
    }

    pub fn day(&self) -> Option<u32> {
        (self.precision >= DatePrecision::Day).then(|| self.date.day())
    }

    fn components(&self) -> Vec<i64> {
        let mut components = vec![self.date.year() as i64];
        if let Some(month) = self.month() {
            components.push(month as i64);
        }
        if let Some(day) = self.day() {
            components.push(day as i64);
        }
        components
    }

    pub fn try_equal(&self, other: &Date) -> Equality {
        match compare_components(&self.components(), &other.components()) {
            ComponentOrdering::Ordered(ordering) => Equality::from_bool(ordering.is_eq()),
            ComponentOrdering::Indeterminate => Equality::Indeterminate,
        }
    }

    pub fn less(&self, other: &Date) -> Result<bool, EvaluationError> {
        match compare_components(&self.components(), &other.components()) {
            ComponentOrdering::Ordered(ordering) => Ok(ordering.is_lt()),
            ComponentOrdering::Indeterminate => Err(EvaluationError::MismatchedPrecision(format!(
                "{} and {}",
                self, other
            ))),
        }
    }

    /// Adds a calendar or duration quantity. Durations shorter than a day are
    /// counted in whole days; the result keeps this date's precision.
    pub fn add(&self, quantity: &Quantity) -> Result<Date, EvaluationError> {
        let (unit, value) = temporal_amount(quantity)?;
        let date = if unit.is_calendar() {
            add_calendar(self.date, unit, whole_amount(value)?)?
        } else {
            let days = temporal::duration_nanos(unit, value)? / NANOS_PER_DAY;
            add_days(self.date, days)?
        };
        Ok(Date::new(date, self.precision))
    }

    /// Subtracts a quantity. At year or month precision the quantity is first
    /// reduced to whole years or months.
    pub fn sub(&self, quantity: &Quantity) -> Result<Date, EvaluationError> {
        let target = match self.precision {
            DatePrecision::Year => CoarseUnit::Years,
            DatePrecision::Month => CoarseUnit::Months,
            DatePrecision::Day => return self.add(&quantity.negate()),
        };
        let (unit, value) = temporal_amount(quantity)?;
        let amount = whole_coarse_units(unit, whole_amount(value)?, target);
        let months = match target {
            CoarseUnit::Years => amount.saturating_mul(12),
            CoarseUnit::Months => amount,
        };
        Ok(Date::new(add_months(self.date, -months)?, self.precision))
    }

    /// Widens to a DateTime with the same precision and no time zone.
    pub fn to_date_time(&self) -> DateTime {
        DateTime::from_date(self)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render_date_part(f, self.date, self.precision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn date(s: &str) -> Date {
        Date::parse(s).unwrap()
    }

    fn qty(value: i64, unit: &str) -> Quantity {
        Quantity::new(Decimal::from(value), unit)
    }

    #[test]
    fn test_parse_and_render() {
        for literal in ["2020", "2020-02", "2020-02-29"] {
            assert_eq!(date(literal).to_string(), literal);
        }
        assert_eq!(date("@2021-03").precision(), DatePrecision::Month);
        assert!(Date::parse("2021-02-30").is_err());
        assert!(Date::parse("21-02").is_err());
        assert!(Date::parse("2021-13").is_err());
    }

    #[test]
    fn test_equality_by_precision() {
        assert_eq!(date("2020-01-01").try_equal(&date("2020-01-01")), Equality::Equal);
        assert_eq!(date("2020-01-01").try_equal(&date("2020-01-02")), Equality::NotEqual);
        assert_eq!(date("2020").try_equal(&date("2020-01")), Equality::Indeterminate);
        assert_eq!(date("2019").try_equal(&date("2020-01")), Equality::NotEqual);
    }

    #[test]
    fn test_less_with_mismatched_precision() {
        assert!(date("2019").less(&date("2020-01")).unwrap());
        assert!(matches!(
            date("2020").less(&date("2020-06")),
            Err(EvaluationError::MismatchedPrecision(_))
        ));
    }

    #[test]
    fn test_month_addition_clamps() {
        assert_eq!(date("2021-01-31").add(&qty(1, "month")).unwrap(), date("2021-02-28"));
        assert_eq!(date("2020-02-29").add(&qty(1, "year")).unwrap(), date("2021-02-28"));
        assert_eq!(date("2020-01-01").add(&qty(2, "wk")).unwrap(), date("2020-01-15"));
    }

    #[test]
    fn test_addition_keeps_precision() {
        assert_eq!(date("2020-01").add(&qty(40, "days")).unwrap(), date("2020-02"));
        assert_eq!(date("2020-01-01").add(&qty(48, "hours")).unwrap(), date("2020-01-03"));
        assert!(date("2020").add(&qty(1, "a")).is_err());
    }

    #[test]
    fn test_coarse_subtraction() {
        assert_eq!(date("2020").sub(&qty(18, "months")).unwrap(), date("2019"));
        assert_eq!(date("2020-03").sub(&qty(65, "days")).unwrap(), date("2020-01"));
        assert_eq!(date("2020-03").sub(&qty(5, "hours")).unwrap(), date("2020-03"));
        assert_eq!(date("2020-03-01").sub(&qty(1, "day")).unwrap(), date("2020-02-29"));
    }
}
