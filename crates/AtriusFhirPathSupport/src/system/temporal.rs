//! Shared helpers for the precision-aware temporal types.
//!
//! Date, Time and DateTime all compare by walking their components from the
//! most significant one down to the lesser of the two precisions, and all of
//! them apply quantities through the unit table defined here.

use std::cmp::Ordering;

use chrono::{Months, NaiveDate, TimeDelta};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::evaluation_error::EvaluationError;
use crate::system::Quantity;

pub(crate) const NANOS_PER_MILLISECOND: i64 = 1_000_000;
pub(crate) const NANOS_PER_SECOND: i64 = 1_000_000_000;
pub(crate) const NANOS_PER_MINUTE: i64 = 60 * NANOS_PER_SECOND;
pub(crate) const NANOS_PER_HOUR: i64 = 60 * NANOS_PER_MINUTE;
pub(crate) const NANOS_PER_DAY: i64 = 24 * NANOS_PER_HOUR;

/// Outcome of a component-by-component comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ComponentOrdering {
    /// A difference was found, or both values share the same precision.
    Ordered(Ordering),
    /// All shared components agree but the precisions differ.
    Indeterminate,
}

/// Compares two component lists, each already truncated to its own precision.
pub(crate) fn compare_components(lhs: &[i64], rhs: &[i64]) -> ComponentOrdering {
    for (l, r) in lhs.iter().zip(rhs.iter()) {
        if l != r {
            return ComponentOrdering::Ordered(l.cmp(r));
        }
    }
    if lhs.len() == rhs.len() {
        ComponentOrdering::Ordered(Ordering::Equal)
    } else {
        ComponentOrdering::Indeterminate
    }
}

/// Units accepted when adding a quantity to a temporal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TemporalUnit {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
}

impl TemporalUnit {
    /// Resolves a calendar keyword (`year`, `months`, ...) or a definite
    /// UCUM duration code (`wk`, `d`, `h`, `min`, `s`, `ms`).
    ///
    /// UCUM `a` and `mo` are deliberately absent: they are not calendar
    /// durations.
    pub fn parse(unit: &str) -> Option<Self> {
        let unit = match unit {
            "year" | "years" => TemporalUnit::Year,
            "month" | "months" => TemporalUnit::Month,
            "week" | "weeks" | "wk" => TemporalUnit::Week,
            "day" | "days" | "d" => TemporalUnit::Day,
            "hour" | "hours" | "h" => TemporalUnit::Hour,
            "minute" | "minutes" | "min" => TemporalUnit::Minute,
            "second" | "seconds" | "s" => TemporalUnit::Second,
            "millisecond" | "milliseconds" | "ms" => TemporalUnit::Millisecond,
            _ => return None,
        };
        Some(unit)
    }

    /// True for the units that are whole days or longer.
    pub fn is_calendar(self) -> bool {
        matches!(
            self,
            TemporalUnit::Year | TemporalUnit::Month | TemporalUnit::Week | TemporalUnit::Day
        )
    }

    /// Length of a definite duration unit in nanoseconds. Years and months
    /// have no fixed length.
    pub(crate) fn nanos(self) -> Option<i64> {
        match self {
            TemporalUnit::Year | TemporalUnit::Month => None,
            TemporalUnit::Week => Some(7 * NANOS_PER_DAY),
            TemporalUnit::Day => Some(NANOS_PER_DAY),
            TemporalUnit::Hour => Some(NANOS_PER_HOUR),
            TemporalUnit::Minute => Some(NANOS_PER_MINUTE),
            TemporalUnit::Second => Some(NANOS_PER_SECOND),
            TemporalUnit::Millisecond => Some(NANOS_PER_MILLISECOND),
        }
    }
}

/// Calendar keywords that render without quotes in a quantity literal.
pub(crate) const CALENDAR_KEYWORDS: &[&str] = &[
    "year",
    "years",
    "month",
    "months",
    "week",
    "weeks",
    "day",
    "days",
    "hour",
    "hours",
    "minute",
    "minutes",
    "second",
    "seconds",
    "millisecond",
    "milliseconds",
];

/// Splits a quantity into a temporal unit and its magnitude.
pub(crate) fn temporal_amount(quantity: &Quantity) -> Result<(TemporalUnit, Decimal), EvaluationError> {
    let unit = TemporalUnit::parse(quantity.unit()).ok_or_else(|| {
        EvaluationError::MismatchedUnit(format!(
            "'{}' is not a temporal unit",
            quantity.unit()
        ))
    })?;
    Ok((unit, quantity.value()))
}

/// Truncates a quantity magnitude toward zero to a whole count of units.
pub(crate) fn whole_amount(value: Decimal) -> Result<i64, EvaluationError> {
    value
        .trunc()
        .to_i64()
        .ok_or_else(|| EvaluationError::IntOverflow(format!("{} is out of range", value)))
}

/// Converts a definite duration to nanoseconds, truncating toward zero.
pub(crate) fn duration_nanos(unit: TemporalUnit, value: Decimal) -> Result<i64, EvaluationError> {
    let per_unit = unit.nanos().ok_or_else(|| {
        EvaluationError::MismatchedUnit(format!("{:?} has no fixed duration", unit))
    })?;
    value
        .checked_mul(Decimal::from(per_unit))
        .and_then(|nanos| nanos.trunc().to_i64())
        .ok_or_else(|| EvaluationError::IntOverflow(format!("duration of {} is out of range", value)))
}

/// Rounds a nanosecond duration toward zero to a multiple of `step`.
pub(crate) fn round_to_step(nanos: i64, step: i64) -> i64 {
    (nanos / step) * step
}

fn out_of_range() -> EvaluationError {
    EvaluationError::IntOverflow("date arithmetic out of range".to_string())
}

/// Adds a signed number of months, clamping to the last valid day of the
/// target month (Jan 31 + 1 month = Feb 28/29).
pub(crate) fn add_months(date: NaiveDate, months: i64) -> Result<NaiveDate, EvaluationError> {
    let magnitude = u32::try_from(months.unsigned_abs()).map_err(|_| out_of_range())?;
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(magnitude))
    } else {
        date.checked_sub_months(Months::new(magnitude))
    };
    shifted.ok_or_else(out_of_range)
}

/// Adds a signed number of days.
pub(crate) fn add_days(date: NaiveDate, days: i64) -> Result<NaiveDate, EvaluationError> {
    TimeDelta::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or_else(out_of_range)
}

/// Applies a calendar unit (year, month, week, day) to a date.
pub(crate) fn add_calendar(
    date: NaiveDate,
    unit: TemporalUnit,
    amount: i64,
) -> Result<NaiveDate, EvaluationError> {
    match unit {
        TemporalUnit::Year => add_months(date, amount.checked_mul(12).ok_or_else(out_of_range)?),
        TemporalUnit::Month => add_months(date, amount),
        TemporalUnit::Week => add_days(date, amount.checked_mul(7).ok_or_else(out_of_range)?),
        TemporalUnit::Day => add_days(date, amount),
        other => Err(EvaluationError::MismatchedUnit(format!(
            "{:?} is not a calendar unit",
            other
        ))),
    }
}

/// Target granularity used when subtracting from a year or month precision value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CoarseUnit {
    Years,
    Months,
}

/// Converts an amount of `unit` into whole years or months, rounding toward
/// zero. Sub-day units contribute nothing at this granularity.
pub(crate) fn whole_coarse_units(unit: TemporalUnit, amount: i64, target: CoarseUnit) -> i64 {
    match (target, unit) {
        (CoarseUnit::Years, TemporalUnit::Year) => amount,
        (CoarseUnit::Years, TemporalUnit::Month) => amount / 12,
        (CoarseUnit::Years, TemporalUnit::Week) => amount.saturating_mul(7) / 365,
        (CoarseUnit::Years, TemporalUnit::Day) => amount / 365,
        (CoarseUnit::Months, TemporalUnit::Year) => amount.saturating_mul(12),
        (CoarseUnit::Months, TemporalUnit::Month) => amount,
        (CoarseUnit::Months, TemporalUnit::Week) => amount.saturating_mul(7) / 30,
        (CoarseUnit::Months, TemporalUnit::Day) => amount / 30,
        (_, TemporalUnit::Hour)
        | (_, TemporalUnit::Minute)
        | (_, TemporalUnit::Second)
        | (_, TemporalUnit::Millisecond) => 0,
    }
}

/// Parses exactly `len` ASCII digits.
pub(crate) fn parse_digits(s: &str, len: usize) -> Option<u32> {
    if s.len() != len || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Parses a fractional-seconds suffix (1 to 9 digits) into nanoseconds and
/// the number of digits written.
pub(crate) fn parse_fraction(s: &str) -> Option<(u32, u8)> {
    if s.is_empty() || s.len() > 9 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let digits = s.len() as u8;
    let value: u32 = s.parse().ok()?;
    Some((value * 10u32.pow(9 - digits as u32), digits))
}

/// Renders nanoseconds with the given number of fractional digits.
pub(crate) fn render_fraction(nanos: u32, digits: u8) -> String {
    if digits == 0 {
        return String::new();
    }
    let scaled = nanos / 10u32.pow(9 - digits as u32);
    format!(".{:0width$}", scaled, width = digits as usize)
}
