use std::fmt;

use chrono::{NaiveTime, TimeDelta, Timelike};

use crate::evaluation_error::EvaluationError;
use crate::system::temporal::{
    compare_components, duration_nanos, parse_digits, parse_fraction, render_fraction,
    round_to_step, temporal_amount, ComponentOrdering, NANOS_PER_HOUR, NANOS_PER_MINUTE,
    NANOS_PER_SECOND,
};
use crate::system::{Equality, Quantity};

/// Precision levels for Time values. Fractional seconds belong to the
/// `Second` precision; their digit count is tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimePrecision {
    /// `hh`
    Hour,
    /// `hh:mm`
    Minute,
    /// `hh:mm:ss[.fff]`
    Second,
}

/// A time of day with partial precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Time {
    time: NaiveTime,
    precision: TimePrecision,
    fraction_digits: u8,
}

pub(crate) fn truncate_time(time: NaiveTime, precision: TimePrecision, fraction_digits: u8) -> NaiveTime {
    let truncated = match precision {
        TimePrecision::Hour => NaiveTime::from_hms_opt(time.hour(), 0, 0),
        TimePrecision::Minute => NaiveTime::from_hms_opt(time.hour(), time.minute(), 0),
        TimePrecision::Second => {
            let step = fraction_step(fraction_digits) as u32;
            NaiveTime::from_hms_nano_opt(
                time.hour(),
                time.minute(),
                time.second(),
                time.nanosecond() / step * step,
            )
        }
    };
    truncated.unwrap_or(time)
}

/// Nanoseconds represented by the last written fractional digit.
pub(crate) fn fraction_step(fraction_digits: u8) -> i64 {
    10i64.pow(9 - u32::from(fraction_digits.min(9)))
}

/// Parses `hh[:mm[:ss[.fffffffff]]]`.
pub(crate) fn parse_time_part(s: &str) -> Option<(NaiveTime, TimePrecision, u8)> {
    let (hms, fraction) = match s.split_once('.') {
        Some((hms, fraction)) => (hms, Some(parse_fraction(fraction)?)),
        None => (s, None),
    };
    let mut parts = hms.split(':');
    let hour = parse_digits(parts.next()?, 2)?;
    let minute = match parts.next() {
        Some(m) => Some(parse_digits(m, 2)?),
        None => None,
    };
    let second = match parts.next() {
        Some(sec) => Some(parse_digits(sec, 2)?),
        None => None,
    };
    if parts.next().is_some() || (fraction.is_some() && second.is_none()) {
        return None;
    }
    let precision = match (minute, second) {
        (None, _) => TimePrecision::Hour,
        (Some(_), None) => TimePrecision::Minute,
        (Some(_), Some(_)) => TimePrecision::Second,
    };
    let (nanos, digits) = fraction.unwrap_or((0, 0));
    let time = NaiveTime::from_hms_nano_opt(hour, minute.unwrap_or(0), second.unwrap_or(0), nanos)?;
    Some((time, precision, digits))
}

pub(crate) fn render_time_part(
    f: &mut fmt::Formatter<'_>,
    time: NaiveTime,
    precision: TimePrecision,
    fraction_digits: u8,
) -> fmt::Result {
    write!(f, "{:02}", time.hour())?;
    if precision >= TimePrecision::Minute {
        write!(f, ":{:02}", time.minute())?;
    }
    if precision >= TimePrecision::Second {
        write!(
            f,
            ":{:02}{}",
            time.second(),
            render_fraction(time.nanosecond(), fraction_digits)
        )?;
    }
    Ok(())
}

/// Time components used for comparison: seconds and their fraction form a
/// single component.
pub(crate) fn time_components(time: NaiveTime, precision: TimePrecision) -> Vec<i64> {
    let mut components = vec![time.hour() as i64];
    if precision >= TimePrecision::Minute {
        components.push(time.minute() as i64);
    }
    if precision >= TimePrecision::Second {
        components.push(time.second() as i64 * NANOS_PER_SECOND + time.nanosecond() as i64);
    }
    components
}

impl Time {
    pub fn new(time: NaiveTime, precision: TimePrecision, fraction_digits: u8) -> Self {
        let fraction_digits = match precision {
            TimePrecision::Second => fraction_digits.min(9),
            _ => 0,
        };
        Self {
            time: truncate_time(time, precision, fraction_digits),
            precision,
            fraction_digits,
        }
    }

    /// A millisecond-precision time, as produced by `timeOfDay()`.
    pub fn from_naive(time: NaiveTime) -> Self {
        Self::new(time, TimePrecision::Second, 3)
    }

    /// Parses a time literal, with or without the leading `@T`.
    pub fn parse(literal: &str) -> Result<Self, EvaluationError> {
        let s = literal.strip_prefix('@').unwrap_or(literal);
        let s = s.strip_prefix('T').unwrap_or(s);
        parse_time_part(s)
            .map(|(time, precision, fraction_digits)| Self {
                time,
                precision,
                fraction_digits,
            })
            .ok_or_else(|| EvaluationError::InvalidLiteral(format!("'{}' is not a time", literal)))
    }

    pub fn precision(&self) -> TimePrecision {
        self.precision
    }

    pub fn fraction_digits(&self) -> u8 {
        self.fraction_digits
    }

    pub fn naive(&self) -> NaiveTime {
        self.time
    }

    pub fn try_equal(&self, other: &Time) -> Equality {
        match compare_components(
            &time_components(self.time, self.precision),
            &time_components(other.time, other.precision),
        ) {
            ComponentOrdering::Ordered(ordering) => Equality::from_bool(ordering.is_eq()),
            ComponentOrdering::Indeterminate => Equality::Indeterminate,
        }
    }

    pub fn less(&self, other: &Time) -> Result<bool, EvaluationError> {
        match compare_components(
            &time_components(self.time, self.precision),
            &time_components(other.time, other.precision),
        ) {
            ComponentOrdering::Ordered(ordering) => Ok(ordering.is_lt()),
            ComponentOrdering::Indeterminate => Err(EvaluationError::MismatchedPrecision(format!(
                "{} and {}",
                self, other
            ))),
        }
    }

    fn step(&self) -> i64 {
        match self.precision {
            TimePrecision::Hour => NANOS_PER_HOUR,
            TimePrecision::Minute => NANOS_PER_MINUTE,
            TimePrecision::Second => fraction_step(self.fraction_digits),
        }
    }

    /// Adds a duration of hours, minutes, seconds or milliseconds, wrapping
    /// around midnight. The duration is first rounded toward zero to this
    /// time's precision.
    pub fn add(&self, quantity: &Quantity) -> Result<Time, EvaluationError> {
        let (unit, value) = temporal_amount(quantity)?;
        if unit.is_calendar() {
            return Err(EvaluationError::MismatchedUnit(format!(
                "cannot add '{}' to a time",
                quantity.unit()
            )));
        }
        let nanos = round_to_step(duration_nanos(unit, value)?, self.step());
        let (time, _) = self.time.overflowing_add_signed(TimeDelta::nanoseconds(nanos));
        Ok(Time::new(time, self.precision, self.fraction_digits))
    }

    pub fn sub(&self, quantity: &Quantity) -> Result<Time, EvaluationError> {
        self.add(&quantity.negate())
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render_time_part(f, self.time, self.precision, self.fraction_digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn time(s: &str) -> Time {
        Time::parse(s).unwrap()
    }

    fn qty(value: i64, unit: &str) -> Quantity {
        Quantity::new(Decimal::from(value), unit)
    }

    #[test]
    fn test_parse_and_render() {
        for literal in ["14", "14:30", "14:30:15", "14:30:15.250"] {
            assert_eq!(time(literal).to_string(), literal);
        }
        assert_eq!(time("@T08:00").precision(), TimePrecision::Minute);
        assert!(Time::parse("24:00").is_err());
        assert!(Time::parse("10:00.5").is_err());
    }

    #[test]
    fn test_seconds_and_fraction_share_a_precision() {
        assert_eq!(time("10:00:00").try_equal(&time("10:00:00.000")), Equality::Equal);
        assert_eq!(time("10:00").try_equal(&time("10:00:00")), Equality::Indeterminate);
        assert_eq!(time("10:01").try_equal(&time("10:00:00")), Equality::NotEqual);
    }

    #[test]
    fn test_less() {
        assert!(time("09:59:59").less(&time("10:00:00")).unwrap());
        assert!(time("09").less(&time("10:30")).unwrap());
        assert!(time("10").less(&time("10:30")).is_err());
    }

    #[test]
    fn test_add_rounds_to_precision() {
        assert_eq!(time("10").add(&qty(59, "minutes")).unwrap(), time("10"));
        assert_eq!(time("10:00").add(&qty(90, "s")).unwrap(), time("10:01"));
        assert_eq!(time("10:00:00.000").add(&qty(1500, "ms")).unwrap(), time("10:00:01.500"));
    }

    #[test]
    fn test_add_wraps_midnight() {
        assert_eq!(time("23:30").add(&qty(45, "min")).unwrap(), time("00:15"));
        assert_eq!(time("00:15").sub(&qty(30, "minutes")).unwrap(), time("23:45"));
    }

    #[test]
    fn test_calendar_units_rejected() {
        assert!(matches!(
            time("10:00").add(&qty(1, "day")),
            Err(EvaluationError::MismatchedUnit(_))
        ));
    }
}
