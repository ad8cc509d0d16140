use std::fmt;

use chrono::{Datelike, FixedOffset, NaiveDateTime, NaiveTime, TimeDelta};

use crate::evaluation_error::EvaluationError;
use crate::system::date::{parse_date_part, render_date_part, truncate_date};
use crate::system::temporal::{
    add_calendar, add_months, compare_components, duration_nanos, parse_digits, round_to_step,
    temporal_amount, whole_amount, whole_coarse_units, ComponentOrdering, CoarseUnit, NANOS_PER_DAY, NANOS_PER_HOUR,
    NANOS_PER_MINUTE,
};
use crate::system::time::{
    fraction_step, parse_time_part, render_time_part, time_components, truncate_time,
};
use crate::system::{Date, DatePrecision, Equality, Quantity, Time, TimePrecision};

/// Precision levels for DateTime values, from the year down to seconds
/// (with an optional fraction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DateTimePrecision {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl DateTimePrecision {
    fn date_precision(self) -> DatePrecision {
        match self {
            DateTimePrecision::Year => DatePrecision::Year,
            DateTimePrecision::Month => DatePrecision::Month,
            _ => DatePrecision::Day,
        }
    }

    fn time_precision(self) -> Option<TimePrecision> {
        match self {
            DateTimePrecision::Hour => Some(TimePrecision::Hour),
            DateTimePrecision::Minute => Some(TimePrecision::Minute),
            DateTimePrecision::Second => Some(TimePrecision::Second),
            _ => None,
        }
    }
}

impl From<DatePrecision> for DateTimePrecision {
    fn from(precision: DatePrecision) -> Self {
        match precision {
            DatePrecision::Year => DateTimePrecision::Year,
            DatePrecision::Month => DateTimePrecision::Month,
            DatePrecision::Day => DateTimePrecision::Day,
        }
    }
}

impl From<TimePrecision> for DateTimePrecision {
    fn from(precision: TimePrecision) -> Self {
        match precision {
            TimePrecision::Hour => DateTimePrecision::Hour,
            TimePrecision::Minute => DateTimePrecision::Minute,
            TimePrecision::Second => DateTimePrecision::Second,
        }
    }
}

/// A date and time with partial precision and an optional UTC offset.
///
/// The offset is only meaningful once the value reaches hour precision.
/// Values at hour precision or finer are compared on the UTC timeline, with a
/// missing offset read as UTC; coarser values compare their local calendar
/// components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateTime {
    value: NaiveDateTime,
    offset: Option<FixedOffset>,
    precision: DateTimePrecision,
    fraction_digits: u8,
}

fn truncate(value: NaiveDateTime, precision: DateTimePrecision, fraction_digits: u8) -> NaiveDateTime {
    let date = truncate_date(value.date(), precision.date_precision());
    let time = match precision.time_precision() {
        Some(time_precision) => truncate_time(value.time(), time_precision, fraction_digits),
        None => NaiveTime::MIN,
    };
    date.and_time(time)
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    if s == "Z" {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':')?;
    let hours = parse_digits(hours, 2)? as i32;
    let minutes = parse_digits(minutes, 2)? as i32;
    if hours > 14 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

impl DateTime {
    pub fn new(
        value: NaiveDateTime,
        offset: Option<FixedOffset>,
        precision: DateTimePrecision,
        fraction_digits: u8,
    ) -> Self {
        let fraction_digits = match precision {
            DateTimePrecision::Second => fraction_digits.min(9),
            _ => 0,
        };
        let offset = precision.time_precision().and(offset);
        Self {
            value: truncate(value, precision, fraction_digits),
            offset,
            precision,
            fraction_digits,
        }
    }

    /// A millisecond-precision instant, as produced by `now()`.
    pub fn from_chrono(instant: chrono::DateTime<FixedOffset>) -> Self {
        Self::new(
            instant.naive_local(),
            Some(*instant.offset()),
            DateTimePrecision::Second,
            3,
        )
    }

    /// Widens a date, keeping its precision.
    pub fn from_date(date: &Date) -> Self {
        Self::new(
            date.naive().and_time(NaiveTime::MIN),
            None,
            date.precision().into(),
            0,
        )
    }

    /// Parses a date-time literal: a date, an optional `T`, an optional time
    /// and, after a time, an optional `Z` or `+hh:mm`/`-hh:mm` offset.
    pub fn parse(literal: &str) -> Result<Self, EvaluationError> {
        Self::parse_inner(literal.strip_prefix('@').unwrap_or(literal)).ok_or_else(|| {
            EvaluationError::InvalidLiteral(format!("'{}' is not a date-time", literal))
        })
    }

    fn parse_inner(s: &str) -> Option<Self> {
        let (date_part, time_part) = match s.split_once('T') {
            Some((date_part, time_part)) => (date_part, Some(time_part)),
            None => (s, None),
        };
        let (date, date_precision) = parse_date_part(date_part)?;
        let time_part = time_part.filter(|t| !t.is_empty());
        let Some(time_part) = time_part else {
            return Some(Self::new(date.and_time(NaiveTime::MIN), None, date_precision.into(), 0));
        };
        if date_precision != DatePrecision::Day {
            return None;
        }
        let split = time_part.find(['Z', '+', '-']).unwrap_or(time_part.len());
        let (clock, zone) = time_part.split_at(split);
        let (time, time_precision, fraction_digits) = parse_time_part(clock)?;
        let offset = if zone.is_empty() {
            None
        } else {
            Some(parse_offset(zone)?)
        };
        Some(Self {
            value: date.and_time(time),
            offset,
            precision: time_precision.into(),
            fraction_digits,
        })
    }

    pub fn precision(&self) -> DateTimePrecision {
        self.precision
    }

    pub fn offset(&self) -> Option<FixedOffset> {
        self.offset
    }

    pub fn naive(&self) -> NaiveDateTime {
        self.value
    }

    /// The date part, at most day precision.
    pub fn date(&self) -> Date {
        Date::new(self.value.date(), self.precision.date_precision())
    }

    /// The time part, when the value has one.
    pub fn time(&self) -> Option<Time> {
        self.precision
            .time_precision()
            .map(|precision| Time::new(self.value.time(), precision, self.fraction_digits))
    }

    fn utc(&self) -> NaiveDateTime {
        match self.offset {
            Some(offset) => self
                .value
                .checked_sub_signed(TimeDelta::seconds(offset.local_minus_utc() as i64))
                .unwrap_or(self.value),
            None => self.value,
        }
    }

    fn components(&self, on_utc: bool) -> Vec<i64> {
        let value = if on_utc { self.utc() } else { self.value };
        let mut components = vec![value.year() as i64];
        if self.precision >= DateTimePrecision::Month {
            components.push(value.month() as i64);
        }
        if self.precision >= DateTimePrecision::Day {
            components.push(value.day() as i64);
        }
        if let Some(time_precision) = self.precision.time_precision() {
            components.extend(time_components(value.time(), time_precision));
        }
        components
    }

    fn compare(&self, other: &DateTime) -> ComponentOrdering {
        let on_utc = self.precision >= DateTimePrecision::Hour
            && other.precision >= DateTimePrecision::Hour;
        compare_components(&self.components(on_utc), &other.components(on_utc))
    }

    pub fn try_equal(&self, other: &DateTime) -> Equality {
        match self.compare(other) {
            ComponentOrdering::Ordered(ordering) => Equality::from_bool(ordering.is_eq()),
            ComponentOrdering::Indeterminate => Equality::Indeterminate,
        }
    }

    pub fn less(&self, other: &DateTime) -> Result<bool, EvaluationError> {
        match self.compare(other) {
            ComponentOrdering::Ordered(ordering) => Ok(ordering.is_lt()),
            ComponentOrdering::Indeterminate => Err(EvaluationError::MismatchedPrecision(format!(
                "{} and {}",
                self, other
            ))),
        }
    }

    fn step(&self) -> i64 {
        match self.precision {
            DateTimePrecision::Year | DateTimePrecision::Month | DateTimePrecision::Day => {
                NANOS_PER_DAY
            }
            DateTimePrecision::Hour => NANOS_PER_HOUR,
            DateTimePrecision::Minute => NANOS_PER_MINUTE,
            DateTimePrecision::Second => fraction_step(self.fraction_digits),
        }
    }

    fn with_value(&self, value: NaiveDateTime) -> DateTime {
        DateTime::new(value, self.offset, self.precision, self.fraction_digits)
    }

    /// Adds a calendar or duration quantity. Durations are rounded toward
    /// zero to this value's precision; the result keeps the precision.
    pub fn add(&self, quantity: &Quantity) -> Result<DateTime, EvaluationError> {
        let (unit, value) = temporal_amount(quantity)?;
        let shifted = if unit.is_calendar() {
            add_calendar(self.value.date(), unit, whole_amount(value)?)?.and_time(self.value.time())
        } else {
            let nanos = round_to_step(duration_nanos(unit, value)?, self.step());
            self.value
                .checked_add_signed(TimeDelta::nanoseconds(nanos))
                .ok_or_else(|| {
                    EvaluationError::IntOverflow(format!("{} + {} is out of range", self, quantity))
                })?
        };
        Ok(self.with_value(shifted))
    }

    /// Subtracts a quantity. At year or month precision the quantity is first
    /// reduced to whole years or months.
    pub fn sub(&self, quantity: &Quantity) -> Result<DateTime, EvaluationError> {
        let target = match self.precision {
            DateTimePrecision::Year => CoarseUnit::Years,
            DateTimePrecision::Month => CoarseUnit::Months,
            _ => return self.add(&quantity.negate()),
        };
        let (unit, value) = temporal_amount(quantity)?;
        let amount = whole_coarse_units(unit, whole_amount(value)?, target);
        let months = match target {
            CoarseUnit::Years => amount.saturating_mul(12),
            CoarseUnit::Months => amount,
        };
        let date = add_months(self.value.date(), -months)?;
        Ok(self.with_value(date.and_time(self.value.time())))
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render_date_part(f, self.value.date(), self.precision.date_precision())?;
        let Some(time_precision) = self.precision.time_precision() else {
            return Ok(());
        };
        f.write_str("T")?;
        render_time_part(f, self.value.time(), time_precision, self.fraction_digits)?;
        match self.offset {
            Some(offset) if offset.local_minus_utc() == 0 => f.write_str("Z"),
            Some(offset) => {
                let seconds = offset.local_minus_utc();
                let sign = if seconds < 0 { '-' } else { '+' };
                let seconds = seconds.abs();
                write!(f, "{}{:02}:{:02}", sign, seconds / 3600, seconds % 3600 / 60)
            }
            None => Ok(()),
        }
    }
}
