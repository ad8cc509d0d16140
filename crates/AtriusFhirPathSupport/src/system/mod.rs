//! The FHIRPath System types.
//!
//! Each primitive kind lives in its own module with its equality, ordering,
//! arithmetic and literal form; [`Any`] ties them together as the single
//! value type the evaluator computes with.

mod any;
mod date;
mod date_time;
pub mod decimal;
pub mod integer;
mod quantity;
pub mod string;
pub mod temporal;
mod time;

pub use any::{Any, FromSystem};
pub use date::{Date, DatePrecision};
pub use date_time::{DateTime, DateTimePrecision};
pub use quantity::Quantity;
pub use temporal::TemporalUnit;
pub use time::{Time, TimePrecision};

/// Result of a FHIRPath equality test.
///
/// Equality is three-valued: values of different precision (or quantities in
/// different units) may be neither equal nor unequal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Equality {
    Equal,
    NotEqual,
    Indeterminate,
}

impl Equality {
    pub fn from_bool(equal: bool) -> Self {
        if equal {
            Equality::Equal
        } else {
            Equality::NotEqual
        }
    }

    /// The `!=` view of this result; indeterminate stays indeterminate.
    pub fn negate(self) -> Self {
        match self {
            Equality::Equal => Equality::NotEqual,
            Equality::NotEqual => Equality::Equal,
            Equality::Indeterminate => Equality::Indeterminate,
        }
    }

    /// `Some(true)` for equal, `Some(false)` for not equal, `None` otherwise.
    pub fn to_option(self) -> Option<bool> {
        match self {
            Equality::Equal => Some(true),
            Equality::NotEqual => Some(false),
            Equality::Indeterminate => None,
        }
    }
}
