//! UCUM integration module for FHIRPath
//!
//! This module provides integration with the octofhir-ucum crate for the
//! UCUM (Unified Code for Units of Measure) checks `toQuantity()` and
//! `convertsToQuantity()` need: unit validation and value conversion between
//! units of the same dimension.

use std::str::FromStr;

use atrius_fhirpath_support::EvaluationError;
use octofhir_ucum::fhir::{FhirQuantity, convert_quantity};
use octofhir_ucum::validate;
use rust_decimal::Decimal;

/// Validates whether a string is a valid UCUM unit expression or a FHIRPath
/// calendar duration keyword.
pub fn validate_unit(unit: &str) -> bool {
    if unit == "1" || is_time_unit(unit) {
        return true;
    }
    validate(unit).is_ok()
}

/// Converts a value from one unit to another.
///
/// Calendar keywords are mapped to their UCUM codes first, so `1 week` can be
/// expressed in `'d'`. Fails with `MismatchedUnit` when the units have
/// different dimensions or are not valid UCUM.
pub fn convert_units(value: Decimal, from_unit: &str, to_unit: &str) -> Result<Decimal, EvaluationError> {
    let ucum_from = calendar_to_ucum_unit(from_unit);
    let ucum_to = calendar_to_ucum_unit(to_unit);
    if ucum_from == ucum_to {
        return Ok(value);
    }

    let value_f64 = f64::from_str(&value.to_string()).map_err(|e| {
        EvaluationError::DecimalOverflow(format!("{} cannot be converted: {}", value, e))
    })?;
    let source_quantity = FhirQuantity::with_ucum_code(value_f64, &ucum_from);

    match convert_quantity(&source_quantity, &ucum_to) {
        Ok(converted) => {
            // Conversion factors are floating point; cut the noise below 1e-10.
            let rounded_value = (converted.value * 1e10).round() / 1e10;
            Decimal::try_from(rounded_value)
                .or_else(|_| Decimal::from_str(&format!("{:.10}", rounded_value)))
                .map(|d| d.normalize())
                .map_err(|e| {
                    EvaluationError::DecimalOverflow(format!(
                        "{} '{}' in '{}': {}",
                        value, from_unit, to_unit, e
                    ))
                })
        }
        Err(e) => Err(EvaluationError::MismatchedUnit(format!(
            "cannot convert '{}' to '{}': {}",
            from_unit, to_unit, e
        ))),
    }
}

/// Maps calendar duration units to their UCUM equivalents
pub fn calendar_to_ucum_unit(unit: &str) -> String {
    match unit {
        "year" | "years" => "a".to_string(),
        "month" | "months" => "mo".to_string(),
        "week" | "weeks" => "wk".to_string(),
        "day" | "days" => "d".to_string(),
        "hour" | "hours" => "h".to_string(),
        "minute" | "minutes" => "min".to_string(),
        "second" | "seconds" => "s".to_string(),
        "millisecond" | "milliseconds" => "ms".to_string(),
        _ => unit.to_string(),
    }
}

/// Checks if a unit is a time duration unit
pub fn is_time_unit(unit: &str) -> bool {
    matches!(
        unit,
        "a" | "mo"
            | "wk"
            | "d"
            | "h"
            | "min"
            | "s"
            | "ms"
            | "year"
            | "years"
            | "month"
            | "months"
            | "week"
            | "weeks"
            | "day"
            | "days"
            | "hour"
            | "hours"
            | "minute"
            | "minutes"
            | "second"
            | "seconds"
            | "millisecond"
            | "milliseconds"
    )
}
