//! Numeric normalization for constraint evaluation
//!
//! Numeric comparisons happen in a single decimal domain so that bounds,
//! `multipleOf` and enum membership behave the same regardless of the native
//! width or signedness of the value. `7.5` against `multipleOf:2.5` is
//! exact, with no epsilon tolerance. Finite floats beyond the decimal range
//! fall back to comparing in `f64`.

use std::cmp::Ordering;
use std::str::FromStr;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::types::Value;

/// A numeric value normalized for constraint evaluation.
///
/// Integers and in-range floats live in the exact decimal domain. A finite
/// float whose magnitude exceeds the decimal range (about `7.9e28`) has no
/// decimal representation; it compares in `f64` instead, which keeps the
/// ordering correct at a precision the value never exceeded anyway.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Exact(Decimal),
    Wide(f64),
}

/// Normalize a scalar numeric value.
///
/// Returns `None` for non-numeric values and for floats with no finite value
/// at all (NaN, infinities).
pub fn numeric_of(value: &Value) -> Option<Numeric> {
    match value {
        Value::Int(i) => Some(Numeric::Exact(Decimal::from(*i))),
        Value::Uint(u) => Some(Numeric::Exact(Decimal::from(*u))),
        Value::Float(f) if f.is_finite() => Some(match Decimal::from_f64(*f) {
            Some(d) => Numeric::Exact(d),
            None => Numeric::Wide(*f),
        }),
        _ => None,
    }
}

impl Numeric {
    /// Canonical string form: trailing zeros stripped, so `5.0` prints as
    /// `5`. Wide values print in plain positional notation.
    pub fn canonical(&self) -> String {
        match self {
            Self::Exact(d) => canonical(d),
            Self::Wide(f) => f.to_string(),
        }
    }

    /// Ordering of this value against a constraint bound.
    pub fn cmp_bound(&self, bound: &Decimal) -> Ordering {
        match self {
            Self::Exact(d) => d.cmp(bound),
            // Both sides are finite, so total_cmp agrees with the numeric
            // order.
            Self::Wide(f) => f.total_cmp(&bound.to_f64().unwrap_or_default()),
        }
    }

    /// Multiple test against a constraint divisor: exact in the decimal
    /// domain, modulo in `f64` for wide values. A zero divisor never
    /// matches.
    pub fn is_multiple_of(&self, divisor: &Decimal) -> bool {
        match self {
            Self::Exact(d) => is_multiple_of(d, divisor),
            Self::Wide(f) => {
                let d = divisor.to_f64().unwrap_or_default();
                d != 0.0 && f % d == 0.0
            }
        }
    }
}

/// Parse a decimal literal from a constraint tag.
///
/// Plain decimal notation is tried first; scientific notation (`1e3`) is
/// accepted as a fallback.
pub fn parse_decimal(text: &str) -> Result<Decimal, rust_decimal::Error> {
    Decimal::from_str(text).or_else(|_| Decimal::from_scientific(text))
}

/// Canonical string form of a decimal: trailing zeros stripped, so `5.0` and
/// `5` compare and print identically.
pub fn canonical(num: &Decimal) -> String {
    num.normalize().to_string()
}

/// Exact multiple test: true iff `value / divisor` is an integer.
///
/// A zero divisor never matches.
pub fn is_multiple_of(value: &Decimal, divisor: &Decimal) -> bool {
    if divisor.is_zero() {
        return false;
    }
    match value.checked_rem(*divisor) {
        Some(rem) => rem.is_zero(),
        None => false,
    }
}
