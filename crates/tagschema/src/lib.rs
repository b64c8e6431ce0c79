//! Tagschema
//!
//! JSON-Schema-like validation of in-memory records, driven by constraint
//! tags attached to each field instead of a separate schema document. A tag
//! such as `"maxLength:5,pattern:^[a-z]+$"` is parsed once into a
//! [`ConstraintSet`]; the engine then walks the value's own nested structure
//! (records, mappings, sequences, scalars), evaluates every applicable
//! constraint without short-circuiting, and returns a hierarchical
//! [`Report`].
//!
//! # Example
//!
//! ```rust
//! use tagschema::{Field, Record, Validator, Value};
//!
//! let user = Record::new()
//!     .field(Field::new("name", "alice").tag("minLength:2,pattern:^[a-z]+$"))
//!     .field(Field::new("age", 42i64).tag("minimum:0,maximum:150"))
//!     .field(Field::new("mail", "alice@example.com").tag("format:email"));
//!
//! let validator = Validator::new();
//! let report = validator.validate(&Value::Record(user)).unwrap();
//! assert!(report.passed());
//! ```
//!
//! Violations are data, not errors: a failed constraint still returns
//! `Ok(report)` with `report.passed() == false` and one node per violation.
//! Hard `Err`s are reserved for malformed tags, non-record input and
//! registry misuse.

// Public modules
pub mod errors;
pub mod formats;
pub mod number;
pub mod tag;
pub mod types;
pub mod validators;

// Internal byte cursor for the tag parser
mod reader;

// Re-export commonly used types
pub use errors::{Error, Report, ViolationKind};
pub use tag::{ConstraintSet, TagSyntaxError};
pub use types::{Field, Record, Value};
pub use validators::{FormatFn, Validator, MAX_DEPTH};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
