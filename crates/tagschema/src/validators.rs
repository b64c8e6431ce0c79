//! Recursive validation engine
//!
//! The engine walks a [`Value`] by shape. Record fields carry the constraint
//! tag that applies to their value; mappings and sequences are checked
//! against the mapping/sequence constraints of the tag and then recursed
//! into; scalars are checked against the string and numeric constraints.
//! Every applicable constraint is evaluated and every failure recorded; no
//! check short-circuits and recursion proceeds under failed nodes.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::errors::{Error, Report, ViolationKind};
use crate::formats;
use crate::number;
use crate::tag::ConstraintSet;
use crate::types::{Record, Value};

/// Recursion guard. `Value` is an owned tree, so cycles cannot occur, but
/// nesting deeper than this aborts with [`Error::TooDeep`] instead of
/// exhausting the stack.
pub const MAX_DEPTH: usize = 256;

/// A registered format predicate: success, or a failure reason.
pub type FormatFn = Box<dyn Fn(&str) -> Result<(), String> + Send + Sync>;

/// Validates records against the constraint tags on their fields.
///
/// The only state is the format registry. Registration takes `&mut self` and
/// validation takes `&self`, so a populated validator can be shared freely
/// across threads.
pub struct Validator {
    formats: HashMap<String, FormatFn>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// A validator with the standard formats registered: `date-time`,
    /// `email`, `hostname`, `ipv4`, `ipv6`, `uri`, `uri-reference`,
    /// `uri-template` and `json-pointer`.
    pub fn new() -> Self {
        let mut formats: HashMap<String, FormatFn> = HashMap::new();
        formats.insert("date-time".to_string(), Box::new(formats::date_time));
        formats.insert("email".to_string(), Box::new(formats::email));
        formats.insert("hostname".to_string(), Box::new(formats::hostname));
        formats.insert("ipv4".to_string(), Box::new(formats::ipv4));
        formats.insert("ipv6".to_string(), Box::new(formats::ipv6));
        formats.insert("uri".to_string(), Box::new(formats::uri));
        formats.insert("uri-reference".to_string(), Box::new(formats::uri_reference));
        formats.insert("uri-template".to_string(), Box::new(formats::uri_reference));
        formats.insert("json-pointer".to_string(), Box::new(formats::json_pointer));
        Self { formats }
    }

    /// Register an additional format predicate.
    ///
    /// The registry is append-only: empty names are rejected and the first
    /// registration of a name wins, a second one is an error.
    pub fn register_format<F>(&mut self, name: &str, check: F) -> Result<(), Error>
    where
        F: Fn(&str) -> Result<(), String> + Send + Sync + 'static,
    {
        if name.is_empty() {
            return Err(Error::EmptyFormatName);
        }
        if self.formats.contains_key(name) {
            return Err(Error::DuplicateFormat(name.to_string()));
        }
        self.formats.insert(name.to_string(), Box::new(check));
        Ok(())
    }

    /// Validate a record value.
    ///
    /// Returns `Ok` with a [`Report`] whether or not constraints were
    /// violated; `Report::passed` tells the two apart. Errors are reserved
    /// for malformed annotations, non-record input and excessive nesting.
    pub fn validate(&self, value: &Value) -> Result<Report, Error> {
        let value = value
            .unwrap_optional()
            .ok_or(Error::NotARecord("absent optional"))?;
        match value {
            Value::Record(rec) => {
                tracing::trace!(fields = rec.fields().len(), "validating record");
                self.validate_record(rec, 0)
            }
            other => Err(Error::NotARecord(other.type_name())),
        }
    }

    fn validate_record(&self, rec: &Record, depth: usize) -> Result<Report, Error> {
        if depth > MAX_DEPTH {
            return Err(Error::TooDeep(MAX_DEPTH));
        }
        let mut report = Report::new();
        for field in rec.fields() {
            let raw = field.raw_tag();
            if raw == Some("-") {
                continue;
            }
            // The tag is parsed once per field; a malformed tag is a bug in
            // the data model and aborts the whole validation.
            let set = match raw {
                Some(tag) => ConstraintSet::parse(tag).map_err(|source| {
                    tracing::debug!(field = field.name(), %source, "malformed constraint tag");
                    Error::TagSyntax {
                        field: field.name().to_string(),
                        source,
                    }
                })?,
                None => ConstraintSet::default(),
            };
            tracing::trace!(
                field = field.name(),
                constrained = !set.is_empty(),
                "evaluating field"
            );
            // An absent optional is skipped silently, so `required` cannot
            // be expressed on an absent optional field through tags.
            let Some(value) = field.value().unwrap_optional() else {
                continue;
            };
            let child = self.validate_value(value, field.name(), &set, raw, depth + 1)?;
            report.add(child);
        }
        Ok(report)
    }

    fn validate_value(
        &self,
        value: &Value,
        name: &str,
        set: &ConstraintSet,
        raw: Option<&str>,
        depth: usize,
    ) -> Result<Report, Error> {
        if depth > MAX_DEPTH {
            return Err(Error::TooDeep(MAX_DEPTH));
        }
        let Some(value) = value.unwrap_optional() else {
            return Ok(Report::new());
        };
        match value {
            // A record-typed value re-enters record validation; it inherits
            // no scalar constraints from its own tag.
            Value::Record(rec) => {
                let mut child = self.validate_record(rec, depth + 1)?;
                if !child.passed() {
                    child.name = Some(name.to_string());
                }
                Ok(child)
            }
            Value::Mapping(entries) => self.validate_mapping(entries, name, set, raw, depth),
            Value::Sequence(items) => self.validate_sequence(items, name, set, raw, depth),
            Value::String(s) => Ok(self.validate_string(s, name, set, raw)),
            Value::Int(_) | Value::Uint(_) | Value::Float(_) => {
                Ok(self.validate_number(value, name, set, raw))
            }
            // No constraints apply to bare booleans.
            Value::Bool(_) => Ok(Report::new()),
            Value::Optional(_) => unreachable!("optionals are resolved above"),
        }
    }

    fn validate_mapping(
        &self,
        entries: &[(Value, Value)],
        name: &str,
        set: &ConstraintSet,
        raw: Option<&str>,
        depth: usize,
    ) -> Result<Report, Error> {
        let mut report = Report::new();
        let count = entries.len() as i64;
        if let Some(min) = set.min_properties {
            if count < min {
                report.add(Report::violation(
                    name,
                    ViolationKind::Value,
                    format!("Too few properties defined ({count}), minimum {min}"),
                    raw,
                ));
            }
        }
        if let Some(max) = set.max_properties {
            if count > max {
                report.add(Report::violation(
                    name,
                    ViolationKind::Value,
                    format!("Too many properties defined ({count}), maximum {max}"),
                    raw,
                ));
            }
        }
        if !set.required.is_empty() {
            let any_missing = set.required.iter().any(|req| {
                !entries
                    .iter()
                    .any(|(key, _)| key.canonical_string().as_deref() == Some(req.as_str()))
            });
            // The whole required list is reported once, not one violation
            // per missing key.
            if any_missing {
                report.add(Report::violation(
                    name,
                    ViolationKind::Missing,
                    format!("Missing required property: [{}]", set.required.join(", ")),
                    raw,
                ));
            }
        }
        for (key, value) in entries {
            let key_text = key.canonical_string();
            if let Some(re) = &set.pattern_properties {
                if !re.is_match(key_text.as_deref().unwrap_or_default()) {
                    report.add(Report::violation(
                        name,
                        ViolationKind::Value,
                        format!("Properties does not match pattern: {}", re.as_str()),
                        raw,
                    ));
                }
            }
            // Entries do not inherit the mapping field's constraints; keys
            // and values are validated as unconstrained nested values.
            let label = key_text.unwrap_or_else(|| key.type_name().to_string());
            let unconstrained = ConstraintSet::default();
            let child = self.validate_value(
                key,
                &format!("{name}[{label}](key)"),
                &unconstrained,
                None,
                depth + 1,
            )?;
            report.add(child);
            let child = self.validate_value(
                value,
                &format!("{name}[{label}](value)"),
                &unconstrained,
                None,
                depth + 1,
            )?;
            report.add(child);
        }
        Ok(report)
    }

    fn validate_sequence(
        &self,
        items: &[Value],
        name: &str,
        set: &ConstraintSet,
        raw: Option<&str>,
        depth: usize,
    ) -> Result<Report, Error> {
        let mut report = Report::new();
        let len = items.len() as i64;
        if let Some(min) = set.min_items {
            if len < min {
                report.add(Report::violation(
                    name,
                    ViolationKind::Value,
                    format!("Array is too short ({len}), minimum {min}"),
                    raw,
                ));
            }
        }
        if let Some(max) = set.max_items {
            if len > max {
                report.add(Report::violation(
                    name,
                    ViolationKind::Value,
                    format!("Array is too long ({len}), maximum {max}"),
                    raw,
                ));
            }
        }
        if set.unique_items == Some(true) {
            // All-pairs structural equality; every duplicate pair is
            // reported, not just the first.
            for i in 1..items.len() {
                for j in 0..i {
                    if items[i] == items[j] {
                        report.add(Report::violation(
                            name,
                            ViolationKind::Unique,
                            format!("Array items are not unique (indices {i} and {j})"),
                            raw,
                        ));
                    }
                }
            }
        }
        // Elements carry the sequence field's own constraint set, so scalar
        // constraints like `pattern` apply per element.
        for (i, item) in items.iter().enumerate() {
            let child = self.validate_value(item, &format!("{name}[{i}]"), set, raw, depth + 1)?;
            report.add(child);
        }
        Ok(report)
    }

    fn validate_string(&self, s: &str, name: &str, set: &ConstraintSet, raw: Option<&str>) -> Report {
        let mut report = Report::new();
        if set.min_length.is_some() || set.max_length.is_some() {
            // Lengths count Unicode code points, not encoded bytes.
            let len = s.chars().count() as i64;
            if let Some(min) = set.min_length {
                if len < min {
                    report.add(Report::violation(
                        name,
                        ViolationKind::Value,
                        format!("String is too short ({len} chars), minimum {min}"),
                        raw,
                    ));
                }
            }
            if let Some(max) = set.max_length {
                if len > max {
                    report.add(Report::violation(
                        name,
                        ViolationKind::Value,
                        format!("String is too long ({len} chars), maximum {max}"),
                        raw,
                    ));
                }
            }
        }
        if let Some(re) = &set.pattern {
            if !re.is_match(s) {
                report.add(Report::violation(
                    name,
                    ViolationKind::Value,
                    format!("String does not match pattern: {}", re.as_str()),
                    raw,
                ));
            }
        }
        if let Some(format_name) = &set.format {
            match self.formats.get(format_name) {
                Some(check) => {
                    if let Err(reason) = check(s) {
                        report.add(Report::violation(
                            name,
                            ViolationKind::Format,
                            format!("Format validation failed ({reason})"),
                            raw,
                        ));
                    }
                }
                None => {
                    report.add(Report::violation(
                        name,
                        ViolationKind::Format,
                        format!("Unknown format: {format_name}"),
                        raw,
                    ));
                }
            }
        }
        if !set.enum_values.is_empty() && !set.enum_values.iter().any(|e| e == s) {
            report.add(Report::violation(
                name,
                ViolationKind::Value,
                format!("No enum match for: {s}"),
                raw,
            ));
        }
        report
    }

    fn validate_number(
        &self,
        value: &Value,
        name: &str,
        set: &ConstraintSet,
        raw: Option<&str>,
    ) -> Report {
        let mut report = Report::new();
        let Some(num) = number::numeric_of(value) else {
            report.add(Report::violation(
                name,
                ViolationKind::Value,
                "Value is not a finite number",
                raw,
            ));
            return report;
        };
        let text = num.canonical();
        if let Some(min) = &set.minimum {
            // With the draft-4 flag set, a value equal to the bound reports
            // the exclusivity violation; the plain bound check below only
            // fires strictly beyond it.
            if set.exclusive_minimum == Some(true) && num.cmp_bound(min) != Ordering::Greater {
                report.add(Report::violation(
                    name,
                    ViolationKind::Value,
                    format!(
                        "Value {text} is equal to exclusive minimum {}",
                        number::canonical(min)
                    ),
                    raw,
                ));
            }
            if num.cmp_bound(min) == Ordering::Less {
                report.add(Report::violation(
                    name,
                    ViolationKind::Value,
                    format!("Value {text} is less than minimum {}", number::canonical(min)),
                    raw,
                ));
            }
        }
        if let Some(bound) = &set.exclusive_minimum_bound {
            if num.cmp_bound(bound) != Ordering::Greater {
                report.add(Report::violation(
                    name,
                    ViolationKind::Value,
                    format!(
                        "Value {text} is equal to exclusive minimum {}",
                        number::canonical(bound)
                    ),
                    raw,
                ));
            }
        }
        if let Some(max) = &set.maximum {
            if set.exclusive_maximum == Some(true) && num.cmp_bound(max) != Ordering::Less {
                report.add(Report::violation(
                    name,
                    ViolationKind::Value,
                    format!(
                        "Value {text} is equal to exclusive maximum {}",
                        number::canonical(max)
                    ),
                    raw,
                ));
            }
            if num.cmp_bound(max) == Ordering::Greater {
                report.add(Report::violation(
                    name,
                    ViolationKind::Value,
                    format!(
                        "Value {text} is greater than maximum {}",
                        number::canonical(max)
                    ),
                    raw,
                ));
            }
        }
        if let Some(bound) = &set.exclusive_maximum_bound {
            if num.cmp_bound(bound) != Ordering::Less {
                report.add(Report::violation(
                    name,
                    ViolationKind::Value,
                    format!(
                        "Value {text} is equal to exclusive maximum {}",
                        number::canonical(bound)
                    ),
                    raw,
                ));
            }
        }
        if let Some(divisor) = &set.multiple_of {
            if !num.is_multiple_of(divisor) {
                report.add(Report::violation(
                    name,
                    ViolationKind::Value,
                    format!(
                        "Value {text} is not a multiple of {}",
                        number::canonical(divisor)
                    ),
                    raw,
                ));
            }
        }
        if !set.enum_values.is_empty() && !set.enum_values.iter().any(|e| *e == text) {
            report.add(Report::violation(
                name,
                ViolationKind::Value,
                format!("No enum match for: {text}"),
                raw,
            ));
        }
        report
    }
}
