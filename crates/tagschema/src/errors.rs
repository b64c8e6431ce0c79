//! Validation errors and the result tree
//!
//! Two very different things can go wrong and they are kept apart:
//!
//! - [`Error`] is returned by `Result` for programming mistakes: a malformed
//!   constraint tag, a non-record input, a bad format registration.
//! - A [`Report`] carries expected, data-dependent constraint violations. It
//!   is always returned as a value, never as an error.

use std::fmt;

use thiserror::Error;

use crate::tag::TagSyntaxError;

/// Hard failure of a validation or registration call.
#[derive(Debug, Error)]
pub enum Error {
    /// The annotation on a field failed to parse. Malformed tags indicate a
    /// bug in the data model, so they propagate instead of degrading to
    /// "unconstrained".
    #[error("constraint tag on field `{field}` is invalid: {source}")]
    TagSyntax {
        field: String,
        #[source]
        source: TagSyntaxError,
    },
    /// `validate` was handed something that is not a record.
    #[error("expected a record value, got {0}")]
    NotARecord(&'static str),
    /// Input nesting exceeded the recursion guard.
    #[error("value nesting exceeds the maximum depth of {0}")]
    TooDeep(usize),
    /// `register_format` was called with an empty name.
    #[error("format name must not be empty")]
    EmptyFormatName,
    /// `register_format` was called with a name that is already taken;
    /// first registration wins.
    #[error("format `{0}` is already registered")]
    DuplicateFormat(String),
}

// ============================================================================
// Violation kinds
// ============================================================================

/// Classification of a single constraint violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ViolationKind {
    /// A value constraint failed (bounds, lengths, pattern, enum, ...).
    Value,
    /// A named format predicate rejected the value, or the name is unknown.
    Format,
    /// A required mapping key is missing.
    Missing,
    /// A sequence contains duplicate items despite `uniqueItems`.
    Unique,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value => write!(f, "value_error"),
            Self::Format => write!(f, "format_error"),
            Self::Missing => write!(f, "missing"),
            Self::Unique => write!(f, "unique_error"),
        }
    }
}

// ============================================================================
// Report tree
// ============================================================================

/// One node of the hierarchical validation outcome.
///
/// A node names the path it describes (`field`, `field[2]`,
/// `field[key](value)`), optionally carries one violation, optionally
/// references the raw tag that produced the violation, and owns its child
/// nodes in order. All of it is plain owned data; a report holds no
/// references into the validated value.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Report {
    /// Path label of the value this node describes.
    pub name: Option<String>,
    /// Violation classification, set together with `message`.
    pub kind: Option<ViolationKind>,
    /// Human-readable violation message.
    pub message: Option<String>,
    /// Raw constraint tag that the violated constraint came from.
    pub tag: Option<String>,
    /// Outcomes of nested values, in traversal order.
    pub causes: Vec<Report>,
}

impl Report {
    /// An empty (clean) node.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn violation(
        name: impl Into<String>,
        kind: ViolationKind,
        message: impl Into<String>,
        tag: Option<&str>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            kind: Some(kind),
            message: Some(message.into()),
            tag: tag.map(str::to_string),
            causes: Vec::new(),
        }
    }

    /// True iff this node carries nothing at all: no label, no violation and
    /// no children.
    pub fn is_clean(&self) -> bool {
        self.name.is_none()
            && self.kind.is_none()
            && self.message.is_none()
            && self.causes.is_empty()
    }

    /// True iff no violation exists anywhere in this subtree.
    pub fn passed(&self) -> bool {
        self.message.is_none() && self.causes.iter().all(Report::passed)
    }

    /// Attach a child outcome, dropping it when it contains no violation.
    pub(crate) fn add(&mut self, child: Report) {
        if !child.passed() {
            self.causes.push(child);
        }
    }

    /// Every violation-carrying node in the subtree, in traversal order.
    pub fn violations(&self) -> Vec<&Report> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a Report>) {
        if self.message.is_some() {
            out.push(self);
        }
        for cause in &self.causes {
            cause.collect(out);
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self
            .violations()
            .iter()
            .map(|v| match (&v.name, &v.message) {
                (Some(name), Some(msg)) => format!("{name}: {msg}"),
                (None, Some(msg)) => msg.clone(),
                _ => String::new(),
            })
            .collect();
        f.write_str(&messages.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_report_passes() {
        let report = Report::new();
        assert!(report.is_clean());
        assert!(report.passed());
        assert!(report.violations().is_empty());
        assert_eq!(report.to_string(), "");
    }

    #[test]
    fn test_violation_fails() {
        let v = Report::violation("age", ViolationKind::Value, "too small", None);
        assert!(!v.is_clean());
        assert!(!v.passed());
        assert_eq!(v.violations().len(), 1);
    }

    #[test]
    fn test_add_drops_passing_children() {
        let mut report = Report::new();
        report.add(Report::new());
        assert!(report.causes.is_empty());

        report.add(Report::violation("x", ViolationKind::Value, "bad", None));
        assert_eq!(report.causes.len(), 1);
        assert!(!report.passed());
    }

    #[test]
    fn test_nested_violations_flatten_in_order() {
        let mut inner = Report::new();
        inner.name = Some("child".to_string());
        inner.add(Report::violation("child.a", ViolationKind::Value, "first", None));
        inner.add(Report::violation("child.b", ViolationKind::Format, "second", None));

        let mut root = Report::new();
        root.add(inner);

        let all = root.violations();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].message.as_deref(), Some("first"));
        assert_eq!(all[1].message.as_deref(), Some("second"));
        assert_eq!(root.to_string(), "child.a: first; child.b: second");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_report_serializes_to_json() {
        let mut report = Report::new();
        report.add(Report::violation(
            "age",
            ViolationKind::Value,
            "too small",
            Some("minimum:0"),
        ));
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["name"].is_null());
        assert_eq!(json["causes"][0]["name"], "age");
        assert_eq!(json["causes"][0]["kind"], "Value");
        assert_eq!(json["causes"][0]["message"], "too small");
        assert_eq!(json["causes"][0]["tag"], "minimum:0");
        assert_eq!(json["causes"][0]["causes"], serde_json::json!([]));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ViolationKind::Value.to_string(), "value_error");
        assert_eq!(ViolationKind::Format.to_string(), "format_error");
        assert_eq!(ViolationKind::Missing.to_string(), "missing");
        assert_eq!(ViolationKind::Unique.to_string(), "unique_error");
    }
}
