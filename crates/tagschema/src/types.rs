//! Closed value model for validation
//!
//! The engine dispatches on an explicit, closed set of shapes instead of an
//! open-ended reflective type system: records with named, tagged fields,
//! mappings, sequences, scalars, and a present-or-absent optional wrapper.

use crate::number;

// ============================================================================
// Value
// ============================================================================

/// A runtime value to be validated.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean scalar
    Bool(bool),
    /// Signed integer scalar
    Int(i64),
    /// Unsigned integer scalar
    Uint(u64),
    /// Floating point scalar
    Float(f64),
    /// String scalar
    String(String),
    /// Ordered, index-addressable sequence, possibly with duplicates
    Sequence(Vec<Value>),
    /// Unordered key/value association; keys are expected to be unique
    Mapping(Vec<(Value, Value)>),
    /// Struct-like aggregate of named fields
    Record(Record),
    /// Present-or-absent wrapper; an absent optional is skipped silently
    Optional(Option<Box<Value>>),
}

impl Value {
    /// Human-readable shape name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Uint(_) => "unsigned integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Sequence(_) => "sequence",
            Self::Mapping(_) => "mapping",
            Self::Record(_) => "record",
            Self::Optional(_) => "optional",
        }
    }

    /// Canonical string form of a scalar, used for mapping-key pattern
    /// matching and enum membership. Numbers print in normalized decimal
    /// form, so `5.0` and `5` agree.
    pub fn canonical_string(&self) -> Option<String> {
        match self {
            Self::String(s) => Some(s.clone()),
            Self::Int(i) => Some(i.to_string()),
            Self::Uint(u) => Some(u.to_string()),
            Self::Float(_) => number::numeric_of(self).map(|n| n.canonical()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Optional(Some(inner)) => inner.canonical_string(),
            _ => None,
        }
    }

    /// Resolve optional wrapping. Returns `None` for an absent optional and
    /// the innermost value otherwise.
    pub(crate) fn unwrap_optional(&self) -> Option<&Value> {
        let mut value = self;
        loop {
            match value {
                Self::Optional(None) => return None,
                Self::Optional(Some(inner)) => value = inner,
                other => return Some(other),
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::Uint(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Sequence(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Self::Record(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        Self::Optional(v.map(|inner| Box::new(inner.into())))
    }
}

// ============================================================================
// Record and Field
// ============================================================================

/// A record: an ordered collection of named, optionally tagged fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<Field>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field (builder style).
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// The record's fields, in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
}

/// One named field of a record, carrying its raw constraint tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    tag: Option<String>,
    value: Value,
}

impl Field {
    /// Create an untagged field.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            tag: None,
            value: value.into(),
        }
    }

    /// Attach the raw constraint tag, e.g. `"minimum:5,pattern:^[a-z]+$"`.
    /// The sentinel tag `-` excludes the field from validation entirely.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn raw_tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}
