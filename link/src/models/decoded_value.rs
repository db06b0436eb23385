use serde::{Serialize, Serializer};

use super::value::Value;

/// The decoded form of one raw cell.
///
/// Columns the driver reports as NOT NULL decode to [`DecodedValue::Bare`];
/// nullable and unknown-nullability columns decode to
/// [`DecodedValue::Present`] or [`DecodedValue::Absent`]. Callers matching
/// on the wrapper can therefore tell a guaranteed value from an optional one.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedValue {
    /// SQL NULL, an explicit NULL-typed column, or undecodable JSON
    Absent,
    /// Non-null value from a nullable or unknown-nullability column
    Present(Value),
    /// Value from a column guaranteed NOT NULL
    Bare(Value),
}

impl DecodedValue {
    /// Wrap a value according to the column's nullability.
    pub(crate) fn wrap(value: Option<Value>, not_null: bool) -> Self {
        match (value, not_null) {
            (Some(v), true) => DecodedValue::Bare(v),
            (Some(v), false) => DecodedValue::Present(v),
            (None, _) => DecodedValue::Absent,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, DecodedValue::Absent)
    }

    /// True for the present/absent wrapper, false for a bare value.
    pub fn is_optional(&self) -> bool {
        !matches!(self, DecodedValue::Bare(_))
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            DecodedValue::Absent => None,
            DecodedValue::Present(v) | DecodedValue::Bare(v) => Some(v),
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            DecodedValue::Absent => None,
            DecodedValue::Present(v) | DecodedValue::Bare(v) => Some(v),
        }
    }
}

impl Serialize for DecodedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.value() {
            Some(v) => v.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }
}
