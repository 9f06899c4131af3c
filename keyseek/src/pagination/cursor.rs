//! Cursor data: the sort-key values of the last row on a page.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::builder::{Row, SortSpec, Value};

/// The values of the sort fields on the last row of a page.
///
/// Holds exactly one value per field of the [`SortSpec`] it was projected with. Build it from
/// real row data with [`CursorData::from_row`]; the field-by-field builder is meant for tests
/// and tooling.
///
/// Equality compares the field/value mapping and ignores insertion order.
#[derive(Debug, Clone, Default)]
#[must_use = "cursor data must be encoded with encode_token() or turned into a predicate"]
pub struct CursorData {
    fields: Vec<(String, Value)>,
}

impl CursorData {
    /// Create empty cursor data.
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Project a row onto the sort fields of `spec`, in spec order.
    ///
    /// Fails if the row lacks a column the spec sorts by.
    pub fn from_row<R: Row + ?Sized>(row: &R, spec: &SortSpec) -> Result<Self, CursorError> {
        let mut fields = Vec::with_capacity(spec.len());
        for field in spec.fields() {
            let value = row.value(field).ok_or_else(|| CursorError::MissingField {
                field: field.to_string(),
            })?;
            fields.push((field.to_string(), value.clone()));
        }
        Ok(Self { fields })
    }

    /// Add a field value.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Add an integer field.
    pub fn int(self, name: impl Into<String>, value: i64) -> Self {
        self.field(name, Value::Int(value))
    }

    /// Add a text field.
    pub fn text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.field(name, Value::Text(value.into()))
    }

    /// Add a timestamp field.
    pub fn timestamp(self, name: impl Into<String>, value: DateTime<Utc>) -> Self {
        self.field(name, Value::Timestamp(value))
    }

    /// Add a decimal field.
    pub fn decimal(self, name: impl Into<String>, value: Decimal) -> Self {
        self.field(name, Value::Decimal(value))
    }

    /// Add a null field.
    pub fn null(self, name: impl Into<String>) -> Self {
        self.field(name, Value::Null)
    }

    /// Look up the value of a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, v)| v)
    }

    /// All `(field, value)` pairs in insertion order.
    #[must_use]
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Values in `spec` order, checking the field set is exactly the spec's.
    ///
    /// Null is only accepted for keys marked nullable.
    pub(crate) fn values_for<'a>(&'a self, spec: &SortSpec) -> Result<Vec<&'a Value>, CursorError> {
        for (i, (name, _)) in self.fields.iter().enumerate() {
            if !spec.contains(name) {
                return Err(CursorError::UnexpectedField {
                    field: name.clone(),
                });
            }
            if self.fields[..i].iter().any(|(prev, _)| prev == name) {
                return Err(CursorError::DuplicateField {
                    field: name.clone(),
                });
            }
        }

        spec.keys()
            .iter()
            .map(|key| {
                let value = self.get(&key.field).ok_or_else(|| CursorError::MissingField {
                    field: key.field.clone(),
                })?;
                if value.is_null() && !key.nullable {
                    return Err(CursorError::NullValue {
                        field: key.field.clone(),
                    });
                }
                Ok(value)
            })
            .collect()
    }
}

impl PartialEq for CursorData {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .all(|(name, value)| other.get(name) == Some(value))
    }
}

impl Eq for CursorData {}

impl Row for CursorData {
    fn value(&self, field: &str) -> Option<&Value> {
        self.get(field)
    }
}

/// Cursor data that does not line up with the sort specification.
///
/// Raised when encoding a token or building a seek predicate; this is a programming error
/// on the server side, unlike [`TokenError`](super::TokenError).
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CursorError {
    /// A sort field has no value in the cursor (or the row it was projected from).
    MissingField {
        /// The sort field without a value
        field: String,
    },
    /// The cursor carries a field the sort specification does not sort by.
    UnexpectedField {
        /// The extra field
        field: String,
    },
    /// The cursor carries the same field twice.
    DuplicateField {
        /// The repeated field
        field: String,
    },
    /// A key not marked nullable has a null value.
    NullValue {
        /// The non-nullable sort field
        field: String,
    },
}

impl fmt::Display for CursorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { field } => write!(f, "cursor is missing sort field '{field}'"),
            Self::UnexpectedField { field } => {
                write!(f, "cursor field '{field}' is not part of the sort specification")
            },
            Self::DuplicateField { field } => write!(f, "cursor field '{field}' is repeated"),
            Self::NullValue { field } => {
                write!(f, "cursor field '{field}' is null but the sort key is not nullable")
            },
        }
    }
}

impl std::error::Error for CursorError {}
