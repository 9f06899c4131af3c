//! Sort specification: the ordered key list shared by tokens, predicates and ORDER BY.

use std::cmp::Ordering;
use std::fmt;

use super::eval::Row;
use super::types::{SortDir, SortKey, Value};
use crate::validate::is_valid_sql_identifier;

/// An ordered, non-empty list of sort keys with unique field names.
///
/// Order encodes precedence, most significant first. The last key should be unique per row
/// (a primary key, say) so the ordering is total; otherwise rows that tie on every key can be
/// skipped or repeated across pages.
///
/// # Example
///
/// ```
/// use keyseek::{SortKey, SortSpec};
///
/// let spec = SortSpec::new([SortKey::desc("created_at"), SortKey::asc("id")]).unwrap();
/// assert_eq!(spec.to_string(), "-created_at,id");
/// assert_eq!(SortSpec::parse("-created_at,id", &[]).unwrap(), spec);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[doc(alias = "buildSortSpec")]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    /// Build a sort specification, preserving input order.
    ///
    /// Fails if the list is empty, a field repeats, or a field is not a valid SQL identifier.
    pub fn new(keys: impl IntoIterator<Item = SortKey>) -> Result<Self, SortSpecError> {
        let keys: Vec<SortKey> = keys.into_iter().collect();
        if keys.is_empty() {
            return Err(SortSpecError::Empty);
        }

        for (i, key) in keys.iter().enumerate() {
            if !is_valid_sql_identifier(&key.field) {
                return Err(SortSpecError::InvalidField {
                    field: key.field.clone(),
                });
            }
            if keys[..i].iter().any(|prev| prev.field == key.field) {
                return Err(SortSpecError::DuplicateField {
                    field: key.field.clone(),
                });
            }
        }

        Ok(Self { keys })
    }

    /// Parse a sort string like `"-created_at,id"`.
    ///
    /// A leading `-` sorts descending; a trailing `?` marks the column nullable.
    /// If `allowed` is non-empty, every field must appear in it.
    ///
    /// # Security Note
    ///
    /// If `allowed` is empty, ALL fields are allowed. For user input, always
    /// provide an explicit whitelist to prevent sorting by sensitive columns.
    pub fn parse(sort: &str, allowed: &[&str]) -> Result<Self, SortSpecError> {
        let mut keys = Vec::new();

        for part in sort.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let (part, dir) = match part.strip_prefix('-') {
                Some(stripped) => (stripped, SortDir::Desc),
                None => (part, SortDir::Asc),
            };
            let (field, nullable) = match part.strip_suffix('?') {
                Some(stripped) => (stripped, true),
                None => (part, false),
            };

            if !allowed.is_empty() && !allowed.contains(&field) {
                return Err(SortSpecError::FieldNotAllowed {
                    field: field.to_string(),
                    allowed: allowed.iter().map(|s| (*s).to_string()).collect(),
                });
            }

            let key = SortKey::new(field, dir);
            keys.push(if nullable { key.nullable() } else { key });
        }

        Self::new(keys)
    }

    /// The keys in precedence order.
    #[must_use]
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    /// Number of keys (always at least one).
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always `false`: a `SortSpec` cannot be empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Field names in precedence order.
    pub fn fields(&self) -> impl Iterator<Item = &str> + '_ {
        self.keys.iter().map(|k| k.field.as_str())
    }

    /// Whether the spec sorts by `field`.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.keys.iter().any(|k| k.field == field)
    }

    /// Order two rows by this spec, nulls first within each column's direction.
    ///
    /// Missing columns compare as null.
    pub fn compare<A, B>(&self, a: &A, b: &B) -> Ordering
    where
        A: Row + ?Sized,
        B: Row + ?Sized,
    {
        for key in &self.keys {
            let left = a.value(&key.field).unwrap_or(&Value::Null);
            let right = b.value(&key.field).unwrap_or(&Value::Null);
            let ord = left.sort_cmp(right);
            let ord = match key.dir {
                SortDir::Asc => ord,
                SortDir::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl<'a> IntoIterator for &'a SortSpec {
    type Item = &'a SortKey;
    type IntoIter = std::slice::Iter<'a, SortKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

/// Errors from building a [`SortSpec`].
///
/// These are programming or configuration errors, never client input errors
/// (unless the sort string itself came from a client).
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
#[doc(alias = "InvalidSortSpecError")]
pub enum SortSpecError {
    /// No sort keys were given.
    Empty,
    /// The same field appears twice.
    DuplicateField {
        /// The repeated field name
        field: String,
    },
    /// The field name is not a safe SQL identifier.
    InvalidField {
        /// The rejected field name
        field: String,
    },
    /// The field is not in the caller's whitelist.
    FieldNotAllowed {
        /// The rejected field name
        field: String,
        /// The whitelist that was applied
        allowed: Vec<String>,
    },
}

impl fmt::Display for SortSpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "sort specification must have at least one key"),
            Self::DuplicateField { field } => {
                write!(f, "sort field '{field}' appears more than once")
            },
            Self::InvalidField { field } => write!(
                f,
                "invalid sort field '{field}': must start with letter/underscore and contain only letters, digits, underscores"
            ),
            Self::FieldNotAllowed { field, allowed } => {
                write!(f, "sort field '{field}' not allowed. Allowed: {allowed:?}")
            },
        }
    }
}

impl std::error::Error for SortSpecError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_preserves_order() {
        let spec = SortSpec::new([SortKey::desc("created_at"), SortKey::asc("id")]).unwrap();
        let fields: Vec<&str> = spec.fields().collect();
        assert_eq!(fields, ["created_at", "id"]);
        assert_eq!(spec.keys()[0].dir, SortDir::Desc);
        assert_eq!(spec.len(), 2);
    }

    #[test]
    fn test_new_rejects_empty() {
        assert_eq!(SortSpec::new(Vec::new()), Err(SortSpecError::Empty));
    }

    #[test]
    fn test_new_rejects_duplicate_field() {
        let err = SortSpec::new([SortKey::asc("id"), SortKey::desc("id")]).unwrap_err();
        assert_eq!(
            err,
            SortSpecError::DuplicateField {
                field: "id".to_string()
            }
        );
    }

    #[test]
    fn test_new_rejects_invalid_identifier() {
        let err = SortSpec::new([SortKey::asc("id; DROP TABLE users")]).unwrap_err();
        assert!(matches!(err, SortSpecError::InvalidField { .. }));
    }

    #[test]
    fn test_parse_directions_and_nullability() {
        let spec = SortSpec::parse(" -published_at? , id ", &[]).unwrap();
        assert_eq!(
            spec.keys(),
            &[SortKey::desc("published_at").nullable(), SortKey::asc("id")]
        );
        assert_eq!(spec.to_string(), "-published_at?,id");
    }

    #[test]
    fn test_parse_whitelist() {
        let err = SortSpec::parse("-password", &["id", "created_at"]).unwrap_err();
        assert!(matches!(err, SortSpecError::FieldNotAllowed { ref field, .. } if field == "password"));
        assert!(err.to_string().contains("not allowed"));

        assert!(SortSpec::parse("-created_at,id", &["id", "created_at"]).is_ok());
    }

    #[test]
    fn test_parse_empty_string() {
        assert_eq!(SortSpec::parse(" , ", &[]), Err(SortSpecError::Empty));
    }

    #[test]
    fn test_compare_rows() {
        let spec = SortSpec::parse("-score,id", &[]).unwrap();
        let a = vec![
            ("score".to_string(), Value::Int(10)),
            ("id".to_string(), Value::Int(2)),
        ];
        let b = vec![
            ("score".to_string(), Value::Int(10)),
            ("id".to_string(), Value::Int(1)),
        ];
        let c = vec![
            ("score".to_string(), Value::Int(3)),
            ("id".to_string(), Value::Int(0)),
        ];
        assert_eq!(spec.compare(&a, &b), Ordering::Greater);
        assert_eq!(spec.compare(&a, &c), Ordering::Less);
        assert_eq!(spec.compare(&a, &a), Ordering::Equal);
    }

    #[test]
    fn test_compare_nulls_follow_direction() {
        let asc = SortSpec::parse("v?", &[]).unwrap();
        let desc = SortSpec::parse("-v?", &[]).unwrap();
        let null_row = vec![("v".to_string(), Value::Null)];
        let one_row = vec![("v".to_string(), Value::Int(1))];
        // nulls first ascending, last descending
        assert_eq!(asc.compare(&null_row, &one_row), Ordering::Less);
        assert_eq!(desc.compare(&null_row, &one_row), Ordering::Greater);
    }
}
