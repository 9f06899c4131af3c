//! Core value and predicate types shared by the codec, the predicate builder and SQL rendering.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::validate::assert_valid_sql_identifier;

/// A typed literal: a sort-key value on a row, a cursor value, or a SQL parameter.
///
/// Ordering follows a single null policy: `Null` sorts before every non-null value.
/// `Int` and `Decimal` compare numerically with each other; other kinds only compare
/// with themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// SQL NULL
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit integer
    Int(i64),
    /// Exact decimal, scale preserved
    Decimal(Decimal),
    /// UTC instant with nanosecond precision
    Timestamp(DateTime<Utc>),
    /// UTF-8 text
    Text(String),
}

impl Value {
    /// Returns `true` for `Value::Null`.
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the value kind, as used in diagnostics and the token wire format.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Decimal(_) => "decimal",
            Self::Timestamp(_) => "timestamp",
            Self::Text(_) => "text",
        }
    }

    /// Compare two non-null values the way a storage engine compares a column to a literal.
    ///
    /// Returns `None` if either side is null or the kinds are not comparable.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Decimal(a), Self::Decimal(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Decimal(b)) => Some(Decimal::from(*a).cmp(b)),
            (Self::Decimal(a), Self::Int(b)) => Some(a.cmp(&Decimal::from(*b))),
            (Self::Timestamp(a), Self::Timestamp(b)) => Some(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Total order used for sorting rows: nulls first, then by value.
    ///
    /// Incomparable kinds fall back to a fixed kind rank so sorting never panics.
    #[must_use]
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Null, _) => Ordering::Less,
            (_, Self::Null) => Ordering::Greater,
            _ => self
                .compare(other)
                .unwrap_or_else(|| self.rank().cmp(&other.rank())),
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int(_) | Self::Decimal(_) => 2,
            Self::Timestamp(_) => 3,
            Self::Text(_) => 4,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Timestamp(t) => write!(f, "{}", t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::Text(s) => write!(f, "{s:?}"),
        }
    }
}

// Decimals and timestamps are emitted as strings so JSON consumers never round them.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Decimal(d) => serializer.collect_str(d),
            Self::Timestamp(t) => {
                serializer.serialize_str(&t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            },
            Self::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDir {
    /// Ascending (smallest first)
    Asc,
    /// Descending (largest first)
    Desc,
}

impl SortDir {
    /// SQL keyword for this direction.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// `NULLS FIRST` / `NULLS LAST` clause that keeps nulls below every value.
    #[must_use]
    pub const fn nulls_sql(self) -> &'static str {
        match self {
            Self::Asc => "NULLS FIRST",
            Self::Desc => "NULLS LAST",
        }
    }
}

/// One column of a sort specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortKey {
    /// Column name
    pub field: String,
    /// Sort direction
    pub dir: SortDir,
    /// Whether the column may hold nulls. Only nullable keys get null-aware seek
    /// conditions and an explicit `NULLS` clause in ORDER BY.
    pub nullable: bool,
}

impl SortKey {
    /// Create a new, non-nullable sort key.
    pub fn new(field: impl Into<String>, dir: SortDir) -> Self {
        Self {
            field: field.into(),
            dir,
            nullable: false,
        }
    }

    /// Ascending sort key.
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDir::Asc)
    }

    /// Descending sort key.
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDir::Desc)
    }

    /// Mark the key's column as nullable.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.dir == SortDir::Desc { "-" } else { "" };
        let null_mark = if self.nullable { "?" } else { "" };
        write!(f, "{sign}{}{null_mark}", self.field)
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Equal: `=` (or `IS NULL` against a null value)
    Eq,
    /// Not equal: `!=` (or `IS NOT NULL` against a null value)
    Ne,
    /// Greater than: `>`
    Gt,
    /// Greater than or equal: `>=`
    Gte,
    /// Less than: `<`
    Lt,
    /// Less than or equal: `<=`
    Lte,
}

impl Operator {
    /// SQL operator token.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }

    /// Whether `actual <op> expected` holds given `actual.compare(expected)`.
    #[must_use]
    pub const fn accepts(self, ord: Ordering) -> bool {
        match self {
            Self::Eq => matches!(ord, Ordering::Equal),
            Self::Ne => !matches!(ord, Ordering::Equal),
            Self::Gt => matches!(ord, Ordering::Greater),
            Self::Gte => !matches!(ord, Ordering::Less),
            Self::Lt => matches!(ord, Ordering::Less),
            Self::Lte => !matches!(ord, Ordering::Greater),
        }
    }
}

/// Logical operators for compound predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    /// All conditions must match: `AND`
    And,
    /// At least one condition must match: `OR`
    Or,
}

/// A single field comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    /// Column name
    pub field: String,
    /// Comparison operator
    pub op: Operator,
    /// Literal to compare against
    pub value: Value,
}

/// Several predicates joined by one logical operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundPredicate {
    /// How the children are joined
    pub op: LogicalOp,
    /// Child predicates
    pub predicates: Vec<Predicate>,
}

/// A boolean condition tree over row fields.
///
/// This is what the cursor predicate builder returns and what the SQL renderer
/// and the in-memory evaluator consume.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Predicate {
    /// Matches every row.
    #[default]
    Always,
    /// Matches no row.
    Never,
    /// A field comparison.
    Compare(Comparison),
    /// An AND/OR of nested predicates.
    Compound(CompoundPredicate),
}

impl Predicate {
    /// Combine with another predicate using AND, folding `Always` / `Never`.
    #[must_use]
    pub fn and_also(self, other: Self) -> Self {
        match (self, other) {
            (Self::Never, _) | (_, Self::Never) => Self::Never,
            (Self::Always, p) | (p, Self::Always) => p,
            (a, b) => and(vec![a, b]),
        }
    }

    /// Returns `true` for `Predicate::Always`.
    #[must_use]
    pub const fn is_always(&self) -> bool {
        matches!(self, Self::Always)
    }
}

/// Helper function to create a simple comparison predicate.
///
/// # Panics
///
/// Panics if the field name is not a valid SQL identifier.
pub fn simple(field: impl Into<String>, op: Operator, value: impl Into<Value>) -> Predicate {
    let field = field.into();
    assert_valid_sql_identifier(&field, "predicate field");
    Predicate::Compare(Comparison {
        field,
        op,
        value: value.into(),
    })
}

/// Helper function to create an AND compound predicate.
#[must_use]
pub fn and(predicates: Vec<Predicate>) -> Predicate {
    Predicate::Compound(CompoundPredicate {
        op: LogicalOp::And,
        predicates,
    })
}

/// Helper function to create an OR compound predicate.
#[must_use]
pub fn or(predicates: Vec<Predicate>) -> Predicate {
    Predicate::Compound(CompoundPredicate {
        op: LogicalOp::Or,
        predicates,
    })
}
