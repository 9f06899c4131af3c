//! In-memory predicate evaluation.
//!
//! Mirrors what a SQL engine does with the rendered predicate, so seek conditions can be
//! checked against plain rows without a database.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use super::types::{CompoundPredicate, Comparison, LogicalOp, Operator, Predicate, Value};

/// Field access by name.
///
/// Implemented for the common map shapes and for ordered `(name, value)` lists.
/// Returning `None` means the row has no such column; a present-but-null column
/// returns `Some(&Value::Null)`.
pub trait Row {
    /// Look up a column value by field name.
    fn value(&self, field: &str) -> Option<&Value>;
}

impl<S: BuildHasher> Row for HashMap<String, Value, S> {
    fn value(&self, field: &str) -> Option<&Value> {
        self.get(field)
    }
}

impl Row for BTreeMap<String, Value> {
    fn value(&self, field: &str) -> Option<&Value> {
        self.get(field)
    }
}

impl Row for [(String, Value)] {
    fn value(&self, field: &str) -> Option<&Value> {
        self.iter().find(|(name, _)| name == field).map(|(_, v)| v)
    }
}

impl Row for Vec<(String, Value)> {
    fn value(&self, field: &str) -> Option<&Value> {
        self.as_slice().value(field)
    }
}

impl<R: Row + ?Sized> Row for &R {
    fn value(&self, field: &str) -> Option<&Value> {
        (**self).value(field)
    }
}

impl Predicate {
    /// Evaluate the predicate against a row.
    ///
    /// Missing columns read as null. Comparisons involving null or incomparable kinds
    /// are false, as in SQL; `= NULL` / `!= NULL` mean `IS NULL` / `IS NOT NULL`.
    pub fn matches<R: Row + ?Sized>(&self, row: &R) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Compare(cmp) => comparison_matches(cmp, row),
            Self::Compound(compound) => compound_matches(compound, row),
        }
    }
}

fn comparison_matches<R: Row + ?Sized>(cmp: &Comparison, row: &R) -> bool {
    let actual = row.value(&cmp.field).unwrap_or(&Value::Null);
    match (cmp.op, &cmp.value) {
        (Operator::Eq, Value::Null) => actual.is_null(),
        (Operator::Ne, Value::Null) => !actual.is_null(),
        (_, Value::Null) => false,
        (op, expected) => actual
            .compare(expected)
            .is_some_and(|ord| op.accepts(ord)),
    }
}

fn compound_matches<R: Row + ?Sized>(compound: &CompoundPredicate, row: &R) -> bool {
    match compound.op {
        LogicalOp::And => compound.predicates.iter().all(|p| p.matches(row)),
        LogicalOp::Or => compound.predicates.iter().any(|p| p.matches(row)),
    }
}
