//! Keyset seek condition generation.

use crate::builder::{Comparison, Operator, Predicate, SortDir, SortKey, SortSpec, Value, and, or};

use super::cursor::{CursorData, CursorError};

/// Keyset seek condition: "rows strictly after the cursor row" under a sort specification.
///
/// Generates `(a > $1) OR (a = $1 AND b > $2)` style conditions, one OR term per key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeysetCondition {
    /// The sort keys, in precedence order.
    pub keys: Vec<SortKey>,
    /// The cursor value for each key.
    pub values: Vec<Value>,
}

impl KeysetCondition {
    /// Create a condition for paginating after `cursor`.
    ///
    /// The cursor must carry exactly the fields of `spec`.
    pub fn after(spec: &SortSpec, cursor: &CursorData) -> Result<Self, CursorError> {
        let values = cursor.values_for(spec)?.into_iter().cloned().collect();
        Ok(Self {
            keys: spec.keys().to_vec(),
            values,
        })
    }

    /// Convert to a predicate.
    ///
    /// For keys `a, b, c` the result is:
    ///
    /// `(a > 1) OR (a = 1 AND b > 2) OR (a = 1 AND b = 2 AND c > 3)`
    ///
    /// with `<` in place of `>` for descending keys. Nulls sort before every value, so
    /// a null cursor value turns equality into `IS NULL`, ascending seek into `IS NOT NULL`,
    /// and removes the descending seek term entirely. A descending seek on a nullable key
    /// also admits nulls: `(b < 2 OR b IS NULL)`.
    ///
    /// See: <https://use-the-index-luke.com/no-offset>
    #[must_use]
    pub fn to_predicate(&self) -> Predicate {
        let mut terms: Vec<Predicate> = Vec::with_capacity(self.keys.len());

        for (i, (key, value)) in self.keys.iter().zip(&self.values).enumerate() {
            let Some(seek) = seek_term(key, value) else {
                continue;
            };

            let mut conditions: Vec<Predicate> = self
                .keys
                .iter()
                .zip(&self.values)
                .take(i)
                .map(|(prev, v)| equal_term(prev, v))
                .collect();
            conditions.push(seek);

            terms.push(if conditions.len() == 1 {
                conditions.swap_remove(0)
            } else {
                and(conditions)
            });
        }

        match terms.len() {
            0 => Predicate::Never,
            1 => terms.swap_remove(0),
            _ => or(terms),
        }
    }
}

fn compare(field: &str, op: Operator, value: Value) -> Predicate {
    Predicate::Compare(Comparison {
        field: field.to_string(),
        op,
        value,
    })
}

fn equal_term(key: &SortKey, value: &Value) -> Predicate {
    compare(&key.field, Operator::Eq, value.clone())
}

/// The "sorts after `value`" condition on one key, or `None` if nothing can sort after it.
fn seek_term(key: &SortKey, value: &Value) -> Option<Predicate> {
    match (key.dir, value) {
        (SortDir::Asc, Value::Null) => Some(compare(&key.field, Operator::Ne, Value::Null)),
        (SortDir::Asc, v) => Some(compare(&key.field, Operator::Gt, v.clone())),
        (SortDir::Desc, Value::Null) => None,
        (SortDir::Desc, v) if key.nullable => Some(or(vec![
            compare(&key.field, Operator::Lt, v.clone()),
            compare(&key.field, Operator::Eq, Value::Null),
        ])),
        (SortDir::Desc, v) => Some(compare(&key.field, Operator::Lt, v.clone())),
    }
}

/// Build the predicate selecting rows strictly after `cursor` under `spec`.
///
/// An absent cursor is the first page and yields [`Predicate::Always`]. AND the result with
/// any caller filter (see [`Predicate::and_also`]).
///
/// # Example
///
/// ```
/// use keyseek::{CursorData, SortSpec, build_cursor_predicate};
///
/// let spec = SortSpec::parse("-created_at,id", &[]).unwrap();
/// assert!(build_cursor_predicate(None, &spec).unwrap().is_always());
///
/// let cursor = CursorData::new().text("created_at", "2024-01-15").int("id", 1);
/// let seek = build_cursor_predicate(Some(&cursor), &spec).unwrap();
/// assert!(!seek.is_always());
/// ```
#[doc(alias = "buildCursorPredicate")]
pub fn build_cursor_predicate(
    cursor: Option<&CursorData>,
    spec: &SortSpec,
) -> Result<Predicate, CursorError> {
    match cursor {
        None => Ok(Predicate::Always),
        Some(cursor) => Ok(KeysetCondition::after(spec, cursor)?.to_predicate()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{CompoundPredicate, LogicalOp};
    use chrono::{TimeZone, Utc};

    fn row(id: i64, created_at: Value) -> Vec<(String, Value)> {
        vec![
            ("id".to_string(), Value::Int(id)),
            ("created_at".to_string(), created_at),
        ]
    }

    fn ts(day: u32) -> Value {
        Value::Timestamp(Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_single_key_asc() {
        let spec = SortSpec::parse("id", &[]).unwrap();
        let cursor = CursorData::new().int("id", 100);

        let pred = build_cursor_predicate(Some(&cursor), &spec).unwrap();
        match pred {
            Predicate::Compare(c) => {
                assert_eq!(c.field, "id");
                assert_eq!(c.op, Operator::Gt);
                assert_eq!(c.value, Value::Int(100));
            },
            _ => panic!("Expected simple comparison"),
        }
    }

    #[test]
    fn test_single_key_desc() {
        let spec = SortSpec::parse("-created_at", &[]).unwrap();
        let cursor = CursorData::new().text("created_at", "2024-01-01");

        match build_cursor_predicate(Some(&cursor), &spec).unwrap() {
            Predicate::Compare(c) => assert_eq!(c.op, Operator::Lt),
            _ => panic!("Expected simple comparison"),
        }
    }

    #[test]
    fn test_three_keys_structure() {
        let spec = SortSpec::parse("a,-b,c", &[]).unwrap();
        let cursor = CursorData::new().int("a", 1).int("b", 2).int("c", 3);

        let pred = build_cursor_predicate(Some(&cursor), &spec).unwrap();
        let Predicate::Compound(CompoundPredicate {
            op: LogicalOp::Or,
            predicates,
        }) = pred
        else {
            panic!("Expected OR of terms");
        };
        assert_eq!(predicates.len(), 3);

        // a > 1
        assert!(matches!(&predicates[0], Predicate::Compare(c) if c.op == Operator::Gt));
        // a = 1 AND b < 2
        let Predicate::Compound(second) = &predicates[1] else {
            panic!("Expected AND term");
        };
        assert_eq!(second.op, LogicalOp::And);
        assert_eq!(second.predicates.len(), 2);
        assert!(matches!(&second.predicates[1], Predicate::Compare(c) if c.op == Operator::Lt));
        // a = 1 AND b = 2 AND c > 3
        let Predicate::Compound(third) = &predicates[2] else {
            panic!("Expected AND term");
        };
        assert_eq!(third.predicates.len(), 3);
    }

    #[test]
    fn test_first_page_matches_everything() {
        let spec = SortSpec::parse("-created_at,id", &[]).unwrap();
        let pred = build_cursor_predicate(None, &spec).unwrap();
        assert_eq!(pred, Predicate::Always);
        assert!(pred.matches(&row(1, Value::Null)));
        assert!(pred.matches(&row(2, ts(3))));
    }

    #[test]
    fn test_created_at_desc_id_asc_ordering() {
        let spec = SortSpec::parse("-created_at,id", &[]).unwrap();
        let rows = [row(1, ts(2)), row(2, ts(2)), row(3, ts(1))];

        let mut sorted: Vec<_> = rows.iter().collect();
        sorted.sort_by(|a, b| spec.compare(*a, *b));
        let ids: Vec<_> = sorted.iter().map(|r| r[0].1.clone()).collect();
        assert_eq!(ids, [Value::Int(1), Value::Int(2), Value::Int(3)]);

        let cursor = CursorData::from_row(&rows[0], &spec).unwrap();
        let pred = build_cursor_predicate(Some(&cursor), &spec).unwrap();

        let matched: Vec<_> = rows.iter().filter(|r| pred.matches(*r)).collect();
        assert_eq!(matched, [&rows[1], &rows[2]]);
    }

    #[test]
    fn test_middle_row_cursor_matches_only_later_rows() {
        // Order is {1,T2}, {2,T2}, {3,T1}.
        let spec = SortSpec::parse("-created_at,id", &[]).unwrap();
        let rows = [row(1, ts(2)), row(2, ts(2)), row(3, ts(1))];

        let cursor = CursorData::new().int("id", 2).field("created_at", ts(2));
        let pred = build_cursor_predicate(Some(&cursor), &spec).unwrap();

        let matched: Vec<_> = rows.iter().filter(|r| pred.matches(*r)).collect();
        assert_eq!(matched, [&rows[2]]);
    }

    #[test]
    fn test_tie_break_desc_resumes_after_middle_row() {
        let spec = SortSpec::parse("-created_at,-id", &[]).unwrap();
        let rows = [row(1, ts(2)), row(2, ts(2)), row(3, ts(1))];

        let mut sorted: Vec<_> = rows.iter().collect();
        sorted.sort_by(|a, b| spec.compare(*a, *b));
        assert_eq!(sorted, [&rows[1], &rows[0], &rows[2]]);

        let cursor = CursorData::from_row(&rows[0], &spec).unwrap();
        let pred = build_cursor_predicate(Some(&cursor), &spec).unwrap();
        let matched: Vec<_> = rows.iter().filter(|r| pred.matches(*r)).collect();
        assert_eq!(matched, [&rows[2]]);
    }

    #[test]
    fn test_missing_cursor_field_is_error() {
        let spec = SortSpec::parse("-created_at,id", &[]).unwrap();
        let cursor = CursorData::new().int("id", 1);
        assert_eq!(
            build_cursor_predicate(Some(&cursor), &spec),
            Err(CursorError::MissingField {
                field: "created_at".to_string()
            })
        );
    }

    #[test]
    fn test_asc_after_null_selects_non_null() {
        let spec = SortSpec::parse("created_at?,id", &[]).unwrap();
        let rows = [
            row(1, Value::Null),
            row(2, Value::Null),
            row(3, ts(1)),
            row(4, ts(2)),
        ];

        let cursor = CursorData::from_row(&rows[0], &spec).unwrap();
        let pred = build_cursor_predicate(Some(&cursor), &spec).unwrap();

        let ids: Vec<i64> = rows
            .iter()
            .filter(|r| pred.matches(*r))
            .filter_map(|r| match r[0].1 {
                Value::Int(id) => Some(id),
                _ => None,
            })
            .collect();
        assert_eq!(ids, [2, 3, 4]);
    }

    #[test]
    fn test_desc_nullable_admits_trailing_nulls() {
        let spec = SortSpec::parse("-created_at?,id", &[]).unwrap();
        let rows = [row(1, ts(2)), row(2, ts(1)), row(3, Value::Null), row(4, Value::Null)];

        let cursor = CursorData::from_row(&rows[0], &spec).unwrap();
        let pred = build_cursor_predicate(Some(&cursor), &spec).unwrap();
        let matched: Vec<_> = rows.iter().filter(|r| pred.matches(*r)).collect();
        assert_eq!(matched, [&rows[1], &rows[2], &rows[3]]);

        let cursor = CursorData::from_row(&rows[2], &spec).unwrap();
        let pred = build_cursor_predicate(Some(&cursor), &spec).unwrap();
        let matched: Vec<_> = rows.iter().filter(|r| pred.matches(*r)).collect();
        assert_eq!(matched, [&rows[3]]);
    }

    #[test]
    fn test_desc_after_null_single_key_is_never() {
        let spec = SortSpec::parse("-deleted_at?", &[]).unwrap();
        let cursor = CursorData::new().null("deleted_at");
        assert_eq!(
            build_cursor_predicate(Some(&cursor), &spec).unwrap(),
            Predicate::Never
        );
    }

    #[test]
    fn test_null_cursor_on_non_nullable_key_is_error() {
        let spec = SortSpec::parse("-created_at,id", &[]).unwrap();
        let cursor = CursorData::new().null("created_at").int("id", 5);
        assert_eq!(
            build_cursor_predicate(Some(&cursor), &spec),
            Err(CursorError::NullValue {
                field: "created_at".to_string()
            })
        );
    }

    #[test]
    fn test_non_nullable_desc_has_no_null_branch() {
        let spec = SortSpec::parse("-score", &[]).unwrap();
        let cursor = CursorData::new().int("score", 5);
        let pred = build_cursor_predicate(Some(&cursor), &spec).unwrap();
        assert!(matches!(pred, Predicate::Compare(_)));
    }
}
