//! Predicate to SQL rendering.

use super::types::{Comparison, CompoundPredicate, LogicalOp, Operator, Predicate, Value};
use crate::dialect::Dialect;

/// Render a predicate as a parameterized SQL condition.
///
/// Placeholders are numbered from `start_idx`. Returns the SQL fragment, the parameters
/// in placeholder order, and the next free placeholder index.
pub fn render_predicate<D: Dialect>(
    dialect: &D,
    predicate: &Predicate,
    start_idx: usize,
) -> (String, Vec<Value>, usize) {
    match predicate {
        Predicate::Always => (dialect.bool_lit(true).to_string(), vec![], start_idx),
        Predicate::Never => (dialect.bool_lit(false).to_string(), vec![], start_idx),
        Predicate::Compare(cmp) => render_comparison(dialect, cmp, start_idx),
        Predicate::Compound(compound) => render_compound(dialect, compound, start_idx),
    }
}

fn render_compound<D: Dialect>(
    dialect: &D,
    compound: &CompoundPredicate,
    start_idx: usize,
) -> (String, Vec<Value>, usize) {
    if compound.predicates.is_empty() {
        let empty_result = compound.op == LogicalOp::And;
        return (dialect.bool_lit(empty_result).to_string(), vec![], start_idx);
    }

    let mut idx = start_idx;
    let mut all_params = Vec::new();
    let mut conditions = Vec::with_capacity(compound.predicates.len());

    for predicate in &compound.predicates {
        let (condition, params, new_idx) = render_predicate(dialect, predicate, idx);
        conditions.push(condition);
        all_params.extend(params);
        idx = new_idx;
    }

    let sql = if conditions.len() == 1 {
        conditions.swap_remove(0)
    } else {
        let joiner = match compound.op {
            LogicalOp::And => " AND ",
            LogicalOp::Or => " OR ",
        };
        format!("({})", conditions.join(joiner))
    };

    (sql, all_params, idx)
}

fn render_comparison<D: Dialect>(
    dialect: &D,
    cmp: &Comparison,
    idx: usize,
) -> (String, Vec<Value>, usize) {
    let field = &cmp.field;
    match (cmp.op, &cmp.value) {
        (Operator::Eq, Value::Null) => (format!("{field} IS NULL"), vec![], idx),
        (Operator::Ne, Value::Null) => (format!("{field} IS NOT NULL"), vec![], idx),
        // Ordered comparison with NULL is never true.
        (_, Value::Null) => (dialect.bool_lit(false).to_string(), vec![], idx),
        (op, value) => {
            let sql = format!("{} {} {}", field, op.as_sql(), dialect.param(idx));
            (sql, vec![value.clone()], idx + 1)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::types::{and, or, simple};
    use crate::dialect::{Postgres, Sqlite};

    #[test]
    fn test_eq_null_postgres() {
        let (sql, params, idx) =
            render_predicate(&Postgres, &simple("deleted_at", Operator::Eq, Value::Null), 1);
        assert_eq!(sql, "deleted_at IS NULL");
        assert!(params.is_empty());
        assert_eq!(idx, 1);
    }

    #[test]
    fn test_ne_null_sqlite() {
        let (sql, params, idx) =
            render_predicate(&Sqlite, &simple("deleted_at", Operator::Ne, Value::Null), 3);
        assert_eq!(sql, "deleted_at IS NOT NULL");
        assert!(params.is_empty());
        assert_eq!(idx, 3);
    }

    #[test]
    fn test_ordered_null_comparison_is_false() {
        let (sql, params, _) =
            render_predicate(&Postgres, &simple("score", Operator::Gt, Value::Null), 1);
        assert_eq!(sql, "FALSE");
        assert!(params.is_empty());
    }

    #[test]
    fn test_parameter_numbering() {
        let pred = or(vec![
            simple("created_at", Operator::Lt, "2024-01-01"),
            and(vec![
                simple("created_at", Operator::Eq, "2024-01-01"),
                simple("id", Operator::Gt, 100i64),
            ]),
        ]);

        let (sql, params, idx) = render_predicate(&Postgres, &pred, 1);
        assert_eq!(
            sql,
            "(created_at < $1 OR (created_at = $2 AND id > $3))"
        );
        assert_eq!(params.len(), 3);
        assert_eq!(params[2], Value::Int(100));
        assert_eq!(idx, 4);

        let (sql, _, _) = render_predicate(&Sqlite, &pred, 5);
        assert_eq!(sql, "(created_at < ?5 OR (created_at = ?6 AND id > ?7))");
    }

    #[test]
    fn test_single_child_compound_is_unwrapped() {
        let (sql, _, _) = render_predicate(&Postgres, &and(vec![simple("id", Operator::Gte, 1i64)]), 1);
        assert_eq!(sql, "id >= $1");
    }

    #[test]
    fn test_constants_and_empty_compounds() {
        assert_eq!(render_predicate(&Postgres, &Predicate::Always, 1).0, "TRUE");
        assert_eq!(render_predicate(&Sqlite, &Predicate::Never, 1).0, "0");
        assert_eq!(render_predicate(&Postgres, &and(vec![]), 1).0, "TRUE");
        assert_eq!(render_predicate(&Postgres, &or(vec![]), 1).0, "FALSE");
    }
}
