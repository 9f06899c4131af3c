//! Page query builder: the storage side of the page assembly protocol.

use serde::Serialize;

use crate::dialect::Dialect;
use crate::pagination::{CursorData, CursorError, PageSize, build_cursor_predicate};
use crate::validate::assert_valid_sql_identifier;

use super::filter::render_predicate;
use super::sort::SortSpec;
use super::types::{Predicate, Value};

/// Rendered SQL and its parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryResult {
    /// SQL text with dialect placeholders
    pub sql: String,
    /// Parameter values
    pub params: Vec<Value>,
}

/// Builds `SELECT ... WHERE <filter> AND <seek> ORDER BY <spec> LIMIT <size + 1>`.
///
/// # Example
///
/// ```
/// use keyseek::{CursorData, PageSize, SortSpec, postgres};
///
/// let spec = SortSpec::parse("-created_at,id", &[]).unwrap();
/// let cursor = CursorData::new().text("created_at", "2024-01-15").int("id", 42);
///
/// let result = postgres("comments", &spec)
///     .fields(&["id", "content", "created_at"])
///     .cursor(Some(cursor))
///     .page_size(PageSize::new(20).unwrap())
///     .build()
///     .unwrap();
///
/// assert_eq!(
///     result.sql,
///     "SELECT id, content, created_at FROM comments \
///      WHERE (created_at < $1 OR (created_at = $2 AND id > $3)) \
///      ORDER BY created_at DESC, id ASC LIMIT 21"
/// );
/// assert_eq!(result.params.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct PageQuery<D: Dialect> {
    dialect: D,
    table: String,
    fields: Vec<String>,
    spec: SortSpec,
    filter: Predicate,
    cursor: Option<CursorData>,
    page_size: PageSize,
}

impl<D: Dialect> PageQuery<D> {
    /// Create a page query over `table`, ordered by `spec`.
    ///
    /// # Panics
    ///
    /// Panics if the table name is not a valid SQL identifier.
    pub fn new(dialect: D, table: impl Into<String>, spec: &SortSpec) -> Self {
        let table = table.into();
        assert_valid_sql_identifier(&table, "table");
        Self {
            dialect,
            table,
            fields: Vec::new(),
            spec: spec.clone(),
            filter: Predicate::Always,
            cursor: None,
            page_size: PageSize::default(),
        }
    }

    /// Set the fields to SELECT; all columns if never called.
    ///
    /// # Panics
    ///
    /// Panics if any field name is not a valid SQL identifier.
    pub fn fields(mut self, fields: &[&str]) -> Self {
        for field in fields {
            assert_valid_sql_identifier(field, "field");
        }
        self.fields = fields.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// AND a caller filter into the WHERE clause.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter = std::mem::take(&mut self.filter).and_also(predicate);
        self
    }

    /// Resume after this cursor; `None` is the first page.
    pub fn cursor(mut self, cursor: Option<CursorData>) -> Self {
        self.cursor = cursor;
        self
    }

    /// Set the page size. The query fetches one extra row.
    pub fn page_size(mut self, size: PageSize) -> Self {
        self.page_size = size;
        self
    }

    /// Build the SQL query and parameters.
    ///
    /// Fails if the cursor does not carry exactly the sort fields.
    pub fn build(self) -> Result<QueryResult, CursorError> {
        let seek = build_cursor_predicate(self.cursor.as_ref(), &self.spec)?;

        let select_str = if self.fields.is_empty() {
            "*".to_string()
        } else {
            self.fields.join(", ")
        };
        let mut sql = format!("SELECT {} FROM {}", select_str, self.table);
        let mut params = Vec::new();
        let mut param_idx = 1usize;

        // WHERE clause: caller filter first, then the seek condition
        let conditions: Vec<&Predicate> = [&self.filter, &seek]
            .into_iter()
            .filter(|p| !p.is_always())
            .collect();
        if !conditions.is_empty() {
            let mut rendered = Vec::with_capacity(conditions.len());
            for predicate in conditions {
                let (condition, new_params, new_idx) =
                    render_predicate(&self.dialect, predicate, param_idx);
                rendered.push(condition);
                params.extend(new_params);
                param_idx = new_idx;
            }
            sql.push_str(" WHERE ");
            sql.push_str(&rendered.join(" AND "));
        }

        sql.push_str(" ORDER BY ");
        sql.push_str(&order_by_clause(&self.spec));
        sql.push_str(&format!(" LIMIT {}", self.page_size.fetch_limit()));

        Ok(QueryResult { sql, params })
    }
}

/// ORDER BY list for `spec`, with an explicit `NULLS` clause on nullable keys.
///
/// The clause places nulls before every value, matching the seek predicate.
#[must_use]
pub fn order_by_clause(spec: &SortSpec) -> String {
    spec.keys()
        .iter()
        .map(|key| {
            if key.nullable {
                format!("{} {} {}", key.field, key.dir.as_sql(), key.dir.nulls_sql())
            } else {
                format!("{} {}", key.field, key.dir.as_sql())
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::types::{Operator, simple};
    use crate::dialect::{Postgres, Sqlite};

    fn spec() -> SortSpec {
        SortSpec::parse("-created_at,id", &[]).unwrap()
    }

    #[test]
    fn test_first_page() {
        let result = PageQuery::new(Postgres, "comments", &spec()).build().unwrap();
        assert_eq!(
            result.sql,
            "SELECT * FROM comments ORDER BY created_at DESC, id ASC LIMIT 11"
        );
        assert!(result.params.is_empty());
    }

    #[test]
    fn test_filter_and_cursor_numbering() {
        let cursor = CursorData::new().text("created_at", "2024-01-15").int("id", 7);
        let result = PageQuery::new(Sqlite, "comments", &spec())
            .fields(&["id", "content"])
            .filter(simple("post_id", Operator::Eq, 3i64))
            .cursor(Some(cursor))
            .page_size(PageSize::new(5).unwrap())
            .build()
            .unwrap();

        assert_eq!(
            result.sql,
            "SELECT id, content FROM comments WHERE post_id = ?1 AND \
             (created_at < ?2 OR (created_at = ?3 AND id > ?4)) \
             ORDER BY created_at DESC, id ASC LIMIT 6"
        );
        assert_eq!(
            result.params,
            [
                Value::Int(3),
                Value::Text("2024-01-15".into()),
                Value::Text("2024-01-15".into()),
                Value::Int(7),
            ]
        );
    }

    #[test]
    fn test_nullable_keys_get_nulls_clause() {
        let spec = SortSpec::parse("-published_at?,title?,id", &[]).unwrap();
        assert_eq!(
            order_by_clause(&spec),
            "published_at DESC NULLS LAST, title ASC NULLS FIRST, id ASC"
        );
    }

    #[test]
    fn test_cursor_after_last_null_desc() {
        let spec = SortSpec::parse("-deleted_at?", &[]).unwrap();
        let result = PageQuery::new(Postgres, "items", &spec)
            .cursor(Some(CursorData::new().null("deleted_at")))
            .build()
            .unwrap();
        assert_eq!(
            result.sql,
            "SELECT * FROM items WHERE FALSE ORDER BY deleted_at DESC NULLS LAST LIMIT 11"
        );
    }

    #[test]
    fn test_cursor_mismatch_is_error() {
        let err = PageQuery::new(Postgres, "comments", &spec())
            .cursor(Some(CursorData::new().int("id", 1)))
            .build()
            .unwrap_err();
        assert!(matches!(err, CursorError::MissingField { .. }));
    }

    #[test]
    #[should_panic(expected = "Invalid SQL table")]
    fn test_rejects_bad_table() {
        let _ = PageQuery::new(Postgres, "comments; DROP TABLE x", &spec());
    }
}
