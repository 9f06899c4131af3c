// =============================================================================
// CRATE-LEVEL QUALITY LINTS (following Tokio/Serde standards)
// =============================================================================
#![forbid(unsafe_code)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]
#![warn(unreachable_pub)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
// =============================================================================
// CLIPPY CONFIGURATION
// =============================================================================
#![allow(clippy::doc_markdown)] // Code items in docs - extensive doc changes needed
#![allow(clippy::missing_errors_doc)] // # Errors sections - doc-heavy
#![allow(clippy::missing_panics_doc)] // # Panics sections - doc-heavy
#![allow(clippy::module_name_repetitions)] // Type names matching module - acceptable
#![allow(clippy::return_self_not_must_use)] // Builder pattern methods return Self
#![allow(clippy::must_use_candidate)] // Builder methods - fluent API doesn't need must_use
#![allow(clippy::format_push_string)] // String building style preference
// Key/value vectors are zipped or sliced after their lengths are checked
#![allow(clippy::indexing_slicing)]
#![allow(clippy::double_must_use)] // Functions returning must_use types can have their own docs

//! # keyseek - Keyset Pagination Core
//!
//! Resume a multi-column ordered scan from the last row a client saw, without OFFSET.
//!
//! - [`SortSpec`] describes the order: `created_at` descending, then `id` ascending.
//! - [`encode_token`] / [`decode_token`] turn the last row's sort values into an opaque,
//!   URL-safe continuation token and back, rejecting tokens issued for another order.
//! - [`build_cursor_predicate`] produces the "strictly after this row" condition.
//! - [`PageQuery`] renders it into Postgres or `SQLite` SQL; [`Page`] assembles the
//!   `{ data, nextCursor, hasNext }` envelope.
//!
//! The crate holds no state, performs no I/O and never logs.
//!
//! ## Quick Start
//!
//! ```
//! # use keyseek::prelude::*;
//! let spec = SortSpec::parse("-created_at,id", &[]).unwrap();
//!
//! // First request: no cursor
//! let cursor = decode_token(None::<&str>, &spec).unwrap();
//! let query = postgres("comments", &spec)
//!     .fields(&["id", "content", "created_at"])
//!     .cursor(cursor)
//!     .page_size(PageSize::parse(Some("10")).unwrap())
//!     .build()
//!     .unwrap();
//! assert_eq!(
//!     query.sql,
//!     "SELECT id, content, created_at FROM comments ORDER BY created_at DESC, id ASC LIMIT 11"
//! );
//!
//! // Later request: resume after the last row of the previous page
//! let last = CursorData::new().text("created_at", "2024-01-15T10:00:00Z").int("id", 42);
//! let token = encode_token(&last, &spec).unwrap();
//!
//! let cursor = decode_token(token.as_str(), &spec).unwrap();
//! let query = postgres("comments", &spec).cursor(cursor).build().unwrap();
//! assert!(query.sql.contains("WHERE (created_at < $1 OR (created_at = $2 AND id > $3))"));
//! ```
//!
//! ## Null Ordering
//!
//! Nulls sort before every value: `NULLS FIRST` for ascending keys and `NULLS LAST` for
//! descending ones. Mark nullable columns with [`SortKey::nullable`] (or a trailing `?` in a
//! sort string) so the seek predicate and ORDER BY both account for them.

mod builder;
mod dialect;
mod pagination;
mod validate;

pub use builder::{
    Comparison, CompoundPredicate, LogicalOp, Operator, PageQuery, Predicate, QueryResult, Row,
    SortDir, SortKey, SortSpec, SortSpecError, Value, and, or, order_by_clause, render_predicate,
    simple,
};
pub use dialect::{Dialect, Postgres, Sqlite};
pub use pagination::{
    ContinuationToken, CursorData, CursorError, DEFAULT_PAGE_SIZE, DecodedToken, KeysetCondition,
    LimitError, Page, PageSize, TokenError, build_cursor_predicate, decode_token, encode_token,
    parse_token,
};
pub use validate::{assert_valid_sql_identifier, is_valid_sql_identifier};

/// Build a page query for Postgres.
///
/// Convenience function that creates a `PageQuery` with Postgres dialect.
#[must_use]
pub fn postgres(table: &str, spec: &SortSpec) -> PageQuery<Postgres> {
    PageQuery::new(Postgres, table, spec)
}

/// Build a page query for `SQLite`.
///
/// Convenience function that creates a `PageQuery` with `SQLite` dialect.
#[must_use]
pub fn sqlite(table: &str, spec: &SortSpec) -> PageQuery<Sqlite> {
    PageQuery::new(Sqlite, table, spec)
}

/// Prelude module for convenient imports.
///
/// ```
/// use keyseek::prelude::*;
/// let spec = SortSpec::new([SortKey::asc("id")]).unwrap();
/// let result = sqlite("users", &spec).build().unwrap();
/// assert_eq!(result.sql, "SELECT * FROM users ORDER BY id ASC LIMIT 11");
/// ```
pub mod prelude {
    pub use crate::{
        ContinuationToken, CursorData, CursorError, Dialect, LimitError, Operator, Page,
        PageQuery, PageSize, Postgres, Predicate, QueryResult, Row, SortDir, SortKey, SortSpec,
        SortSpecError, Sqlite, TokenError, Value, and, build_cursor_predicate, decode_token,
        encode_token, or, postgres, simple, sqlite,
    };
}
