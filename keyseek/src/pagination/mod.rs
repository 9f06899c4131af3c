//! Keyset pagination: cursor data, continuation tokens, seek predicates and page assembly.
//!
//! # Flow
//!
//! 1. Decode the request's `cursor` parameter against the endpoint's [`SortSpec`]
//!    with [`decode_token`]. No token means the first page.
//! 2. Build the seek predicate with [`build_cursor_predicate`] and AND it with the
//!    caller's filter (or let [`PageQuery`] do both).
//! 3. Fetch [`PageSize::fetch_limit`] rows in spec order.
//! 4. [`Page::assemble`] keeps one page and encodes the next token from its last row.
//!
//! ```
//! use keyseek::{Page, PageSize, SortSpec, Value, build_cursor_predicate, decode_token};
//!
//! let spec = SortSpec::parse("-created_at,id", &[]).unwrap();
//! let size = PageSize::parse(Some("2")).unwrap();
//!
//! let table: Vec<Vec<(String, Value)>> = [(1, "2024-01-03"), (2, "2024-01-02"), (3, "2024-01-01")]
//!     .into_iter()
//!     .map(|(id, at)| {
//!         vec![
//!             ("id".to_string(), Value::Int(id)),
//!             ("created_at".to_string(), Value::Text(at.to_string())),
//!         ]
//!     })
//!     .collect();
//!
//! let mut token: Option<String> = None;
//! let mut seen = Vec::new();
//! loop {
//!     let cursor = decode_token(token.as_deref(), &spec).unwrap();
//!     let seek = build_cursor_predicate(cursor.as_ref(), &spec).unwrap();
//!     let mut rows: Vec<_> = table.iter().filter(|r| seek.matches(*r)).cloned().collect();
//!     rows.sort_by(|a, b| spec.compare(a, b));
//!     rows.truncate(size.fetch_limit() as usize);
//!
//!     let page = Page::assemble(rows, size, &spec).unwrap();
//!     seen.extend(page.data.iter().map(|r| r[0].1.clone()));
//!     match page.next_cursor {
//!         Some(next) => token = Some(next.into_string()),
//!         None => break,
//!     }
//! }
//! assert_eq!(seen, [Value::Int(1), Value::Int(2), Value::Int(3)]);
//! ```
//!
//! [`SortSpec`]: crate::SortSpec
//! [`PageQuery`]: crate::PageQuery

mod cursor;
mod encoding;
mod keyset;
mod page;
mod token;
mod value_conv;

// Re-export all public items
pub use cursor::{CursorData, CursorError};
pub use keyset::{KeysetCondition, build_cursor_predicate};
pub use page::{DEFAULT_PAGE_SIZE, LimitError, Page, PageSize};
pub use token::{ContinuationToken, DecodedToken, TokenError, decode_token, encode_token, parse_token};
