//! Page size parsing and page envelope assembly.

use std::fmt;
use std::num::NonZeroU32;

use serde::Serialize;

use super::cursor::{CursorData, CursorError};
use super::token::{ContinuationToken, encode_token};
use crate::builder::{Row, SortSpec};

/// Page size used when the request carries no `limit`.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// A validated, positive page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageSize(NonZeroU32);

impl PageSize {
    /// Create a page size; `None` for zero.
    #[must_use]
    pub const fn new(size: u32) -> Option<Self> {
        match NonZeroU32::new(size) {
            Some(size) => Some(Self(size)),
            None => None,
        }
    }

    /// Parse a `limit` query parameter.
    ///
    /// Absent or empty input yields [`DEFAULT_PAGE_SIZE`]. Anything that is not a positive
    /// integer is rejected; there is no silent fallback to the default.
    pub fn parse<'a>(limit: impl Into<Option<&'a str>>) -> Result<Self, LimitError> {
        let input = match limit.into() {
            None | Some("") => return Ok(Self::default()),
            Some(input) => input,
        };

        let n: i64 = input.parse().map_err(|_| LimitError::NotANumber {
            input: input.to_string(),
        })?;
        if n <= 0 {
            return Err(LimitError::NotPositive { requested: n });
        }
        u32::try_from(n)
            .ok()
            .and_then(Self::new)
            .ok_or(LimitError::TooLarge {
                max: u32::MAX,
                requested: n,
            })
    }

    /// Reject sizes above `max`.
    pub fn ensure_at_most(self, max: u32) -> Result<Self, LimitError> {
        if self.get() > max {
            return Err(LimitError::TooLarge {
                max,
                requested: i64::from(self.get()),
            });
        }
        Ok(self)
    }

    /// The page size.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// Rows to request from storage: one more than the page size, to detect a next page.
    #[inline]
    #[must_use]
    pub fn fetch_limit(self) -> u64 {
        u64::from(self.0.get()) + 1
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(NonZeroU32::MIN.saturating_add(DEFAULT_PAGE_SIZE - 1))
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An invalid `limit` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LimitError {
    /// The value is not an integer.
    NotANumber {
        /// The rejected input
        input: String,
    },
    /// The value is zero or negative.
    NotPositive {
        /// The rejected value
        requested: i64,
    },
    /// The value exceeds the configured maximum.
    TooLarge {
        /// The maximum allowed page size
        max: u32,
        /// The rejected value
        requested: i64,
    },
}

impl fmt::Display for LimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotANumber { input } => write!(f, "limit '{input}' is not a number"),
            Self::NotPositive { requested } => {
                write!(f, "limit must be a positive integer, got {requested}")
            },
            Self::TooLarge { max, requested } => {
                write!(f, "limit {requested} exceeds maximum {max}")
            },
        }
    }
}

impl std::error::Error for LimitError {}

/// One page of results, serialized as `{ "data": [...], "nextCursor": ..., "hasNext": ... }`.
///
/// # Example
///
/// ```
/// use keyseek::{Page, PageSize, SortSpec, Value};
///
/// let spec = SortSpec::parse("id", &[]).unwrap();
/// let rows: Vec<Vec<(String, Value)>> = (1..=3)
///     .map(|id| vec![("id".to_string(), Value::Int(id))])
///     .collect();
///
/// // Storage was asked for size + 1 = 3 rows and returned all of them.
/// let page = Page::assemble(rows, PageSize::new(2).unwrap(), &spec).unwrap();
/// assert_eq!(page.data.len(), 2);
/// assert!(page.has_next);
/// assert!(page.next_cursor.is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// The visible rows, at most one page size.
    pub data: Vec<T>,
    /// Token for the next page, present exactly when `has_next` is.
    pub next_cursor: Option<ContinuationToken>,
    /// Whether storage returned more rows than the page size.
    pub has_next: bool,
}

impl<T> Page<T> {
    /// A page with no rows and no successor.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            data: Vec::new(),
            next_cursor: None,
            has_next: false,
        }
    }

    /// Assemble a page from rows fetched with [`PageSize::fetch_limit`].
    ///
    /// Keeps the first `size` rows and, when more were returned, encodes the next token
    /// from the last kept row projected onto `spec`.
    pub fn assemble(rows: Vec<T>, size: PageSize, spec: &SortSpec) -> Result<Self, CursorError>
    where
        T: Row,
    {
        Self::assemble_with(rows, size, spec, |row| CursorData::from_row(row, spec))
    }

    /// Like [`Page::assemble`], with a custom projection from row to cursor data.
    pub fn assemble_with<F>(
        mut rows: Vec<T>,
        size: PageSize,
        spec: &SortSpec,
        cursor_of: F,
    ) -> Result<Self, CursorError>
    where
        F: FnOnce(&T) -> Result<CursorData, CursorError>,
    {
        let size = usize::try_from(size.get()).unwrap_or(usize::MAX);
        let has_next = rows.len() > size;
        rows.truncate(size);

        let next_cursor = match rows.last() {
            Some(last) if has_next => Some(encode_token(&cursor_of(last)?, spec)?),
            _ => None,
        };

        Ok(Self {
            data: rows,
            next_cursor,
            has_next,
        })
    }

    /// Convert each row, keeping the cursor.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            data: self.data.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
            has_next: self.has_next,
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}
