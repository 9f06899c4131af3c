//! Sort specifications, predicates and their SQL rendering.

mod eval;
mod filter;
mod select;
mod sort;
mod types;

// Re-export all public items
pub use eval::Row;
pub use filter::render_predicate;
pub use select::{PageQuery, QueryResult, order_by_clause};
pub use sort::{SortSpec, SortSpecError};
pub use types::{
    Comparison, CompoundPredicate, LogicalOp, Operator, Predicate, SortDir, SortKey, Value, and,
    or, simple,
};
