//! Query builder utilities
//!
//! A `QueryBuilder` is a store-neutral description of a query: conditions,
//! ordering, limit/offset and eager-load joins. `SqlGenerator` renders it for
//! one `Dialect`.

pub mod builder;
pub mod dialect;
pub mod filter;
pub mod ordering;
pub mod pagination;
pub mod sql_generation;


pub use builder::QueryBuilder;
pub use dialect::Dialect;
pub use filter::{LogicalOperator, QueryCondition, QueryFilter, QueryOperator};
pub use ordering::SortOrder;
pub use pagination::{Page, Pagination, DEFAULT_PAGE, DEFAULT_PER_PAGE};
pub use sql_generation::{SqlGenerator, Statement};
