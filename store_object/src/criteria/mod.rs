//! Declarative query criteria
//!
//! Filter, order and join specifications plus record selectors. Each can be
//! parsed from its JSON form or built in code, and is checked against a
//! record's `Schema` before it reaches the store.

pub mod filter;
pub mod join;
pub mod order;
pub mod selector;

pub use filter::{Comparison, Condition, FieldFilter, FilterSpec};
pub use join::{Join, JoinSpec, ResolvedJoin};
pub use order::OrderSpec;
pub use selector::Selector;
