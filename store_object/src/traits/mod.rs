//! Traits for record types and record stores
//!
//! This module contains the traits that define the interface between the
//! access object, the record types it manages and the store it talks to.

pub mod record;
pub mod store;

// Re-export all public items for convenience
pub use record::Record;
pub use store::{RecordStore, StoreSession};
