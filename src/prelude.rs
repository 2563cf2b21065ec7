//! Convenience re-exports for common recordhaus usage
//!
//! # Example
//!
//! ```rust
//! use recordhaus::prelude::*;
//!
//! let filter = FilterSpec::new().with("name", Comparison::Contains, "Ad");
//! assert!(!filter.is_empty());
//! ```

// Engine and façade
pub use crate::controller::{Controller, ListMode, ListView, Returning, Saved};
pub use crate::core::Engine;
pub use crate::errors::EngineError;

// Re-export centralized config
pub use config::{AppConfig, ConfigError, DatabaseConfig, DatabaseKind};

// Re-export commonly used store-object types for convenience
pub use store_object::prelude::*;

// Re-export store_object module for macro-generated code
pub use store_object;

// Re-export table derive for model creation
pub use table_derive::{model, Record};

// Common external dependencies
pub use anyhow;
pub use async_trait;
pub use sqlx;
pub use tokio;
