use thiserror::Error;

/// Failures reported by a record store session
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// A unique or primary-key constraint rejected the write
    #[error("Unique constraint violated: {message}")]
    UniqueViolation {
        constraint: Option<String>,
        columns: Vec<String>,
        message: String,
    },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Unknown field '{field}' on table {table}")]
    UnknownField { table: &'static str, field: String },

    #[error("Database error: {0}")]
    Database(String),
}

/// Errors surfaced by the access object and the controller
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DaoError {
    /// Bad pagination bounds, mismatched selectors, unknown names or values that do not coerce
    #[error("{0}")]
    Argument(String),

    #[error("{model} not found with {selector}")]
    NotFound {
        model: &'static str,
        selector: String,
    },

    #[error("Error {action} {model}. Duplicate entry: {}.", describe_entry(.columns, .values, .detail))]
    DuplicateKey {
        model: &'static str,
        action: &'static str,
        columns: Vec<String>,
        values: Vec<String>,
        detail: String,
    },

    #[error("{message} when {action} {model} in the database.")]
    Persistence {
        model: &'static str,
        action: &'static str,
        message: String,
    },
}

impl DaoError {
    pub fn argument(message: impl Into<String>) -> Self {
        DaoError::Argument(message.into())
    }

    pub fn persistence(model: &'static str, action: &'static str, err: impl std::fmt::Display) -> Self {
        DaoError::Persistence {
            model,
            action,
            message: err.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DaoError::NotFound { .. })
    }
}

fn describe_entry(columns: &[String], values: &[String], detail: &str) -> String {
    if columns.is_empty() {
        return detail.to_string();
    }
    columns
        .iter()
        .zip(values.iter().map(String::as_str).chain(std::iter::repeat("?")))
        .map(|(column, value)| format!("{} = {}", column, value))
        .collect::<Vec<_>>()
        .join(", ")
}
