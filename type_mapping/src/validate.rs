//! Identifier validation
//!
//! Table and column names end up inside generated SQL. The macro rejects
//! names that could not be used as plain identifiers on every dialect.

use std::fmt;

/// Longest identifier accepted by all supported backends (PostgreSQL limit)
pub const MAX_IDENTIFIER_LENGTH: usize = 63;

const RESERVED_KEYWORDS: &[&str] = &[
    "SELECT", "INSERT", "UPDATE", "DELETE", "FROM", "WHERE", "JOIN", "ON", "AS", "AND", "OR",
    "NOT", "NULL", "TRUE", "FALSE", "IN", "LIKE", "ORDER", "BY", "GROUP", "HAVING", "LIMIT",
    "OFFSET", "UNION", "DISTINCT", "CREATE", "DROP", "ALTER", "TABLE", "INDEX", "PRIMARY",
    "FOREIGN", "REFERENCES", "UNIQUE", "DEFAULT", "CONSTRAINT",
];

/// Validation errors for database identifiers
#[derive(Debug, Clone, PartialEq)]
pub enum IdentifierError {
    Empty,
    TooLong { name: String, length: usize },
    /// Must start with a letter or underscore
    InvalidStartCharacter(String),
    /// Only alphanumeric characters and underscores are allowed
    InvalidCharacters(String),
    ReservedKeyword(String),
}

impl fmt::Display for IdentifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierError::Empty => write!(f, "Name cannot be empty"),
            IdentifierError::TooLong { name, length } => write!(
                f,
                "Name '{}' is too long: {} characters (max {})",
                name, length, MAX_IDENTIFIER_LENGTH
            ),
            IdentifierError::InvalidStartCharacter(name) => {
                write!(f, "Name '{}' must start with a letter or underscore", name)
            }
            IdentifierError::InvalidCharacters(name) => write!(
                f,
                "Invalid characters in name '{}': only alphanumeric characters and underscores are allowed",
                name
            ),
            IdentifierError::ReservedKeyword(name) => {
                write!(f, "Name '{}' is a reserved SQL keyword", name)
            }
        }
    }
}

impl std::error::Error for IdentifierError {}

/// Check that `name` can be used as a table or column identifier
pub fn validate_identifier(name: &str) -> Result<(), IdentifierError> {
    let first_char = name.chars().next().ok_or(IdentifierError::Empty)?;

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(IdentifierError::TooLong {
            name: name.to_string(),
            length: name.len(),
        });
    }

    if !first_char.is_ascii_alphabetic() && first_char != '_' {
        return Err(IdentifierError::InvalidStartCharacter(name.to_string()));
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(IdentifierError::InvalidCharacters(name.to_string()));
    }

    if RESERVED_KEYWORDS.contains(&name.to_uppercase().as_str()) {
        return Err(IdentifierError::ReservedKeyword(name.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_names() {
        assert!(validate_identifier("persons").is_ok());
        assert!(validate_identifier("_tax_id2").is_ok());
    }

    #[test]
    fn rejects_bad_names() {
        assert_eq!(validate_identifier(""), Err(IdentifierError::Empty));
        assert!(matches!(
            validate_identifier("2fast"),
            Err(IdentifierError::InvalidStartCharacter(_))
        ));
        assert!(matches!(
            validate_identifier("drop;table"),
            Err(IdentifierError::InvalidCharacters(_))
        ));
        assert!(matches!(
            validate_identifier("select"),
            Err(IdentifierError::ReservedKeyword(_))
        ));
        assert!(matches!(
            validate_identifier(&"a".repeat(64)),
            Err(IdentifierError::TooLong { length: 64, .. })
        ));
    }
}
