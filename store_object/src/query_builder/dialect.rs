//! SQL dialects
//!
//! Rendering differences between the supported backends: identifier quoting,
//! parameter placeholders and LIMIT/OFFSET forms.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Postgres,
    MySql,
    Sqlite,
}

impl Dialect {
    /// Quote an identifier that was validated against the schema
    pub fn quote(&self, identifier: &str) -> String {
        match self {
            Dialect::MySql => format!("`{}`", identifier),
            Dialect::Postgres | Dialect::Sqlite => format!("\"{}\"", identifier),
        }
    }

    /// Placeholder for the `index`th (1-based) bound parameter
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", index),
            Dialect::MySql | Dialect::Sqlite => "?".to_string(),
        }
    }

    /// Most bound parameters one statement may carry
    pub fn max_params(&self) -> usize {
        match self {
            Dialect::Postgres | Dialect::MySql => 65_535,
            Dialect::Sqlite => 32_766,
        }
    }

    /// Build LIMIT/OFFSET clause
    pub fn limit_clause(&self, limit: Option<i64>, offset: Option<i64>) -> String {
        match (limit, offset) {
            (None, None) => String::new(),
            (Some(limit), None) => format!("LIMIT {}", limit),
            (Some(limit), Some(offset)) => format!("LIMIT {} OFFSET {}", limit, offset),
            (None, Some(offset)) => match self {
                Dialect::Postgres => format!("OFFSET {}", offset),
                // MySQL has no bare OFFSET; use the documented "all rows" limit
                Dialect::MySql => format!("LIMIT 18446744073709551615 OFFSET {}", offset),
                Dialect::Sqlite => format!("LIMIT -1 OFFSET {}", offset),
            },
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
        };
        f.write_str(name)
    }
}
