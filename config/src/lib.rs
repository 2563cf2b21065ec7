//! # Configuration Management for recordhaus
//!
//! Database settings come from environment variables (optionally seeded from a
//! `.env` file) or from the `[database]` table of a TOML file.
//!
//! ## Environment
//!
//! | variable             | meaning                                  |
//! |----------------------|------------------------------------------|
//! | `DB_TYPE`            | `mysql`, `sqlite` or `postgres` (required) |
//! | `DB_NAME`            | database name, or file stem for SQLite   |
//! | `DB_HOST`, `DB_PORT` | server address (not used by SQLite)      |
//! | `DB_USER`, `DB_PASS` | credentials (not used by SQLite)         |
//! | `DB_MIN_CONNECTIONS`, `DB_MAX_CONNECTIONS`, `DB_CONNECT_TIMEOUT`, `DB_IDLE_TIMEOUT`, `DB_MAX_LIFETIME` | pool settings |
//!
//! ## TOML File Configuration
//! ```toml
//! [database]
//! type = "postgres"
//! host = "localhost"
//! port = 5432
//! database = "myapp"
//! username = "postgres"
//! password = "password"
//! min_connections = 1
//! max_connections = 10
//! connection_timeout_seconds = 30
//! idle_timeout_seconds = 600
//! max_lifetime_seconds = 3600
//! ```
//!
//! Load configuration:
//! ```rust,no_run
//! use config::{AppConfig, DatabaseConfig};
//!
//! // recordhaus.toml, the file named by RECORDHAUS_CONFIG, or the DB_* variables
//! let config = AppConfig::load()?;
//!
//! // Or only the environment
//! let database = DatabaseConfig::from_env()?;
//! # Ok::<(), config::ConfigError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::{env, path::Path};
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "./recordhaus.toml";
const CONFIG_PATH_VARIABLE: &str = "RECORDHAUS_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Dotenvy error: {0}")]
    Dotenvy(#[from] dotenvy::Error),
    #[error("Environment variable {0} is not set")]
    Missing(&'static str),
    #[error("Unsupported database type '{0}', expected mysql, sqlite or postgres")]
    UnsupportedDatabase(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Supported database backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    MySql,
    Sqlite,
    #[serde(alias = "postgresql")]
    Postgres,
}

impl DatabaseKind {
    pub fn default_port(&self) -> u16 {
        match self {
            DatabaseKind::MySql => 3306,
            DatabaseKind::Postgres => 5432,
            DatabaseKind::Sqlite => 0,
        }
    }

    /// Whether the backend is reached over the network
    pub fn is_server(&self) -> bool {
        !matches!(self, DatabaseKind::Sqlite)
    }
}

impl FromStr for DatabaseKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(DatabaseKind::MySql),
            "sqlite" => Ok(DatabaseKind::Sqlite),
            "postgres" | "postgresql" => Ok(DatabaseKind::Postgres),
            _ => Err(ConfigError::UnsupportedDatabase(s.to_string())),
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DatabaseKind::MySql => "mysql",
            DatabaseKind::Sqlite => "sqlite",
            DatabaseKind::Postgres => "postgres",
        })
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(rename = "type")]
    pub kind: DatabaseKind,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    pub database: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_seconds: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_seconds: u64,
}

fn default_min_connections() -> u32 {
    1
}

fn default_max_connections() -> u32 {
    5
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}

fn default_max_lifetime() -> u64 {
    3600
}

/// Load `.env` into the process environment; a missing file is fine
fn load_dotenv() -> Result<(), ConfigError> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

impl AppConfig {
    /// Load configuration from the TOML file named in the environment, the
    /// default TOML file, or the `DB_*` variables, in that order
    pub fn load() -> Result<Self, ConfigError> {
        load_dotenv()?;

        if let Ok(config_path) = env::var(CONFIG_PATH_VARIABLE) {
            Self::from_file(&config_path)
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::from_file(DEFAULT_CONFIG_PATH)
        } else {
            Ok(Self {
                database: DatabaseConfig::from_vars(|name| env::var(name).ok())?,
            })
        }
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.database.fill_defaults();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()
    }
}

impl DatabaseConfig {
    /// Create a new database configuration with default pool settings
    pub fn new(
        kind: DatabaseKind,
        host: String,
        port: u16,
        database: String,
        username: String,
        password: String,
    ) -> Self {
        Self {
            kind,
            host,
            port,
            database,
            username,
            password,
            min_connections: default_min_connections(),
            max_connections: default_max_connections(),
            connection_timeout_seconds: default_connection_timeout(),
            idle_timeout_seconds: default_idle_timeout(),
            max_lifetime_seconds: default_max_lifetime(),
        }
    }

    /// SQLite database file `<name>.db`
    pub fn sqlite(database: &str) -> Self {
        Self::new(
            DatabaseKind::Sqlite,
            String::new(),
            0,
            database.to_string(),
            String::new(),
            String::new(),
        )
    }

    /// Read the `DB_*` variables after loading an optional `.env` file
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv()?;
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Build from a variable lookup
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let kind: DatabaseKind = lookup("DB_TYPE")
            .ok_or(ConfigError::Missing("DB_TYPE"))?
            .parse()?;
        let database = lookup("DB_NAME").ok_or(ConfigError::Missing("DB_NAME"))?;

        let mut config = Self::new(
            kind,
            lookup("DB_HOST").unwrap_or_default(),
            parse_var(&lookup, "DB_PORT")?.unwrap_or(0),
            database,
            lookup("DB_USER").unwrap_or_default(),
            lookup("DB_PASS").unwrap_or_default(),
        );

        if let Some(value) = parse_var(&lookup, "DB_MIN_CONNECTIONS")? {
            config.min_connections = value;
        }
        if let Some(value) = parse_var(&lookup, "DB_MAX_CONNECTIONS")? {
            config.max_connections = value;
        }
        if let Some(value) = parse_var(&lookup, "DB_CONNECT_TIMEOUT")? {
            config.connection_timeout_seconds = value;
        }
        if let Some(value) = parse_var(&lookup, "DB_IDLE_TIMEOUT")? {
            config.idle_timeout_seconds = value;
        }
        if let Some(value) = parse_var(&lookup, "DB_MAX_LIFETIME")? {
            config.max_lifetime_seconds = value;
        }

        config.fill_defaults();
        config.validate()?;
        Ok(config)
    }

    fn fill_defaults(&mut self) {
        if self.port == 0 {
            self.port = self.kind.default_port();
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.is_empty() {
            return Err(ConfigError::Invalid(
                "Database name cannot be empty".to_string(),
            ));
        }
        if self.kind.is_server() {
            if self.host.is_empty() {
                return Err(ConfigError::Invalid(
                    "Database host cannot be empty".to_string(),
                ));
            }
            if self.port == 0 {
                return Err(ConfigError::Invalid(
                    "Database port cannot be zero".to_string(),
                ));
            }
            if self.username.is_empty() {
                return Err(ConfigError::Invalid(
                    "Database username cannot be empty".to_string(),
                ));
            }
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "Database max_connections must be greater than 0".to_string(),
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(ConfigError::Invalid(
                "Database min_connections cannot be greater than max_connections".to_string(),
            ));
        }
        if self.connection_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "Database connection_timeout_seconds must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Build connection string; credentials are percent-encoded
    pub fn connection_string(&self) -> String {
        let username = urlencoding::encode(&self.username);
        let password = urlencoding::encode(&self.password);
        match self.kind {
            DatabaseKind::MySql => format!(
                "mysql://{}:{}@{}:{}/{}",
                username, password, self.host, self.port, self.database
            ),
            DatabaseKind::Postgres => format!(
                "postgres://{}:{}@{}:{}/{}",
                username, password, self.host, self.port, self.database
            ),
            DatabaseKind::Sqlite if self.database == ":memory:" => "sqlite::memory:".to_string(),
            DatabaseKind::Sqlite => format!("sqlite://{}.db", self.database),
        }
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
            ConfigError::Invalid(format!("{} must be a number, found '{}'", name, raw))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn builds_server_connection_strings() {
        let config = DatabaseConfig::from_vars(vars(&[
            ("DB_TYPE", "mysql"),
            ("DB_NAME", "people"),
            ("DB_HOST", "db"),
            ("DB_PORT", "3307"),
            ("DB_USER", "app"),
            ("DB_PASS", "secret"),
        ]))
        .unwrap();
        assert_eq!(config.connection_string(), "mysql://app:secret@db:3307/people");

        let config = DatabaseConfig::from_vars(vars(&[
            ("DB_TYPE", "Postgres"),
            ("DB_NAME", "people"),
            ("DB_HOST", "db"),
            ("DB_USER", "app"),
        ]))
        .unwrap();
        assert_eq!(config.port, 5432);
        assert_eq!(config.connection_string(), "postgres://app:@db:5432/people");
    }

    #[test]
    fn credentials_are_percent_encoded() {
        let config = DatabaseConfig::from_vars(vars(&[
            ("DB_TYPE", "postgres"),
            ("DB_NAME", "people"),
            ("DB_HOST", "db"),
            ("DB_USER", "app@corp"),
            ("DB_PASS", "p@ss:w/rd"),
        ]))
        .unwrap();
        assert_eq!(
            config.connection_string(),
            "postgres://app%40corp:p%40ss%3Aw%2Frd@db:5432/people"
        );
    }

    #[test]
    fn sqlite_needs_only_a_name() {
        let config =
            DatabaseConfig::from_vars(vars(&[("DB_TYPE", "sqlite"), ("DB_NAME", "people")])).unwrap();
        assert_eq!(config.connection_string(), "sqlite://people.db");
        assert_eq!(DatabaseConfig::sqlite(":memory:").connection_string(), "sqlite::memory:");
    }

    #[test]
    fn missing_or_unsupported_type_is_rejected() {
        let err = DatabaseConfig::from_vars(vars(&[("DB_NAME", "people")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DB_TYPE")));

        let err = DatabaseConfig::from_vars(vars(&[("DB_TYPE", "oracle"), ("DB_NAME", "people")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedDatabase(ref kind) if kind == "oracle"));
    }

    #[test]
    fn pool_settings_are_parsed_and_validated() {
        let config = DatabaseConfig::from_vars(vars(&[
            ("DB_TYPE", "sqlite"),
            ("DB_NAME", "people"),
            ("DB_MAX_CONNECTIONS", "12"),
            ("DB_IDLE_TIMEOUT", "30"),
        ]))
        .unwrap();
        assert_eq!(config.max_connections, 12);
        assert_eq!(config.idle_timeout_seconds, 30);

        let err = DatabaseConfig::from_vars(vars(&[
            ("DB_TYPE", "sqlite"),
            ("DB_NAME", "people"),
            ("DB_MAX_CONNECTIONS", "many"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = DatabaseConfig::from_vars(vars(&[
            ("DB_TYPE", "sqlite"),
            ("DB_NAME", "people"),
            ("DB_MIN_CONNECTIONS", "8"),
            ("DB_MAX_CONNECTIONS", "2"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn server_backends_need_a_host() {
        let err = DatabaseConfig::from_vars(vars(&[("DB_TYPE", "postgres"), ("DB_NAME", "people")]))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid configuration: Database host cannot be empty");
    }

    #[test]
    fn parses_toml_database_table() {
        let config = AppConfig::from_toml(
            r#"
            [database]
            type = "postgresql"
            host = "localhost"
            database = "people"
            username = "postgres"
            max_connections = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.database.kind, DatabaseKind::Postgres);
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.database.min_connections, 1);
    }
}
