/// Driver Module
///
/// Describes which database a `TypedQueryClient` talks to and the small
/// amount of per-driver behaviour the client needs: the session encoding
/// statement issued at connect time and the literal quoting rules.

use super::value::SqlValue;
use crate::core::{KebabError, Result};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Supported database drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    #[serde(alias = "pgsql")]
    Postgres,
    Mysql,
    Sqlite,
}

impl DriverKind {
    /// Statement forcing UTF-8 text encoding for the session.
    pub fn encoding_statement(&self) -> &'static str {
        match self {
            DriverKind::Postgres => "SET CLIENT_ENCODING TO 'UTF8'",
            DriverKind::Mysql => "SET CHARACTER SET utf8, NAMES utf8",
            DriverKind::Sqlite => "PRAGMA encoding = 'UTF-8'",
        }
    }

    /// Quotes a value as a string literal the way the driver's own escaping does.
    ///
    /// Used when no live connection is at hand; `MysqlBackend` quotes through
    /// its driver instead. `NULL` quotes to `''`; callers wanting a literal
    /// `NULL` must check first.
    pub fn quote(&self, value: &SqlValue) -> String {
        let text = value.to_text();
        let mut quoted = String::with_capacity(text.len() + 2);
        quoted.push('\'');
        match self {
            DriverKind::Mysql => {
                for c in text.chars() {
                    match c {
                        '\\' => quoted.push_str("\\\\"),
                        '\'' => quoted.push_str("\\'"),
                        '"' => quoted.push_str("\\\""),
                        '\0' => quoted.push_str("\\0"),
                        '\n' => quoted.push_str("\\n"),
                        '\r' => quoted.push_str("\\r"),
                        '\x1a' => quoted.push_str("\\Z"),
                        other => quoted.push(other),
                    }
                }
            }
            DriverKind::Postgres | DriverKind::Sqlite => {
                for c in text.chars() {
                    if c == '\'' {
                        quoted.push('\'');
                    }
                    quoted.push(c);
                }
            }
        }
        quoted.push('\'');
        quoted
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DriverKind::Postgres => "postgres",
            DriverKind::Mysql => "mysql",
            DriverKind::Sqlite => "sqlite",
        };
        f.write_str(name)
    }
}

impl FromStr for DriverKind {
    type Err = KebabError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pgsql" | "postgres" | "postgresql" => Ok(DriverKind::Postgres),
            "mysql" => Ok(DriverKind::Mysql),
            "sqlite" | "sqlite3" => Ok(DriverKind::Sqlite),
            other => Err(KebabError::Config(format!("Unknown database driver '{}'", other))),
        }
    }
}

/// Resolved connection settings, immutable for the life of a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub driver: DriverKind,
    pub connection_string: String,
}

impl ConnectionDescriptor {
    pub fn new(driver: DriverKind, connection_string: impl Into<String>) -> Self {
        ConnectionDescriptor {
            driver,
            connection_string: connection_string.into(),
        }
    }

    /// In-memory SQLite database, mostly for tests.
    pub fn sqlite_memory() -> Self {
        ConnectionDescriptor::new(DriverKind::Sqlite, ":memory:")
    }

    /// Parses a PDO-style DSN.
    ///
    /// `sqlite:<path>` and `sqlite::memory:` keep everything after the prefix,
    /// `pgsql:`/`postgres:` keep the parameter list, and MySQL accepts a
    /// `mysql://` URL which is kept whole.
    pub fn from_dsn(dsn: &str) -> Result<Self> {
        let dsn = dsn.trim();
        if dsn.starts_with("mysql://") {
            return Ok(ConnectionDescriptor::new(DriverKind::Mysql, dsn));
        }
        if dsn.starts_with("postgres://") || dsn.starts_with("postgresql://") {
            return Ok(ConnectionDescriptor::new(DriverKind::Postgres, dsn));
        }

        let (prefix, rest) = dsn
            .split_once(':')
            .ok_or_else(|| KebabError::Config(format!("DSN '{}' has no driver prefix", dsn)))?;
        let driver: DriverKind = prefix.parse()?;
        if rest.is_empty() {
            return Err(KebabError::Config(format!("DSN '{}' has no connection string", dsn)));
        }
        Ok(ConnectionDescriptor::new(driver, rest))
    }
}
