/// Kebab Error Module
///
/// This module defines the error type shared by the database client, the
/// configuration loader and the command-line front end.
use thiserror::Error;

/// Error type for the kebab crate.
///
/// Most query failures never surface as a `KebabError` at the client
/// boundary: `TypedQueryClient` records them in its error log and hands
/// back a default or sentinel. The variants below are what the connection
/// layer, the configuration loader and the CLI propagate.
#[derive(Error, Debug)]
pub enum KebabError {
    /// Errors raised by the SQLite backend
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Errors raised by the PostgreSQL backend
    #[cfg(feature = "postgres")]
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] postgres::Error),

    /// Errors raised by the MySQL backend
    #[cfg(feature = "mysql")]
    #[error("MySQL error: {0}")]
    Mysql(#[from] mysql::Error),

    /// The connection could not be established
    #[error("Connection error: {0}")]
    Connect(String),

    /// SQL statement errors that do not come from a driver
    #[error("Query error: {0}")]
    Query(String),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Type alias for Result to use KebabError as the error type.
pub type Result<T> = std::result::Result<T, KebabError>;
