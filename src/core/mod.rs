/// Core Module for kebab
///
/// This module holds the database access layer and the shared error type.
/// The request and HTML helpers live at the crate root and only depend on
/// this module for errors.

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{KebabError, Result};
