// Core infrastructure modules
pub mod core;

// Helpers built around the database client
pub mod config;
pub mod html_select;
pub mod request;

#[cfg(test)]
mod test_utils;

pub use crate::core::db::{ConnectionDescriptor, DriverKind, Fields, QueryOutcome, SqlValue, TypedQueryClient};
pub use crate::core::{KebabError, Result};
