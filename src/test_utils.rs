/// # Test Utilities Module
///
/// Shared fixtures for the unit tests:
/// - an in-memory SQLite client seeded with sample data
/// - a recording backend that captures statement text without a database

use crate::core::db::{Backend, Cursor, DriverKind, Row, SqliteBackend, TypedQueryClient};
use crate::core::Result;
use rusqlite::Connection;
use std::cell::RefCell;
use std::rc::Rc;

const SAMPLE_SCHEMA: &str = "
    CREATE TABLE users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        active BOOLEAN DEFAULT TRUE,
        profile_data TEXT
    );

    CREATE TABLE posts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        title TEXT NOT NULL,
        FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
    );

    INSERT INTO users (username, email) VALUES ('alice', 'alice@example.com');
    INSERT INTO users (username, email) VALUES ('bob', 'bob@example.com');
    INSERT INTO users (username, email) VALUES ('charlie', 'charlie@example.com');

    INSERT INTO posts (user_id, title) VALUES (1, 'Welcome to Rust');
    INSERT INTO posts (user_id, title) VALUES (2, 'My Trip to Paris');
";

/// In-memory SQLite client with `users` (3 rows) and `posts` (2 rows).
pub fn sample_client() -> TypedQueryClient {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(SAMPLE_SCHEMA).unwrap();
    TypedQueryClient::with_backend(Box::new(SqliteBackend::from_connection(conn)))
}

/// Backend that records every statement it is given and returns no rows.
pub struct RecordingBackend {
    statements: Rc<RefCell<Vec<String>>>,
}

impl RecordingBackend {
    /// Returns the backend and a handle on its statement log.
    pub fn new() -> (Self, Rc<RefCell<Vec<String>>>) {
        let statements = Rc::new(RefCell::new(Vec::new()));
        (
            RecordingBackend {
                statements: Rc::clone(&statements),
            },
            statements,
        )
    }
}

struct EmptyCursor;

impl Cursor for EmptyCursor {
    fn columns(&self) -> Vec<String> {
        Vec::new()
    }

    fn fetch_one(&mut self) -> Result<Option<Row>> {
        Ok(None)
    }

    fn fetch_all(&mut self) -> Result<Vec<Row>> {
        Ok(Vec::new())
    }
}

impl Backend for RecordingBackend {
    fn driver(&self) -> DriverKind {
        DriverKind::Postgres
    }

    fn execute(&mut self, sql: &str) -> Result<u64> {
        self.statements.borrow_mut().push(sql.to_string());
        Ok(0)
    }

    fn prepare<'a>(&'a mut self, sql: &str) -> Result<Box<dyn Cursor + 'a>> {
        self.statements.borrow_mut().push(sql.to_string());
        Ok(Box::new(EmptyCursor))
    }

    fn last_insert_id(&mut self) -> i64 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_client_has_data() {
        let mut client = sample_client();
        assert_eq!(client.get_table_count("users"), 3);
        assert_eq!(client.get_table_count("posts"), 2);
    }

    #[test]
    fn test_recording_backend_captures_statements() {
        let (backend, log) = RecordingBackend::new();
        let mut client = TypedQueryClient::with_backend(Box::new(backend));
        assert_eq!(client.exec("DELETE FROM t"), 0);
        assert_eq!(client.get_table_count("t"), -1);
        assert_eq!(*log.borrow(), vec!["DELETE FROM t", "SELECT COUNT(*) FROM t"]);
    }
}
