/// Backend Module
///
/// The connection layer underneath `TypedQueryClient`. A backend owns one
/// live connection and exposes just enough to run statements, walk a
/// cursor, quote literals and read the last generated identity value.
///
/// ## Failure points
///
/// `Backend::prepare` failing means the statement never produced a cursor.
/// `Cursor::fetch_one`/`Cursor::fetch_all` failing means it did, but pulling
/// rows raised. The client keeps these two apart.

use super::driver::{ConnectionDescriptor, DriverKind};
use super::value::{Row, SqlValue};
use crate::core::{KebabError, Result};
use rusqlite::{Connection, Statement};
use tracing::debug;

/// A live connection to one database.
pub trait Backend {
    /// Driver this backend speaks.
    fn driver(&self) -> DriverKind;

    /// Runs a statement for its side effect and returns the affected row count.
    fn execute(&mut self, sql: &str) -> Result<u64>;

    /// Prepares and starts a query, returning a cursor over its rows.
    fn prepare<'a>(&'a mut self, sql: &str) -> Result<Box<dyn Cursor + 'a>>;

    /// Quotes a value as a literal for this driver.
    fn quote(&self, value: &SqlValue) -> String {
        self.driver().quote(value)
    }

    /// Identity value generated by the most recent insert on this connection.
    fn last_insert_id(&mut self) -> i64;
}

/// Pending result rows of one prepared query.
pub trait Cursor {
    /// Column names, in select-list order.
    fn columns(&self) -> Vec<String>;

    /// Pulls the first row, if any.
    fn fetch_one(&mut self) -> Result<Option<Row>>;

    /// Pulls every row.
    fn fetch_all(&mut self) -> Result<Vec<Row>>;

    /// Releases the cursor and the statement behind it.
    fn close(self: Box<Self>) {}
}

/// Opens the built-in backend for a descriptor and issues the session
/// encoding statement.
pub fn open(descriptor: &ConnectionDescriptor) -> Result<Box<dyn Backend>> {
    let mut backend: Box<dyn Backend> = match descriptor.driver {
        DriverKind::Sqlite => Box::new(SqliteBackend::open(&descriptor.connection_string)?),
        #[cfg(feature = "mysql")]
        DriverKind::Mysql => Box::new(super::mysql_backend::MysqlBackend::open(&descriptor.connection_string)?),
        #[cfg(not(feature = "mysql"))]
        DriverKind::Mysql => {
            return Err(KebabError::Connect(
                "mysql support is not enabled in this build (enable the `mysql` feature)".to_string(),
            ))
        }
        #[cfg(feature = "postgres")]
        DriverKind::Postgres => Box::new(super::postgres_backend::PostgresBackend::open(&descriptor.connection_string)?),
        #[cfg(not(feature = "postgres"))]
        DriverKind::Postgres => {
            return Err(KebabError::Connect(
                "postgres support is not enabled in this build (enable the `postgres` feature)".to_string(),
            ))
        }
    };

    let encoding = descriptor.driver.encoding_statement();
    debug!("Setting session encoding: {}", encoding);
    backend
        .execute(encoding)
        .map_err(|e| KebabError::Connect(format!("Failed to set session encoding: {}", e)))?;

    Ok(backend)
}

/// SQLite backend on top of rusqlite.
#[derive(Debug)]
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Opens a database file, or an in-memory database for `:memory:`.
    pub fn open(path: &str) -> Result<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(|e| KebabError::Connect(format!("Failed to open '{}': {}", path, e)))?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| KebabError::Connect(format!("Failed to configure '{}': {}", path, e)))?;

        Ok(SqliteBackend { conn })
    }

    /// Wraps an already open rusqlite connection.
    pub fn from_connection(conn: Connection) -> Self {
        SqliteBackend { conn }
    }
}

impl Backend for SqliteBackend {
    fn driver(&self) -> DriverKind {
        DriverKind::Sqlite
    }

    fn execute(&mut self, sql: &str) -> Result<u64> {
        // Pragmas and similar statements may hand back a row; step through
        // it instead of letting `execute` reject the statement.
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.raw_query();
        while rows.next()?.is_some() {}
        drop(rows);
        drop(stmt);
        Ok(self.conn.changes())
    }

    fn prepare<'a>(&'a mut self, sql: &str) -> Result<Box<dyn Cursor + 'a>> {
        let stmt = self.conn.prepare(sql)?;
        Ok(Box::new(SqliteCursor { stmt }))
    }

    fn last_insert_id(&mut self) -> i64 {
        self.conn.last_insert_rowid()
    }
}

struct SqliteCursor<'conn> {
    stmt: Statement<'conn>,
}

fn read_row(row: &rusqlite::Row<'_>, width: usize) -> Result<Row> {
    let mut values = Vec::with_capacity(width);
    for i in 0..width {
        values.push(SqlValue::from(row.get_ref(i)?));
    }
    Ok(values)
}

impl Cursor for SqliteCursor<'_> {
    fn columns(&self) -> Vec<String> {
        self.stmt.column_names().into_iter().map(String::from).collect()
    }

    fn fetch_one(&mut self) -> Result<Option<Row>> {
        let width = self.stmt.column_count();
        let mut rows = self.stmt.query([])?;
        match rows.next()? {
            Some(row) => Ok(Some(read_row(row, width)?)),
            None => Ok(None),
        }
    }

    fn fetch_all(&mut self) -> Result<Vec<Row>> {
        let width = self.stmt.column_count();
        let mut rows = self.stmt.query([])?;
        let mut all = Vec::new();
        while let Some(row) = rows.next()? {
            all.push(read_row(row, width)?);
        }
        Ok(all)
    }
}
