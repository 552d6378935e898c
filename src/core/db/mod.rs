/// Database Module
///
/// The database access layer of kebab, split by concern:
/// - **Driver description** (`driver.rs`): driver kinds, connection descriptors, quoting
/// - **Values** (`value.rs`): column values, rows and ordered field maps
/// - **Connection layer** (`backend.rs`, `postgres_backend.rs`, `mysql_backend.rs`): backends and cursors
/// - **Statement text** (`statement.rs`): insert/update/count builders
/// - **Client** (`client.rs`): `TypedQueryClient`, the typed getter API
///
/// ## Usage
///
/// ```no_run
/// use kebab::core::db::{ConnectionDescriptor, Fields, TypedQueryClient};
///
/// let mut db = TypedQueryClient::connect_or_exit(&ConnectionDescriptor::sqlite_memory());
/// db.exec("CREATE TABLE kebabs (id INTEGER PRIMARY KEY, name TEXT)");
/// let id = db.insert("kebabs", &Fields::new().with("name", "doner"));
/// assert_eq!(db.get_string(&format!("SELECT name FROM kebabs WHERE id = {}", id), ""), "doner");
/// ```
pub mod backend;
pub mod client;
pub mod driver;
#[cfg(feature = "mysql")]
pub mod mysql_backend;
#[cfg(feature = "postgres")]
pub mod postgres_backend;
pub mod statement;
pub mod value;

pub use backend::{Backend, Cursor, SqliteBackend};
pub use client::{ErrorLog, QueryOutcome, TypedQueryClient, FATAL_EXIT_CODE};
pub use driver::{ConnectionDescriptor, DriverKind};
pub use value::{AssocRow, Fields, Row, SqlValue};
