/// Typed Query Client Module
///
/// `TypedQueryClient` wraps one backend connection and exposes typed
/// getters, a side-effect `exec`, and small insert/update builders.
///
/// ## Error handling
///
/// Apart from connecting, nothing here returns an error. A failed prepare
/// or fetch is appended to the client's `ErrorLog` and the caller gets a
/// default value or a `QueryOutcome` variant instead. `get_last_error()` reads
/// the newest entry.
///
/// ## Concurrency
///
/// The last insert id and the error log are plain mutable state. Use one
/// client per caller; do not share one across threads.

use super::backend::{self, Backend, Cursor};
use super::driver::ConnectionDescriptor;
use super::statement::{count_sql, insert_sql, is_insert_statement, update_sql};
use super::value::{AssocRow, Fields, Row, SqlValue};
use crate::core::Result;
use tracing::{debug, error, info, warn};

/// Process exit status used when the initial connection fails.
pub const FATAL_EXIT_CODE: i32 = 255;

/// Outcome of a row or table getter.
///
/// The three cases stay distinct: the statement could not be prepared,
/// the statement ran but fetching raised, or rows were fetched (possibly
/// none).
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome<T> {
    /// The statement could not be prepared.
    NotPrepared,
    /// The statement was prepared but fetching its rows raised.
    FetchFailed,
    /// Rows were fetched.
    Fetched(T),
}

impl<T> QueryOutcome<T> {
    pub fn is_fetched(&self) -> bool {
        matches!(self, QueryOutcome::Fetched(_))
    }

    /// Converts into the fetched value, dropping the failure distinction.
    pub fn fetched(self) -> Option<T> {
        match self {
            QueryOutcome::Fetched(value) => Some(value),
            _ => None,
        }
    }

    /// Legacy sentinel: `None` when not prepared, `Some(-1)` when the
    /// fetch raised, `Some(0)` otherwise.
    pub fn legacy_code(&self) -> Option<i64> {
        match self {
            QueryOutcome::NotPrepared => None,
            QueryOutcome::FetchFailed => Some(-1),
            QueryOutcome::Fetched(_) => Some(0),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> QueryOutcome<U> {
        match self {
            QueryOutcome::NotPrepared => QueryOutcome::NotPrepared,
            QueryOutcome::FetchFailed => QueryOutcome::FetchFailed,
            QueryOutcome::Fetched(value) => QueryOutcome::Fetched(f(value)),
        }
    }
}

/// Append-only, chronological log of recoverable errors.
#[derive(Debug, Default, Clone)]
pub struct ErrorLog {
    entries: Vec<String>,
}

impl ErrorLog {
    pub fn push(&mut self, entry: impl Into<String>) {
        let entry = entry.into();
        warn!("{}", entry);
        self.entries.push(entry);
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Which shape of rows a getter wants from the cursor.
enum Fetch {
    One,
    All,
}

enum Fetched {
    One(Option<Row>),
    All(Vec<Row>),
}

/// Typed query client over a single connection.
pub struct TypedQueryClient {
    backend: Box<dyn Backend>,
    errors: ErrorLog,
    last_insert_id: i64,
}

impl TypedQueryClient {
    /// Opens the connection described by `descriptor` and sets the session
    /// encoding.
    pub fn connect(descriptor: &ConnectionDescriptor) -> Result<Self> {
        info!("Connecting to {} database", descriptor.driver);
        let backend = backend::open(descriptor)?;
        Ok(TypedQueryClient::with_backend(backend))
    }

    /// Like `connect`, but a failure prints `Error!: <message>` and ends the
    /// process with `FATAL_EXIT_CODE`.
    pub fn connect_or_exit(descriptor: &ConnectionDescriptor) -> Self {
        match TypedQueryClient::connect(descriptor) {
            Ok(client) => client,
            Err(e) => {
                error!("Could not connect to {} database: {}", descriptor.driver, e);
                eprintln!("Error!: {}", e);
                std::process::exit(FATAL_EXIT_CODE);
            }
        }
    }

    /// Wraps a backend that is already connected.
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        TypedQueryClient {
            backend,
            errors: ErrorLog::default(),
            last_insert_id: 0,
        }
    }

    /// Runs `sql`, fetches in the requested shape and always releases the cursor.
    ///
    /// Returns the column names alongside the rows.
    fn run_query(&mut self, sql: &str, fetch: Fetch) -> QueryOutcome<(Vec<String>, Fetched)> {
        debug!("Query: {}", sql);
        let mut cursor = match self.backend.prepare(sql) {
            Ok(cursor) => cursor,
            Err(e) => {
                self.errors.push(format!("Failed to prepare statement: {}", e));
                return QueryOutcome::NotPrepared;
            }
        };

        let fetched = match fetch {
            Fetch::One => cursor.fetch_one().map(Fetched::One),
            Fetch::All => cursor.fetch_all().map(Fetched::All),
        };
        let columns = cursor.columns();
        Cursor::close(cursor);

        match fetched {
            Ok(rows) => QueryOutcome::Fetched((columns, rows)),
            Err(e) => {
                self.errors.push(format!("Failed to fetch rows: {}", e));
                QueryOutcome::FetchFailed
            }
        }
    }

    fn query_one(&mut self, sql: &str) -> QueryOutcome<(Vec<String>, Option<Row>)> {
        self.run_query(sql, Fetch::One).map(|(columns, fetched)| match fetched {
            Fetched::One(row) => (columns, row),
            Fetched::All(rows) => (columns, rows.into_iter().next()),
        })
    }

    fn query_all(&mut self, sql: &str) -> QueryOutcome<(Vec<String>, Vec<Row>)> {
        self.run_query(sql, Fetch::All).map(|(columns, fetched)| match fetched {
            Fetched::All(rows) => (columns, rows),
            Fetched::One(row) => (columns, row.into_iter().collect()),
        })
    }

    /// First column of the first row, if the query produced one.
    ///
    /// Failures and empty results are logged.
    fn first_value(&mut self, sql: &str) -> Option<SqlValue> {
        match self.query_one(sql) {
            QueryOutcome::Fetched((_, Some(row))) => match row.into_iter().next() {
                Some(value) => Some(value),
                None => {
                    self.errors.push(format!("Query returned no columns: {}", sql));
                    None
                }
            },
            QueryOutcome::Fetched((_, None)) => {
                self.errors.push(format!("Query returned no rows: {}", sql));
                None
            }
            _ => None,
        }
    }

    /// First column of the first row as an integer, or `default`.
    ///
    /// Non-integer values (text other than `-?[0-9]+`, any real, `NULL`)
    /// give `default` without being logged.
    pub fn get_integer(&mut self, sql: &str, default: i64) -> i64 {
        self.first_value(sql)
            .and_then(|value| value.as_integer())
            .unwrap_or(default)
    }

    /// First column of the first row when it is textual, or `default`.
    pub fn get_string(&mut self, sql: &str, default: impl Into<String>) -> String {
        self.first_value(sql)
            .and_then(|value| value.as_text().map(String::from))
            .unwrap_or_else(|| default.into())
    }

    /// First row keyed by column name. `Fetched(None)` when no row matched.
    pub fn get_row_associative(&mut self, sql: &str) -> QueryOutcome<Option<AssocRow>> {
        self.query_one(sql)
            .map(|(columns, row)| row.map(|row| AssocRow::from_columns(&columns, row)))
    }

    /// Every row keyed by column name.
    pub fn get_array_associative(&mut self, sql: &str) -> QueryOutcome<Vec<AssocRow>> {
        self.query_all(sql).map(|(columns, rows)| {
            rows.into_iter()
                .map(|row| AssocRow::from_columns(&columns, row))
                .collect()
        })
    }

    /// First row by position. `Fetched(None)` when no row matched.
    pub fn get_row(&mut self, sql: &str) -> QueryOutcome<Option<Row>> {
        self.query_one(sql).map(|(_, row)| row)
    }

    /// Every row by position.
    pub fn get_array(&mut self, sql: &str) -> QueryOutcome<Vec<Row>> {
        self.query_all(sql).map(|(_, rows)| rows)
    }

    /// `SELECT COUNT(*)` over `table`, or `-1` on any failure.
    ///
    /// The table name is interpolated verbatim.
    pub fn get_table_count(&mut self, table: &str) -> i64 {
        match self.query_one(&count_sql(table)) {
            QueryOutcome::Fetched((_, Some(row))) => row
                .first()
                .and_then(|value| value.as_integer())
                .filter(|count| *count >= 0)
                .unwrap_or(-1),
            _ => -1,
        }
    }

    /// Runs a statement for its side effect; returns affected rows or `-1`.
    ///
    /// An insert-shaped statement that affected rows records the generated
    /// identity for `get_last_insert_id`; one that affected none is logged.
    pub fn exec(&mut self, sql: &str) -> i64 {
        debug!("Exec: {}", sql);
        match self.backend.execute(sql) {
            Ok(affected) => {
                if is_insert_statement(sql) {
                    if affected >= 1 {
                        self.last_insert_id = self.backend.last_insert_id();
                    } else {
                        self.errors.push(format!("Insert affected no rows: {}", sql));
                    }
                }
                affected as i64
            }
            Err(e) => {
                self.errors.push(format!("Failed to execute statement: {}", e));
                -1
            }
        }
    }

    /// Alias for `exec`.
    pub fn execute(&mut self, sql: &str) -> i64 {
        self.exec(sql)
    }

    /// Identity captured by the last insert-shaped `exec`; reading resets it to zero.
    pub fn get_last_insert_id(&mut self) -> i64 {
        std::mem::take(&mut self.last_insert_id)
    }

    /// Inserts one row and returns the new identity, or `0` when nothing was inserted.
    pub fn insert(&mut self, table: &str, fields: &Fields) -> i64 {
        let sql = insert_sql(self.backend.as_ref(), table, fields);
        if self.exec(&sql) > 0 {
            self.backend.last_insert_id()
        } else {
            0
        }
    }

    /// Updates rows matching every `predicate` pair; returns affected rows or `-1`.
    ///
    /// An empty predicate is a caller error: it is logged and nothing runs.
    /// A null predicate value is compared as a quoted empty literal, which
    /// never matches SQL `NULL`; that case is logged as a warning.
    pub fn update(&mut self, table: &str, fields: &Fields, predicate: &Fields) -> i64 {
        if predicate.is_empty() {
            let message = format!("Refusing UPDATE on {} without a WHERE predicate", table);
            error!("{}", message);
            self.errors.push(message);
            return -1;
        }
        for (column, value) in predicate.iter() {
            if value.is_null() {
                warn!("UPDATE on {} compares {} against a quoted NULL", table, column);
            }
        }

        let sql = update_sql(self.backend.as_ref(), table, fields, predicate);
        self.exec(&sql)
    }

    /// Newest error log entry, if any.
    pub fn get_last_error(&self) -> Option<&str> {
        self.errors.last()
    }

    pub fn error_log(&self) -> &ErrorLog {
        &self.errors
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{sample_client, RecordingBackend};

    #[test]
    fn test_get_integer() {
        let mut client = sample_client();
        assert_eq!(client.get_integer("SELECT 42", 0), 42);
        assert_eq!(client.get_integer("SELECT 'abc'", 7), 7);
        assert_eq!(client.get_integer("SELECT NULL", 7), 7);
        assert_eq!(client.get_integer("SELECT '123'", 7), 123);
        assert_eq!(client.get_integer("SELECT 1.5", 7), 7);
        assert_eq!(client.get_integer("SELECT 4.0", -9), -9);
        assert_eq!(client.get_integer("SELECT '+5'", -9), -9);
        assert_eq!(client.get_integer("SELECT '-12'", -9), -12);
    }

    #[test]
    fn test_get_integer_logs_missing_rows() {
        let mut client = sample_client();
        assert_eq!(client.get_integer("SELECT id FROM users WHERE id = 999", -3), -3);
        assert!(client.get_last_error().unwrap().contains("no rows"));

        assert_eq!(client.get_integer("SELECT nope FROM nowhere", -3), -3);
        assert!(client.get_last_error().unwrap().contains("prepare"));
    }

    #[test]
    fn test_get_string_only_for_text() {
        let mut client = sample_client();
        assert_eq!(client.get_string("SELECT 'hello'", "dflt"), "hello");
        assert_eq!(client.get_string("SELECT 42", "dflt"), "dflt");
        assert_eq!(client.get_string("SELECT NULL", "dflt"), "dflt");
        assert_eq!(
            client.get_string("SELECT username FROM users WHERE id = 1", ""),
            "alice"
        );
    }

    #[test]
    fn test_row_outcomes_are_distinct() {
        let mut client = sample_client();

        let empty = client.get_row_associative("SELECT * FROM users WHERE id = 999");
        assert_eq!(empty, QueryOutcome::Fetched(None));

        let failed = client.get_row_associative("SELECT abs(-9223372036854775807 - 1) AS v");
        assert_eq!(failed, QueryOutcome::FetchFailed);
        assert_eq!(failed.legacy_code(), Some(-1));

        let unprepared = client.get_row_associative("SELECT * FROM missing_table");
        assert_eq!(unprepared, QueryOutcome::NotPrepared);
        assert_eq!(unprepared.legacy_code(), None);
    }

    #[test]
    fn test_row_and_array_getters() {
        let mut client = sample_client();

        let row = client
            .get_row_associative("SELECT id, username FROM users WHERE id = 2")
            .fetched()
            .flatten()
            .unwrap();
        assert_eq!(row.get("username"), Some(&SqlValue::Text("bob".into())));

        let positional = client.get_row("SELECT id, username FROM users WHERE id = 2");
        assert_eq!(
            positional,
            QueryOutcome::Fetched(Some(vec![SqlValue::Integer(2), SqlValue::Text("bob".into())]))
        );

        let all = client.get_array("SELECT id FROM users ORDER BY id").fetched().unwrap();
        assert_eq!(all.len(), 3);

        let assoc = client
            .get_array_associative("SELECT id, username FROM users ORDER BY id")
            .fetched()
            .unwrap();
        assert_eq!(assoc[2].get("username"), Some(&SqlValue::Text("charlie".into())));

        let none = client.get_array("SELECT id FROM users WHERE id > 100");
        assert_eq!(none, QueryOutcome::Fetched(vec![]));
    }

    #[test]
    fn test_table_count() {
        let mut client = sample_client();
        assert_eq!(client.get_table_count("users"), 3);
        assert_eq!(client.get_table_count("missing_table"), -1);
    }

    #[test]
    fn test_last_insert_id_is_read_once() {
        let mut client = sample_client();
        assert_eq!(client.exec("INSERT INTO users (username, email) VALUES ('dave', 'dave@example.com')"), 1);
        assert_eq!(client.get_last_insert_id(), 4);
        assert_eq!(client.get_last_insert_id(), 0);
    }

    #[test]
    fn test_exec_failure_returns_minus_one() {
        let mut client = sample_client();
        assert_eq!(client.exec("DELETE FROM missing_table"), -1);
        assert!(client.get_last_error().unwrap().contains("missing_table"));
        assert_eq!(client.execute("DELETE FROM users WHERE id = 3"), 1);
    }

    #[test]
    fn test_insert_shaped_statement_without_rows_is_logged() {
        let mut client = sample_client();
        let before = client.error_log().len();
        let affected = client.exec("INSERT INTO users (username, email) SELECT username, email FROM users WHERE 0");
        assert_eq!(affected, 0);
        assert_eq!(client.error_log().len(), before + 1);
        assert_eq!(client.get_last_insert_id(), 0);
    }

    #[test]
    fn test_insert_returns_identity() {
        let mut client = sample_client();
        let fields = Fields::new()
            .with("username", "eve")
            .with("email", "eve@example.com")
            .with("profile_data", SqlValue::Null);
        assert_eq!(client.insert("users", &fields), 4);
        assert_eq!(
            client.get_string("SELECT username FROM users WHERE id = 4", ""),
            "eve"
        );
        assert_eq!(
            client.get_integer("SELECT profile_data IS NULL FROM users WHERE id = 4", 0),
            1
        );

        let duplicate = Fields::new().with("username", "eve").with("email", "x@example.com");
        assert_eq!(client.insert("users", &duplicate), 0);
        assert!(client.get_last_error().is_some());
    }

    #[test]
    fn test_update() {
        let mut client = sample_client();
        let fields = Fields::new().with("email", "bob@new.example.com");
        let predicate = Fields::new().with("id", 2);
        assert_eq!(client.update("users", &fields, &predicate), 1);
        assert_eq!(
            client.get_string("SELECT email FROM users WHERE id = 2", ""),
            "bob@new.example.com"
        );
    }

    #[test]
    fn test_update_without_predicate_is_refused_and_logged() {
        let mut client = sample_client();
        let fields = Fields::new().with("username", "x");
        assert_eq!(client.update("users", &fields, &Fields::new()), -1);
        assert!(client.get_last_error().unwrap().contains("without a WHERE"));
        assert_eq!(client.get_integer("SELECT COUNT(*) FROM users WHERE username = 'x'", -1), 0);
    }

    #[test]
    fn test_update_with_empty_set_list_does_not_panic() {
        let (backend, log) = RecordingBackend::new();
        let mut client = TypedQueryClient::with_backend(Box::new(backend));
        let result = client.update("users", &Fields::new(), &Fields::new().with("id", 5));
        assert_eq!(result, 0);
        assert_eq!(log.borrow().last().unwrap(), "UPDATE users SET  WHERE id='5'");
    }

    #[test]
    fn test_insert_sql_goes_through_backend_quoting() {
        let (backend, log) = RecordingBackend::new();
        let mut client = TypedQueryClient::with_backend(Box::new(backend));
        let fields = Fields::new().with("name", SqlValue::Null).with("age", 5);
        client.insert("people", &fields);
        assert_eq!(
            log.borrow().last().unwrap(),
            "INSERT INTO people (name,age) VALUES (NULL,'5')"
        );
    }

    #[test]
    fn test_last_error_empty_initially() {
        let client = sample_client();
        assert_eq!(client.get_last_error(), None);
        assert!(client.error_log().is_empty());
    }
}
