/// PostgreSQL Backend Module
///
/// Compiled with the `postgres` feature. Statements are parsed with
/// `prepare` first so a bad statement fails before any cursor exists; rows
/// then come back over the simple-query protocol as text and are typed here
/// from the prepared column types.

use super::backend::{Backend, Cursor};
use super::driver::DriverKind;
use super::value::{Row, SqlValue};
use crate::core::{KebabError, Result};
use postgres::types::Type;
use postgres::{Client, NoTls, SimpleQueryMessage};
use tracing::debug;

pub struct PostgresBackend {
    client: Client,
}

impl PostgresBackend {
    /// Connects with a libpq-style parameter list or a `postgres://` URL.
    ///
    /// PDO-style `;` separators (`host=db;dbname=shop`) are accepted too.
    pub fn open(connection_string: &str) -> Result<Self> {
        let params = connection_params(connection_string);
        let client = Client::connect(&params, NoTls)
            .map_err(|e| KebabError::Connect(format!("Failed to connect to postgres: {}", e)))?;
        Ok(PostgresBackend { client })
    }
}

/// Rewrites PDO `key=value;key=value` lists into the space separated form.
fn connection_params(connection_string: &str) -> String {
    let trimmed = connection_string.trim();
    if trimmed.starts_with("postgres://") || trimmed.starts_with("postgresql://") {
        return trimmed.to_string();
    }
    trimmed
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl Backend for PostgresBackend {
    fn driver(&self) -> DriverKind {
        DriverKind::Postgres
    }

    fn execute(&mut self, sql: &str) -> Result<u64> {
        Ok(self.client.execute(sql, &[])?)
    }

    fn prepare<'a>(&'a mut self, sql: &str) -> Result<Box<dyn Cursor + 'a>> {
        let statement = self.client.prepare(sql)?;
        let columns = statement
            .columns()
            .iter()
            .map(|column| (column.name().to_string(), column.type_().clone()))
            .collect();
        Ok(Box::new(PostgresCursor {
            client: &mut self.client,
            sql: sql.to_string(),
            columns,
        }))
    }

    fn last_insert_id(&mut self) -> i64 {
        match self.client.query_one("SELECT lastval()", &[]) {
            Ok(row) => row.try_get(0).unwrap_or(0),
            Err(e) => {
                debug!("lastval() unavailable: {}", e);
                0
            }
        }
    }
}

struct PostgresCursor<'a> {
    client: &'a mut Client,
    sql: String,
    columns: Vec<(String, Type)>,
}

impl PostgresCursor<'_> {
    fn run(&mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        for message in self.client.simple_query(&self.sql)? {
            if let SimpleQueryMessage::Row(row) = message {
                let values = (0..row.len())
                    .map(|i| {
                        let column_type = self.columns.get(i).map(|(_, t)| t).unwrap_or(&Type::TEXT);
                        convert_text(row.get(i), column_type)
                    })
                    .collect();
                rows.push(values);
            }
        }
        Ok(rows)
    }
}

impl Cursor for PostgresCursor<'_> {
    fn columns(&self) -> Vec<String> {
        self.columns.iter().map(|(name, _)| name.clone()).collect()
    }

    fn fetch_one(&mut self) -> Result<Option<Row>> {
        Ok(self.run()?.into_iter().next())
    }

    fn fetch_all(&mut self) -> Result<Vec<Row>> {
        self.run()
    }
}

/// Types one text-protocol value by its column type.
fn convert_text(value: Option<&str>, column_type: &Type) -> SqlValue {
    let Some(text) = value else {
        return SqlValue::Null;
    };
    let integer = [Type::INT2, Type::INT4, Type::INT8, Type::OID];
    let real = [Type::FLOAT4, Type::FLOAT8, Type::NUMERIC];

    if integer.contains(column_type) {
        text.parse::<i64>()
            .map(SqlValue::Integer)
            .unwrap_or_else(|_| SqlValue::Text(text.to_string()))
    } else if real.contains(column_type) {
        text.parse::<f64>()
            .map(SqlValue::Real)
            .unwrap_or_else(|_| SqlValue::Text(text.to_string()))
    } else if *column_type == Type::BOOL {
        SqlValue::Integer(i64::from(text == "t"))
    } else if *column_type == Type::BYTEA {
        text.strip_prefix("\\x")
            .and_then(|digits| hex::decode(digits).ok())
            .map(SqlValue::Blob)
            .unwrap_or_else(|| SqlValue::Text(text.to_string()))
    } else {
        SqlValue::Text(text.to_string())
    }
}
