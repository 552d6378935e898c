/// Statement Module
///
/// Builds the SQL text for the client's insert, update and count helpers.
/// Values go through the backend's quoting; table and column names are
/// interpolated as given.

use super::backend::Backend;
use super::value::{Fields, SqlValue};

/// Returns true when the trimmed statement starts with `insert`, ignoring ASCII case.
pub fn is_insert_statement(sql: &str) -> bool {
    sql.trim()
        .get(..6)
        .map(|head| head.eq_ignore_ascii_case("insert"))
        .unwrap_or(false)
}

fn literal(backend: &dyn Backend, value: &SqlValue) -> String {
    if value.is_null() {
        "NULL".to_string()
    } else {
        backend.quote(value)
    }
}

/// `INSERT INTO table (c1,c2) VALUES (v1,v2)`, nulls emitted as `NULL`.
pub fn insert_sql(backend: &dyn Backend, table: &str, fields: &Fields) -> String {
    let columns: Vec<&str> = fields.iter().map(|(column, _)| column).collect();
    let values: Vec<String> = fields.iter().map(|(_, value)| literal(backend, value)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(","),
        values.join(",")
    )
}

/// `UPDATE table SET c1=v1,c2=v2 WHERE w1=x1 AND w2=x2`.
///
/// Nulls in the SET list become `NULL`; WHERE values are always quoted.
pub fn update_sql(backend: &dyn Backend, table: &str, fields: &Fields, predicate: &Fields) -> String {
    let assignments: Vec<String> = fields
        .iter()
        .map(|(column, value)| format!("{}={}", column, literal(backend, value)))
        .collect();
    let conditions: Vec<String> = predicate
        .iter()
        .map(|(column, value)| format!("{}={}", column, backend.quote(value)))
        .collect();
    format!(
        "UPDATE {} SET {} WHERE {}",
        table,
        assignments.join(","),
        conditions.join(" AND ")
    )
}

pub fn count_sql(table: &str) -> String {
    format!("SELECT COUNT(*) FROM {}", table)
}
