/// Value Module
///
/// Driver-neutral representations of column values and result rows.

use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::ValueRef;
use serde::{Serialize, Serializer};

static SIGNED_INTEGER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?[0-9]+$").unwrap());

/// A single column value as returned by a backend.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Returns true for SQL `NULL`.
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Textual form of the value, as a driver would hand it to `quote`.
    ///
    /// `NULL` renders as the empty string. Blobs are decoded lossily.
    pub fn to_text(&self) -> String {
        match self {
            SqlValue::Null => String::new(),
            SqlValue::Integer(i) => i.to_string(),
            SqlValue::Real(f) => f.to_string(),
            SqlValue::Text(t) => t.clone(),
            SqlValue::Blob(b) => String::from_utf8_lossy(b).into_owned(),
        }
    }

    /// Interprets the value as an integer.
    ///
    /// Integers pass through and text only when it is an optionally negative
    /// run of digits that fits in an `i64`. Reals (even `4.0`), a leading
    /// `+` and `NULL` all yield `None`.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(i) => Some(*i),
            SqlValue::Text(t) if SIGNED_INTEGER_RE.is_match(t) => t.parse::<i64>().ok(),
            _ => None,
        }
    }

    /// Returns the text only if the value is genuinely textual.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SqlValue::Text(t) => Some(t),
            _ => None,
        }
    }
}

impl<'a> From<ValueRef<'a>> for SqlValue {
    fn from(value: ValueRef<'a>) -> Self {
        match value {
            ValueRef::Null => SqlValue::Null,
            ValueRef::Integer(i) => SqlValue::Integer(i),
            ValueRef::Real(f) => SqlValue::Real(f),
            ValueRef::Text(t) => SqlValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => SqlValue::Blob(b.to_vec()),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Integer(value.into())
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Real(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

impl Serialize for SqlValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            SqlValue::Null => serializer.serialize_none(),
            SqlValue::Integer(i) => serializer.serialize_i64(*i),
            SqlValue::Real(f) => serializer.serialize_f64(*f),
            SqlValue::Text(t) => serializer.serialize_str(t),
            SqlValue::Blob(b) => serializer.serialize_str(&format!("<BLOB: {} bytes>", b.len())),
        }
    }
}

/// A result row addressed by column position.
pub type Row = Vec<SqlValue>;

/// A result row addressed by column name, in select-list order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssocRow {
    fields: Vec<(String, SqlValue)>,
}

impl AssocRow {
    /// Pairs column names with a positional row.
    pub fn from_columns(columns: &[String], row: Row) -> Self {
        AssocRow {
            fields: columns.iter().cloned().zip(row).collect(),
        }
    }

    /// Looks up a value by column name. With duplicate names the last one wins.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.fields
            .iter()
            .rev()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl Serialize for AssocRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Ordered column/value pairs for the insert and update builders.
///
/// Insertion order is preserved; it is the column order of the generated SQL.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fields {
    pairs: Vec<(String, SqlValue)>,
}

impl Fields {
    pub fn new() -> Self {
        Fields::default()
    }

    /// Appends a column/value pair, builder style.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<SqlValue>) {
        self.pairs.push((column.into(), value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.pairs.iter().map(|(column, value)| (column.as_str(), value))
    }
}

impl<K, V> FromIterator<(K, V)> for Fields
where
    K: Into<String>,
    V: Into<SqlValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (column, value) in iter {
            fields.push(column, value);
        }
        fields
    }
}
