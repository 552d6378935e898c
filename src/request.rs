/// Request Module
///
/// Typed, defaulted lookups over a caller-supplied parameter map. A
/// parameter that is missing or holds an empty string counts as absent and
/// yields the caller's default.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*(>|$)").unwrap());
static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").unwrap());

/// One request parameter: a plain value or a `key[]` list.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    List(Vec<String>),
}

/// Request parameters keyed by name.
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    values: HashMap<String, ParamValue>,
}

impl RequestParams {
    pub fn new() -> Self {
        RequestParams::default()
    }

    /// Parses an `application/x-www-form-urlencoded` string.
    ///
    /// Repeated `key[]` entries collect into a list; for plain keys the last
    /// occurrence wins.
    pub fn from_query_string(query: &str) -> Self {
        let mut params = RequestParams::new();
        let query = query.strip_prefix('?').unwrap_or(query);
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if let Some(list_key) = key.strip_suffix("[]") {
                params.push_list_item(list_key, value.into_owned());
            } else {
                params.insert(key.into_owned(), ParamValue::Text(value.into_owned()));
            }
        }
        params
    }

    pub fn insert(&mut self, key: impl Into<String>, value: ParamValue) {
        self.values.insert(key.into(), value);
    }

    /// Shorthand for inserting a text parameter.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.insert(key, ParamValue::Text(value.into()));
    }

    fn push_list_item(&mut self, key: &str, item: String) {
        match self.values.get_mut(key) {
            Some(ParamValue::List(items)) => items.push(item),
            _ => {
                self.values.insert(key.to_string(), ParamValue::List(vec![item]));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    /// Non-empty text value of `key`.
    fn text(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(ParamValue::Text(text)) if !text.is_empty() => Some(text),
            _ => None,
        }
    }

    /// Text parameter, optionally sanitized and truncated to `max_len` characters.
    ///
    /// Sanitizing trims, strips HTML tags and encodes quotes. An empty
    /// result gives `default`.
    pub fn get_string(&self, key: &str, max_len: Option<usize>, default: &str, sanitize: bool) -> String {
        let Some(raw) = self.text(key) else {
            return default.to_string();
        };
        let value = if sanitize { sanitize_text(raw) } else { raw.to_string() };
        if value.is_empty() {
            return default.to_string();
        }
        truncate(&value, max_len)
    }

    /// Decimal parameter such as `1,234.5`.
    ///
    /// Thousands separators must group exactly three digits.
    pub fn get_float(&self, key: &str, default: f64, decimal_symbol: char, thousands_separator: char) -> f64 {
        let Some(raw) = self.text(key) else {
            return default;
        };
        let raw = raw.trim();
        let pattern = format!(
            "^[0-9]*({}[0-9]{{3}})*({}[0-9]*)?$",
            regex::escape(&thousands_separator.to_string()),
            regex::escape(&decimal_symbol.to_string())
        );
        let matches = Regex::new(&pattern).map(|re| re.is_match(raw)).unwrap_or(false);
        if !matches {
            return default;
        }

        let normalized: String = raw
            .chars()
            .filter(|c| *c != thousands_separator)
            .map(|c| if c == decimal_symbol { '.' } else { c })
            .collect();
        normalized.parse::<f64>().unwrap_or(default)
    }

    /// Unsigned integer parameter made of digits only.
    pub fn get_integer(&self, key: &str, default: i64) -> i64 {
        match self.text(key) {
            Some(raw) if DIGITS_RE.is_match(raw) => raw.parse::<i64>().unwrap_or(default),
            _ => default,
        }
    }

    /// First character of the parameter.
    pub fn get_character(&self, key: &str, default: Option<char>, apply_trim: bool) -> Option<char> {
        let Some(raw) = self.text(key) else {
            return default;
        };
        let value = if apply_trim { raw.trim() } else { raw };
        value.chars().next().or(default)
    }

    /// List parameter (`key[]=a&key[]=b`). Text parameters give `None`.
    pub fn get_list(&self, key: &str) -> Option<&[String]> {
        match self.values.get(key) {
            Some(ParamValue::List(items)) if !items.is_empty() => Some(items),
            _ => None,
        }
    }

    /// Parameter parsed as JSON. Invalid, `null` and empty JSON values give `None`.
    pub fn get_json(&self, key: &str) -> Option<serde_json::Value> {
        let raw = self.text(key)?.trim();
        if raw.is_empty() {
            return None;
        }
        let value: serde_json::Value = serde_json::from_str(raw).ok()?;
        let empty = match &value {
            serde_json::Value::Null => true,
            serde_json::Value::Array(items) => items.is_empty(),
            serde_json::Value::Object(map) => map.is_empty(),
            _ => false,
        };
        (!empty).then_some(value)
    }

    /// Digits of the parameter with everything else removed.
    pub fn get_only_digits(&self, key: &str, default: &str, max_len: Option<usize>) -> String {
        let Some(raw) = self.text(key) else {
            return default.to_string();
        };
        let digits: String = raw.trim().chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return default.to_string();
        }
        truncate(&digits, max_len)
    }

    /// The parameter exactly as received, optionally truncated.
    pub fn get_unsafe_raw(&self, key: &str, default: &str, max_len: Option<usize>) -> String {
        match self.text(key) {
            Some(raw) => truncate(raw, max_len),
            None => default.to_string(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = RequestParams::new();
        for (key, value) in iter {
            params.set(key, value);
        }
        params
    }
}

/// Trims, strips HTML tags and encodes single and double quotes.
pub fn sanitize_text(raw: &str) -> String {
    TAG_RE
        .replace_all(raw.trim(), "")
        .replace('"', "&#34;")
        .replace('\'', "&#39;")
        .trim()
        .to_string()
}

fn truncate(value: &str, max_len: Option<usize>) -> String {
    match max_len {
        Some(n) if n >= 1 => value.chars().take(n).collect(),
        _ => value.to_string(),
    }
}
