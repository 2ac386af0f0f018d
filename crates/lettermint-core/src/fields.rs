//! Field extraction rules shared by every data record decoder.
//!
//! Each accessor either requires a field (absent or wrong-typed fails with
//! `MalformedPayload` naming the dotted field path) or treats it as optional
//! with a fixed default. `null` counts as absent for optional fields.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::error::{Result, WebhookError};

/// Read-only view over one JSON object being decoded.
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a> {
    map: &'a Map<String, Value>,
    path: &'a str,
}

impl<'a> Fields<'a> {
    /// Wraps an object found at `path`.
    ///
    /// # Errors
    ///
    /// Returns `MalformedPayload` when `value` is not a JSON object.
    pub fn new(value: &'a Value, path: &'a str) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self { map, path }),
            other => Err(WebhookError::malformed_field(
                path,
                format!("must be an object, got {}", kind(other)),
            )),
        }
    }

    /// Returns the dotted path of `key` below this object.
    pub fn path_of(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.path)
        }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|value| !value.is_null())
    }

    fn missing(&self, key: &str) -> WebhookError {
        WebhookError::malformed_field(self.path_of(key), "is missing")
    }

    fn mismatch(&self, key: &str, expected: &str, got: &Value) -> WebhookError {
        WebhookError::malformed_field(
            self.path_of(key),
            format!("must be {expected}, got {}", kind(got)),
        )
    }

    /// Required string.
    pub fn required_str(&self, key: &str) -> Result<String> {
        self.optional_str(key)?.ok_or_else(|| self.missing(key))
    }

    /// Optional string, `None` when absent.
    pub fn optional_str(&self, key: &str) -> Result<Option<String>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(self.mismatch(key, "a string", other)),
        }
    }

    /// Required signed integer.
    pub fn required_i64(&self, key: &str) -> Result<i64> {
        match self.get(key) {
            None => Err(self.missing(key)),
            Some(value) => value.as_i64().ok_or_else(|| self.mismatch(key, "an integer", value)),
        }
    }

    /// Required unsigned integer.
    pub fn required_u64(&self, key: &str) -> Result<u64> {
        match self.get(key) {
            None => Err(self.missing(key)),
            Some(value) => {
                value.as_u64().ok_or_else(|| self.mismatch(key, "a non-negative integer", value))
            },
        }
    }

    /// Required HTTP/SMTP style status code.
    pub fn required_u16(&self, key: &str) -> Result<u16> {
        let value = self.required_u64(key)?;
        u16::try_from(value).map_err(|_| {
            WebhookError::malformed_field(self.path_of(key), format!("is out of range: {value}"))
        })
    }

    /// Required number; integers are widened.
    pub fn required_f64(&self, key: &str) -> Result<f64> {
        match self.get(key) {
            None => Err(self.missing(key)),
            Some(value) => value.as_f64().ok_or_else(|| self.mismatch(key, "a number", value)),
        }
    }

    /// Optional number with a default.
    pub fn f64_or(&self, key: &str, default: f64) -> Result<f64> {
        match self.get(key) {
            None => Ok(default),
            Some(_) => self.required_f64(key),
        }
    }

    /// Optional boolean with a default.
    pub fn bool_or(&self, key: &str, default: bool) -> Result<bool> {
        match self.get(key) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(self.mismatch(key, "a boolean", other)),
        }
    }

    /// Required date-time.
    pub fn required_datetime(&self, key: &str) -> Result<DateTime<Utc>> {
        let raw = self.required_str(key)?;
        parse_datetime(&raw).ok_or_else(|| {
            WebhookError::malformed_field(
                self.path_of(key),
                format!("is not a valid date-time: {raw:?}"),
            )
        })
    }

    /// Metadata map, empty when absent.
    pub fn metadata(&self, key: &str) -> Result<Map<String, Value>> {
        match self.get(key) {
            None => Ok(Map::new()),
            Some(Value::Object(map)) => Ok(map.clone()),
            // An empty metadata map often arrives as `[]` from loosely typed senders.
            Some(Value::Array(items)) if items.is_empty() => Ok(Map::new()),
            Some(other) => Err(self.mismatch(key, "an object", other)),
        }
    }

    /// List of strings, empty when absent.
    pub fn string_list(&self, key: &str) -> Result<Vec<String>> {
        self.array(key)?
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(WebhookError::malformed_field(
                    format!("{}[{index}]", self.path_of(key)),
                    format!("must be a string, got {}", kind(other)),
                )),
            })
            .collect()
    }

    /// Raw JSON list, empty when absent.
    pub fn value_list(&self, key: &str) -> Result<Vec<Value>> {
        Ok(self.array(key)?.to_vec())
    }

    /// Required nested object decoded with `decode`.
    pub fn required_object<T>(
        &self,
        key: &str,
        decode: impl FnOnce(Fields<'_>) -> Result<T>,
    ) -> Result<T> {
        let value = self.get(key).ok_or_else(|| self.missing(key))?;
        let path = self.path_of(key);
        decode(Fields::new(value, &path)?)
    }

    /// Optional nested object; absent decodes to `T::default()`.
    pub fn optional_object<T: Default>(
        &self,
        key: &str,
        decode: impl FnOnce(Fields<'_>) -> Result<T>,
    ) -> Result<T> {
        match self.get(key) {
            None => Ok(T::default()),
            // PHP-style senders encode an empty object as `[]`.
            Some(Value::Array(items)) if items.is_empty() => Ok(T::default()),
            Some(_) => self.required_object(key, decode),
        }
    }

    /// List of nested objects, each decoded independently; empty when absent.
    pub fn object_list<T>(
        &self,
        key: &str,
        decode: impl Fn(Fields<'_>) -> Result<T>,
    ) -> Result<Vec<T>> {
        let base = self.path_of(key);
        self.array(key)?
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let path = format!("{base}[{index}]");
                decode(Fields::new(item, &path)?)
            })
            .collect()
    }

    fn array(&self, key: &str) -> Result<&'a [Value]> {
        match self.get(key) {
            None => Ok(&[]),
            Some(Value::Array(items)) => Ok(items.as_slice()),
            Some(other) => Err(self.mismatch(key, "a list", other)),
        }
    }
}

/// Parses RFC 3339 timestamps, falling back to zone-less forms read as UTC.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn required_string_names_missing_field() {
        let value = json!({"recipient": "a@b.com"});
        let fields = Fields::new(&value, "data").unwrap();

        let err = fields.required_str("message_id").unwrap_err();
        assert_eq!(err.field(), Some("data.message_id"));
    }

    #[test]
    fn wrong_type_names_field() {
        let value = json!({"response": {"status_code": "250"}});
        let fields = Fields::new(&value, "data").unwrap();

        let err = fields.required_object("response", |f| f.required_u16("status_code")).unwrap_err();
        assert_eq!(err.field(), Some("data.response.status_code"));
    }

    #[test]
    fn null_counts_as_absent_for_optional_fields() {
        let value = json!({"tag": null, "metadata": null, "to": null});
        let fields = Fields::new(&value, "data").unwrap();

        assert_eq!(fields.optional_str("tag").unwrap(), None);
        assert!(fields.metadata("metadata").unwrap().is_empty());
        assert!(fields.string_list("to").unwrap().is_empty());
    }

    #[test]
    fn object_list_reports_index_of_bad_element() {
        let value = json!({"headers": [{"name": "a", "value": "b"}, {"name": "c"}]});
        let fields = Fields::new(&value, "data").unwrap();

        let err = fields
            .object_list("headers", |f| Ok((f.required_str("name")?, f.required_str("value")?)))
            .unwrap_err();
        assert_eq!(err.field(), Some("data.headers[1].value"));
    }

    #[test]
    fn integers_widen_to_floats() {
        let value = json!({"spam_score": 3});
        let fields = Fields::new(&value, "data").unwrap();

        assert_eq!(fields.f64_or("spam_score", 0.0).unwrap(), 3.0);
        assert_eq!(fields.f64_or("missing", 0.0).unwrap(), 0.0);
    }

    #[test]
    fn non_object_is_rejected() {
        let value = json!("nope");
        let err = Fields::new(&value, "data").unwrap_err();
        assert_eq!(err.field(), Some("data"));
    }

    #[test]
    fn parses_rfc3339_and_zoneless_timestamps() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();

        assert_eq!(parse_datetime("2024-01-15T10:30:00Z"), Some(expected));
        assert_eq!(parse_datetime("2024-01-15T11:30:00+01:00"), Some(expected));
        assert_eq!(parse_datetime("2024-01-15T10:30:00"), Some(expected));
        assert_eq!(parse_datetime("2024-01-15 10:30:00"), Some(expected));
        assert_eq!(parse_datetime("yesterday"), None);
    }
}
