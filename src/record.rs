use chrono::{DateTime, FixedOffset, Utc};
use serde::ser::{Error as _, Serialize, Serializer};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// User-attached key/value context of a [`LogRecord`].
pub type Fields = BTreeMap<String, FieldValue>;

/// Severity of a [`LogRecord`], most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Panic,
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Level {
    /// Stable string form written under the `level` key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Panic => "panic",
            Level::Fatal => "fatal",
            Level::Error => "error",
            Level::Warn => "warning",
            Level::Info => "info",
            Level::Debug => "debug",
            Level::Trace => "trace",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::ERROR => Level::Error,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::INFO => Level::Info,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::TRACE => Level::Trace,
        }
    }
}

/// A single field value.
///
/// Errors are kept as a dedicated variant so the merger can replace them
/// with their description; everything else maps onto plain JSON.
#[derive(Debug, Clone)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    /// Non-finite values fail serialization.
    Float(f64),
    Str(String),
    List(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
    Error(Arc<dyn Error + Send + Sync>),
}

impl FieldValue {
    /// Wrap an error so it is rendered by its `Display` output.
    pub fn error<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        FieldValue::Error(Arc::new(err))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, FieldValue::Error(_))
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_unit(),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Int(i) => serializer.serialize_i64(*i),
            FieldValue::UInt(u) => serializer.serialize_u64(*u),
            FieldValue::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            FieldValue::Float(f) => Err(S::Error::custom(format_args!(
                "unsupported float value: {}",
                f
            ))),
            FieldValue::Str(s) => serializer.serialize_str(s),
            FieldValue::List(items) => items.serialize(serializer),
            FieldValue::Map(map) => map.serialize(serializer),
            // Nested errors are not touched by the merger.
            FieldValue::Error(err) => serializer.collect_str(err),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v.into())
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::UInt(v.into())
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        FieldValue::UInt(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Null, Into::into)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(v: Vec<T>) -> Self {
        FieldValue::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value;

        match v {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    FieldValue::UInt(u)
                } else if let Some(i) = n.as_i64() {
                    FieldValue::Int(i)
                } else {
                    FieldValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => FieldValue::Str(s),
            Value::Array(items) => FieldValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                FieldValue::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

/// One log event as handed to a [`Formatter`](crate::formatter::Formatter).
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<FixedOffset>,
    pub level: Level,
    pub message: String,
    pub fields: Fields,
}

impl LogRecord {
    /// Create a record stamped with the current UTC time and no fields.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        LogRecord {
            timestamp: Utc::now().into(),
            level,
            message: message.into(),
            fields: Fields::new(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<FixedOffset>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn level_strings_are_stable() {
        assert_eq!(Level::Warn.to_string(), "warning");
        assert_eq!(Level::from(tracing::Level::DEBUG).as_str(), "debug");
        assert!(Level::Error < Level::Info);
    }

    #[test]
    fn error_values_serialize_as_their_description() {
        let value = FieldValue::error(io::Error::new(io::ErrorKind::Other, "disk full"));
        assert!(value.is_error());
        assert_eq!(serde_json::to_string(&value).unwrap(), "\"disk full\"");
    }

    #[test]
    fn non_finite_floats_fail_to_serialize() {
        let err = serde_json::to_string(&FieldValue::Float(f64::NAN)).unwrap_err();
        assert!(err.to_string().contains("unsupported float value"));
        assert_eq!(serde_json::to_string(&FieldValue::Float(1.5)).unwrap(), "1.5");
    }

    #[test]
    fn json_values_convert_recursively() {
        let value: FieldValue = serde_json::json!({"a": [1, -2, 0.5, null, true]}).into();
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"a":[1,-2,0.5,null,true]}"#
        );
    }
}
