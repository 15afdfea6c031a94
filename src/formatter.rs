use crate::error::{ConfigError, FormatError};
use crate::json;
use crate::merge::{self, AmbiguousFieldCollision};
use crate::record::LogRecord;
use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;

/// Timestamp pattern used when none is configured: RFC 3339 at second
/// precision, e.g. `2024-03-01T12:30:45+02:00`. A zero offset is written
/// as `Z`.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Turns a [`LogRecord`] into the bytes written to a sink.
///
/// Implementations must be callable from many threads at once.
pub trait Formatter: Send + Sync {
    /// Format a single record.
    ///
    /// **Returns**
    /// - `Ok(bytes)` holding one complete, newline-terminated entry.
    /// - `Err(..)` if the record could not be rendered; no partial output
    ///   is produced.
    fn format(&self, record: &LogRecord) -> Result<Vec<u8>, FormatError>;
}

/// Settings for [`JsonFormatter`].
///
/// **Fields**
/// - `timestamp_format`: chrono `strftime` pattern for the `time` key;
///   `None` or empty selects [`DEFAULT_TIMESTAMP_FORMAT`].
/// - `html_escaping_disabled`: if `true`, `<`, `>` and `&` are written
///   literally instead of as `\u003c`, `\u003e`, `\u0026`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JsonFormatterConfig {
    pub timestamp_format: Option<String>,
    pub html_escaping_disabled: bool,
}

/// A formatted line together with the ambiguous collisions hit while
/// merging its fields.
#[derive(Debug, Clone)]
pub struct Formatted {
    pub line: Vec<u8>,
    pub collisions: Vec<AmbiguousFieldCollision>,
}

/// Formats records as single-line JSON objects.
///
/// Every entry carries `time`, `msg` and `level` from the record. User
/// fields with those names are kept under `fields.time`, `fields.msg`
/// and `fields.level`. Settings are fixed once built.
#[derive(Clone, Debug, Default)]
pub struct JsonFormatter {
    timestamp_format: Option<String>,
    html_escaping_disabled: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a formatter from a [`JsonFormatterConfig`].
    pub fn from_config(config: &JsonFormatterConfig) -> Result<Self, ConfigError> {
        let formatter = Self::new().with_html_escaping_disabled(config.html_escaping_disabled);
        match &config.timestamp_format {
            Some(pattern) => formatter.with_timestamp_format(pattern.clone()),
            None => Ok(formatter),
        }
    }

    /// Set the `time` pattern. An empty pattern restores the default.
    ///
    /// Fails with [`ConfigError::InvalidTimestampFormat`] if chrono does
    /// not understand one of the specifiers.
    pub fn with_timestamp_format(mut self, pattern: impl Into<String>) -> Result<Self, ConfigError> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            self.timestamp_format = None;
            return Ok(self);
        }
        if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::InvalidTimestampFormat(pattern));
        }
        self.timestamp_format = Some(pattern);
        Ok(self)
    }

    pub fn with_html_escaping_disabled(mut self, disabled: bool) -> Self {
        self.html_escaping_disabled = disabled;
        self
    }

    /// Pattern in effect for the `time` key.
    pub fn timestamp_format(&self) -> &str {
        self.timestamp_format
            .as_deref()
            .unwrap_or(DEFAULT_TIMESTAMP_FORMAT)
    }

    pub fn html_escaping_disabled(&self) -> bool {
        self.html_escaping_disabled
    }

    /// Format `record` and keep the collision report from the merge.
    ///
    /// [`Formatter::format`] drops the report; callers that must surface
    /// lost `fields.*` values use this instead.
    pub fn format_merged(&self, record: &LogRecord) -> Result<Formatted, FormatError> {
        let merged = merge::merge(record, self.timestamp_format())?;
        let line = json::serialize(&merged.fields, self.html_escaping_disabled)?;
        Ok(Formatted {
            line,
            collisions: merged.collisions,
        })
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, record: &LogRecord) -> Result<Vec<u8>, FormatError> {
        self.format_merged(record).map(|formatted| formatted.line)
    }
}
