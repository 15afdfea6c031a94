use crate::error::FormatError;
use crate::formatter::DEFAULT_TIMESTAMP_FORMAT;
use crate::record::{FieldValue, Fields, LogRecord};
use chrono::SecondsFormat;
use std::fmt::Write as _;

/// Key holding the formatted record timestamp.
pub const TIME_KEY: &str = "time";
/// Key holding the record message.
pub const MSG_KEY: &str = "msg";
/// Key holding the record level string.
pub const LEVEL_KEY: &str = "level";

/// Keys always sourced from the record itself, in resolution order.
pub const RESERVED_KEYS: [&str; 3] = [TIME_KEY, MSG_KEY, LEVEL_KEY];

/// Prefix given to user fields that clash with a reserved key.
pub const CLASH_PREFIX: &str = "fields.";

/// A user field renamed onto a key the user had also supplied.
///
/// The renamed value is kept; the value previously stored under
/// `renamed` is reported here.
#[derive(Debug, Clone)]
pub struct AmbiguousFieldCollision {
    pub key: &'static str,
    pub renamed: String,
    pub discarded: FieldValue,
}

/// Output of [`merge`].
#[derive(Debug, Clone)]
pub struct Merged {
    pub fields: Fields,
    pub collisions: Vec<AmbiguousFieldCollision>,
}

/// Build the output field set for `record`.
///
/// User fields are copied with error values replaced by their description,
/// reserved-key clashes are moved under [`CLASH_PREFIX`], and then `time`,
/// `msg` and `level` are written from the record. The record is not
/// modified.
pub fn merge(record: &LogRecord, timestamp_format: &str) -> Result<Merged, FormatError> {
    let mut fields = Fields::new();
    for (key, value) in &record.fields {
        let value = match value {
            FieldValue::Error(err) => FieldValue::Str(err.to_string()),
            other => other.clone(),
        };
        fields.insert(key.clone(), value);
    }

    let collisions = prefix_field_clashes(&mut fields);

    fields.insert(
        TIME_KEY.to_string(),
        FieldValue::Str(format_timestamp(record, timestamp_format)?),
    );
    fields.insert(MSG_KEY.to_string(), FieldValue::Str(record.message.clone()));
    fields.insert(
        LEVEL_KEY.to_string(),
        FieldValue::Str(record.level.as_str().to_string()),
    );

    Ok(Merged { fields, collisions })
}

/// Move every reserved key present in `fields` under [`CLASH_PREFIX`].
///
/// Runs over all reserved keys before any reserved value is written.
pub fn prefix_field_clashes(fields: &mut Fields) -> Vec<AmbiguousFieldCollision> {
    let mut collisions = Vec::new();

    for key in RESERVED_KEYS {
        let Some(value) = fields.remove(key) else {
            continue;
        };
        let renamed = format!("{CLASH_PREFIX}{key}");
        if let Some(discarded) = fields.insert(renamed.clone(), value) {
            tracing::warn!(
                key,
                renamed = %renamed,
                "reserved field and its renamed counterpart both supplied; keeping the renamed reserved value"
            );
            collisions.push(AmbiguousFieldCollision {
                key,
                renamed,
                discarded,
            });
        }
    }

    collisions
}

fn format_timestamp(record: &LogRecord, pattern: &str) -> Result<String, FormatError> {
    // strftime has no "Z for UTC" specifier
    if pattern == DEFAULT_TIMESTAMP_FORMAT {
        return Ok(record.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true));
    }

    let mut out = String::new();
    write!(out, "{}", record.timestamp.format(pattern))
        .map_err(|_| FormatError::Timestamp(pattern.to_string()))?;
    Ok(out)
}
