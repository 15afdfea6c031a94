//! Environment variable names used by this crate for convenient
//! configuration of the formatter from services.
//!
//! These are purely helpers; [`JsonFormatter`](crate::formatter::JsonFormatter)
//! itself never reads the environment.

use crate::error::ConfigError;
use crate::formatter::JsonFormatterConfig;
use crate::record::Level;

/// chrono `strftime` pattern for the `time` key.
pub const LOG_JSON_TIMESTAMP_FORMAT_ENV: &str = "LOG_JSON_TIMESTAMP_FORMAT";

/// `true`/`false` toggle for writing `<`, `>`, `&` literally.
pub const LOG_JSON_DISABLE_HTML_ESCAPING_ENV: &str = "LOG_JSON_DISABLE_HTML_ESCAPING";

/// Most verbose level emitted by the layer, e.g. `info`.
pub const LOG_JSON_LEVEL_ENV: &str = "LOG_JSON_LEVEL";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a boolean setting, accepting `1/0`, `true/false`, `yes/no`, `on/off`.
pub fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Parse a level name as written under the `level` key (`warn` is also
/// accepted).
pub fn parse_level(value: &str) -> Result<Level, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "panic" => Ok(Level::Panic),
        "fatal" => Ok(Level::Fatal),
        "error" => Ok(Level::Error),
        "warning" | "warn" => Ok(Level::Warn),
        "info" => Ok(Level::Info),
        "debug" => Ok(Level::Debug),
        "trace" => Ok(Level::Trace),
        _ => Err(ConfigError::InvalidLevel(value.to_string())),
    }
}

/// Build a [`JsonFormatterConfig`] from the `LOG_JSON_*` variables.
pub fn formatter_config_from_env() -> Result<JsonFormatterConfig, ConfigError> {
    let timestamp_format = std::env::var(LOG_JSON_TIMESTAMP_FORMAT_ENV)
        .ok()
        .filter(|p| !p.is_empty());
    let html_escaping_disabled = parse_bool(
        LOG_JSON_DISABLE_HTML_ESCAPING_ENV,
        &env_or(LOG_JSON_DISABLE_HTML_ESCAPING_ENV, "false"),
    )?;

    Ok(JsonFormatterConfig {
        timestamp_format,
        html_escaping_disabled,
    })
}

/// Level from [`LOG_JSON_LEVEL_ENV`], `info` when unset.
pub fn max_level_from_env() -> Result<Level, ConfigError> {
    parse_level(&env_or(LOG_JSON_LEVEL_ENV, "info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_boolean_spellings() {
        assert!(parse_bool("K", "TRUE").unwrap());
        assert!(parse_bool("K", " on ").unwrap());
        assert!(!parse_bool("K", "0").unwrap());
        assert!(!parse_bool("K", "").unwrap());
    }

    #[test]
    fn rejects_unknown_boolean() {
        let err = parse_bool("LOG_JSON_DISABLE_HTML_ESCAPING", "maybe").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid boolean value \"maybe\" for LOG_JSON_DISABLE_HTML_ESCAPING"
        );
    }

    #[test]
    fn parses_levels() {
        assert_eq!(parse_level("warn").unwrap(), Level::Warn);
        assert_eq!(parse_level("Warning").unwrap(), Level::Warn);
        assert_eq!(parse_level("trace").unwrap(), Level::Trace);
        assert!(matches!(parse_level("loud"), Err(ConfigError::InvalidLevel(_))));
    }
}
