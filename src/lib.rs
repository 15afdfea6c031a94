pub mod error;
pub mod record;
pub mod merge;
pub mod json;
pub mod formatter;
pub mod layer;

pub mod env;
pub mod init;

pub use error::{ConfigError, FormatError, InitError};
pub use formatter::{Formatted, Formatter, JsonFormatter, JsonFormatterConfig, DEFAULT_TIMESTAMP_FORMAT};
pub use record::{FieldValue, Fields, Level, LogRecord};
