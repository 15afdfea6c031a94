use std::io;

use tracing::{error, info, warn};

use tracing_json_format::init::{init_tracing_with_config, LayerConfig};
use tracing_json_format::{Formatter, FieldValue, JsonFormatter, JsonFormatterConfig, Level, LogRecord};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Direct use of the formatter, without tracing.
    let formatter = JsonFormatter::new().with_html_escaping_disabled(true);
    let record = LogRecord::new(Level::Error, "upload failed")
        .with_field("path", "/tmp/<upload>&1")
        .with_field("msg", "user supplied msg")
        .with_field("err", FieldValue::error(io::Error::new(io::ErrorKind::Other, "disk full")));
    print!("{}", String::from_utf8(formatter.format(&record)?)?);

    // The same formatter behind a global tracing subscriber.
    init_tracing_with_config(LayerConfig {
        formatter: JsonFormatterConfig {
            timestamp_format: Some("%Y-%m-%d %H:%M:%S%.3f".to_string()),
            html_escaping_disabled: false,
        },
        max_level: Level::Debug,
    })?;

    info!("starting service");
    warn!(retries = 3, "slow upstream");
    error!(user_id = 42, reason = "invalid password", "authentication failed");

    Ok(())
}
