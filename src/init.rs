use crate::env;
use crate::error::InitError;
use crate::formatter::{JsonFormatter, JsonFormatterConfig};
use crate::layer::JsonLayer;
use crate::record::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the JSON logging layer.
///
/// **Fields**
/// - `formatter`: settings for the [`JsonFormatter`] rendering each line.
/// - `max_level`: most verbose level that is still written.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub formatter: JsonFormatterConfig,
    pub max_level: Level,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            formatter: JsonFormatterConfig::default(),
            max_level: Level::Info,
        }
    }
}

impl LayerConfig {
    /// Read the configuration from the `LOG_JSON_*` environment variables.
    pub fn from_env() -> Result<Self, InitError> {
        Ok(Self {
            formatter: env::formatter_config_from_env()?,
            max_level: env::max_level_from_env()?,
        })
    }
}

/// Install a global `tracing` subscriber that writes JSON lines to stdout.
///
/// **Parameters**
/// - `config`: [`LayerConfig`] controlling the formatter and level filter.
///
/// **Returns**
/// - `Err(InitError::Config)` if the timestamp pattern is invalid.
/// - `Err(InitError::SetGlobalDefault)` if a global subscriber is already set.
///
/// **Effects**
///
/// This installs a [`Registry`] combined with a [`JsonLayer`] writing to
/// stdout as the global default subscriber, so all `tracing` events in the
/// process up to `max_level` are rendered as JSON lines.
pub fn init_tracing_with_config(config: LayerConfig) -> Result<(), InitError> {
    let formatter = JsonFormatter::from_config(&config.formatter)?;
    let layer = JsonLayer::new(formatter, std::io::stdout).with_max_level(config.max_level);

    let subscriber = Registry::default().with(layer);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Initialize JSON logging from the environment.
///
/// **Behavior**
///
/// Equivalent to calling [`init_tracing_with_config`] with
/// [`LayerConfig::from_env`]. Unset variables select the defaults: the
/// RFC 3339 timestamp, HTML escaping enabled and `info` level.
pub fn init_tracing() -> Result<(), InitError> {
    init_tracing_with_config(LayerConfig::from_env()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{
        LOG_JSON_DISABLE_HTML_ESCAPING_ENV, LOG_JSON_LEVEL_ENV, LOG_JSON_TIMESTAMP_FORMAT_ENV,
    };
    use crate::error::ConfigError;

    fn clear_env() {
        std::env::remove_var(LOG_JSON_TIMESTAMP_FORMAT_ENV);
        std::env::remove_var(LOG_JSON_DISABLE_HTML_ESCAPING_ENV);
        std::env::remove_var(LOG_JSON_LEVEL_ENV);
    }

    // One test for every case: the process environment is shared between
    // test threads.
    #[test]
    fn layer_config_from_env() {
        clear_env();
        let config = LayerConfig::from_env().unwrap();
        assert_eq!(config.formatter, JsonFormatterConfig::default());
        assert_eq!(config.max_level, Level::Info);

        std::env::set_var(LOG_JSON_TIMESTAMP_FORMAT_ENV, "");
        std::env::set_var(LOG_JSON_DISABLE_HTML_ESCAPING_ENV, "yes");
        std::env::set_var(LOG_JSON_LEVEL_ENV, "debug");
        let config = LayerConfig::from_env().unwrap();
        assert_eq!(config.formatter.timestamp_format, None);
        assert!(config.formatter.html_escaping_disabled);
        assert_eq!(config.max_level, Level::Debug);

        std::env::set_var(LOG_JSON_TIMESTAMP_FORMAT_ENV, "%H:%M");
        let config = env::formatter_config_from_env().unwrap();
        assert_eq!(config.timestamp_format.as_deref(), Some("%H:%M"));

        std::env::set_var(LOG_JSON_DISABLE_HTML_ESCAPING_ENV, "sometimes");
        let err = LayerConfig::from_env().unwrap_err();
        assert!(matches!(
            err,
            InitError::Config(ConfigError::InvalidBool { ref key, .. })
                if key == LOG_JSON_DISABLE_HTML_ESCAPING_ENV
        ));

        std::env::set_var(LOG_JSON_DISABLE_HTML_ESCAPING_ENV, "false");
        std::env::set_var(LOG_JSON_LEVEL_ENV, "loud");
        assert!(matches!(
            LayerConfig::from_env(),
            Err(InitError::Config(ConfigError::InvalidLevel(_)))
        ));
        assert!(matches!(
            env::max_level_from_env(),
            Err(ConfigError::InvalidLevel(_))
        ));

        clear_env();
    }
}
