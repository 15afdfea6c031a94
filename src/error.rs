/// Error returned when a single record cannot be formatted.
#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    /// The merged fields could not be encoded as JSON.
    #[error("failed to marshal fields to JSON: {0}")]
    Marshal(#[source] serde_json::Error),

    #[error("failed to render timestamp with pattern {0:?}")]
    Timestamp(String),
}

/// Error returned when a formatter or layer is built from invalid settings.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid timestamp format: {0:?}")]
    InvalidTimestampFormat(String),

    #[error("invalid boolean value {value:?} for {key}")]
    InvalidBool { key: String, value: String },

    #[error("invalid log level: {0:?}")]
    InvalidLevel(String),
}

/// Error returned when installing the global subscriber.
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to set global subscriber: {0}")]
    SetGlobalDefault(#[from] tracing::subscriber::SetGlobalDefaultError),
}
