//! Configuration error types.

/// Result type alias for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur during configuration loading and resolution.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a config file.
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },

    /// Failed to parse TOML.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to serialize config.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A credential source was configured but yielded nothing.
    #[error("credential not found: {0}")]
    CredentialNotFound(String),

    /// Field values that cannot be used together or at all.
    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: String, reason: String },

    /// Monitor name not present in any loaded layer.
    #[error("monitor '{0}' not found")]
    MonitorNotFound(String),
}
