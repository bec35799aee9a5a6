use std::path::PathBuf;

/// Result type for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown configuration format for {path} (supported: .toml, .yaml, .yml, .json)")]
    UnknownFormat { path: PathBuf },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid value for {var}: {message}")]
    EnvVar { var: String, message: String },

    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },
}
