use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The variable is set but does not parse as the expected type.
    #[error("{name}='{value}' does not parse: {reason}")]
    Unparsable {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// Parsed fine but violates a range or cross-field constraint.
    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },

    #[error("{name} points at {path}, which does not exist")]
    MissingDirectory { name: &'static str, path: PathBuf },

    #[error("{name} points at {path}, which is not a directory")]
    NotADirectory { name: &'static str, path: PathBuf },
}
