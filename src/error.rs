//! Error types for hotswap-props.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Result type alias for hotswap-props operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when managing a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configured path exists but is not a usable regular file.
    ///
    /// This is a caller-input error: the path is a directory, a symbolic link,
    /// or lacks read/write access. The file is never created or modified when
    /// this is returned.
    #[error("Config path must be a readable and writable regular file: {} ({reason})", path.display())]
    InvalidConfigPath {
        /// The offending path
        path: PathBuf,
        /// Which check failed
        reason: String,
    },

    /// IO error while creating, reading or writing the backing file.
    #[error("IO error on {}: {source}", path.display())]
    IoError {
        /// The file the operation was acting on
        path: PathBuf,
        /// The underlying IO error
        #[source]
        source: io::Error,
    },

    /// The backing file was removed before a save.
    #[error("Configuration file does not exist: {}", .0.display())]
    ConfigFileMissing(PathBuf),

    /// File watching could not be set up or torn down.
    #[error("File watching error: {0}")]
    WatchError(String),

    /// The backing file content is malformed.
    #[error("Failed to parse configuration at line {line}: {message}")]
    ParseError {
        /// 1-based line number where the problem starts
        line: usize,
        /// What was wrong
        message: String,
    },

    /// The configuration model rejected the loaded values.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl ConfigError {
    /// Wrap an IO error with the path it occurred on.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::IoError {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Build an [`ConfigError::InvalidConfigPath`] error.
    pub fn invalid_path(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::InvalidConfigPath {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Whether this error came from the caller passing an unusable path.
    pub fn is_invalid_path(&self) -> bool {
        matches!(self, Self::InvalidConfigPath { .. })
    }
}

/// Error returned by a configuration model that cannot accept the given values.
#[derive(Debug)]
pub enum ValidationError {
    /// Custom validation error with a message.
    Custom(String),

    /// A specific field has an invalid value.
    InvalidField {
        /// The field name (properties key)
        field: String,
        /// The reason why it's invalid
        reason: String,
    },

    /// Multiple validation errors occurred.
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    /// Create a custom validation error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create an invalid field error.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(msg) => write!(f, "{}", msg),
            Self::InvalidField { field, reason } => {
                write!(f, "Field '{}' is invalid: {}", field, reason)
            }
            Self::Multiple(errors) => {
                writeln!(f, "Multiple validation errors:")?;
                for (i, err) in errors.iter().enumerate() {
                    writeln!(f, "  {}. {}", i + 1, err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for ConfigError {
    fn from(err: ValidationError) -> Self {
        ConfigError::ValidationError(err.to_string())
    }
}
