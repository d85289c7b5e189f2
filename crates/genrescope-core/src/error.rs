use std::path::PathBuf;

use thiserror::Error;

/// All errors that can occur in genrescope-core.
#[derive(Debug, Error)]
pub enum GenrescopeError {
    #[error("Data source unavailable: {path}: {reason}")]
    DataSourceUnavailable { path: PathBuf, reason: String },

    #[error("Schema mismatch: {path} has no column '{column}'")]
    SchemaMismatch { path: PathBuf, column: String },

    #[error("Cannot compute relative rating for '{genre}': baseline is zero")]
    DivisionByZero { genre: String },

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl GenrescopeError {
    pub fn unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::DataSourceUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Exit code the CLI should terminate with for this error.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::DataSourceUnavailable { .. } | Self::SchemaMismatch { .. } | Self::Io(_) => {
                ExitCode::DataSourceError
            }
            Self::DivisionByZero { .. } => ExitCode::ComputationError,
            Self::ConfigError(_) | Self::TomlParse(_) | Self::TomlSerialize(_) => {
                ExitCode::InvalidArgs
            }
            Self::Csv(_) | Self::Json(_) => ExitCode::GeneralError,
        }
    }
}

/// Exit codes used by the CLI.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    NotFound = 2,
    InvalidArgs = 3,
    DataSourceError = 4,
    ComputationError = 5,
}

pub type Result<T> = std::result::Result<T, GenrescopeError>;
