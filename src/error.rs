//! Error types for aimgr

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AimgrError>;

#[derive(Error, Debug)]
pub enum AimgrError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("missing configuration: {0}")]
    MissingConfig(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("{path}: {message}")]
    InvalidResource { path: PathBuf, message: String },

    #[error("{0}")]
    Failed(String),
}

impl AimgrError {
    pub fn invalid_resource(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidResource {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Short machine-readable code used in robot output.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "io_error",
            Self::Json(_) | Self::Yaml(_) => "serialization_error",
            Self::Git(_) => "git_error",
            Self::Config(_) | Self::MissingConfig(_) => "config_error",
            Self::Validation(_) | Self::InvalidResource { .. } => "validation_failed",
            Self::Conflict(_) => "conflict",
            Self::NotFound(_) => "not_found",
            Self::SourceUnavailable(_) => "source_unavailable",
            Self::Failed(_) => "error",
        }
    }
}
