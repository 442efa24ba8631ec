//! Error types for CLI operations.

use std::path::PathBuf;

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Input file not found
    #[error("Input file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    /// Configuration file not found
    #[error("Configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// Configuration could not be loaded or failed validation
    #[error("Invalid configuration: {0}")]
    Config(#[from] contracts::TelemetryError),

    /// An input could not be ingested
    #[error("Failed to ingest {}: {source}", path.display())]
    Ingestion {
        path: PathBuf,
        #[source]
        source: ingestion::IngestionError,
    },

    /// A blocking load task panicked or was cancelled
    #[error("Load task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl CliError {
    pub fn input_not_found(path: impl Into<PathBuf>) -> Self {
        Self::InputNotFound { path: path.into() }
    }

    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn ingestion(path: impl Into<PathBuf>, source: ingestion::IngestionError) -> Self {
        Self::Ingestion {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
