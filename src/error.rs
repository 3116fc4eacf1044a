//! Error handling for rpcgen
//!
//! Every failure names the parameter or artifact it concerns so the caller
//! can tell a configuration problem from a filesystem problem.

use std::path::PathBuf;

use thiserror::Error;

use crate::export::ArtifactKind;

/// Result type alias for rpcgen operations
pub type Result<T> = std::result::Result<T, RpcError>;

/// Main error type for rpcgen operations
#[derive(Error, Debug)]
pub enum RpcError {
    // Configuration Errors
    #[error("Invalid configuration: {parameter}: {reason}")]
    InvalidConfiguration { parameter: String, reason: String },

    #[error("Failed to read config file: {path}: {source}")]
    ConfigFileError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {path}: {source}")]
    ConfigParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // Output Errors
    #[error("Cannot create output directory: {path}: {source}")]
    OutputDirectoryError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {artifact} artifact: {path}: {source}")]
    OutputWriteError {
        artifact: ArtifactKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {artifact} artifact: {path}: {source}")]
    ArtifactRead {
        artifact: ArtifactKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Skeleton / Verification Errors
    #[error("Invalid GDS skeleton at offset {offset}: {message}")]
    InvalidSkeleton { offset: u64, message: String },

    #[error("Verification failed: {reason}")]
    VerificationFailed { reason: String },

    #[error("Plot rendering failed: {0}")]
    PlotRender(String),

    #[error("Layout self-test failed: {polygons} polygons generated, expected at least {expected}")]
    SelfTestFailed { polygons: usize, expected: usize },

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RpcError {
    /// Shorthand for an `InvalidConfiguration` error.
    pub fn invalid(parameter: &str, reason: impl Into<String>) -> Self {
        RpcError::InvalidConfiguration {
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            RpcError::InvalidConfiguration { .. } => "INVALID_CONFIGURATION",
            RpcError::ConfigFileError { .. } => "CONFIG_FILE_ERROR",
            RpcError::ConfigParseError { .. } => "CONFIG_PARSE_ERROR",
            RpcError::OutputDirectoryError { .. } => "OUTPUT_DIRECTORY_ERROR",
            RpcError::OutputWriteError { .. } => "OUTPUT_WRITE_ERROR",
            RpcError::ArtifactRead { .. } => "ARTIFACT_READ_ERROR",
            RpcError::InvalidSkeleton { .. } => "INVALID_SKELETON",
            RpcError::VerificationFailed { .. } => "VERIFICATION_FAILED",
            RpcError::PlotRender(_) => "PLOT_RENDER_ERROR",
            RpcError::SelfTestFailed { .. } => "SELF_TEST_FAILED",
            RpcError::Serialization(_) => "SERIALIZATION_ERROR",
            RpcError::Io(_) => "IO_ERROR",
        }
    }

    /// True when the caller supplied parameters that violate preconditions.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            RpcError::InvalidConfiguration { .. }
                | RpcError::ConfigFileError { .. }
                | RpcError::ConfigParseError { .. }
        )
    }

    /// True for filesystem failures while writing or reading artifacts.
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            RpcError::OutputDirectoryError { .. }
                | RpcError::OutputWriteError { .. }
                | RpcError::ArtifactRead { .. }
                | RpcError::Io(_)
        )
    }

    /// Process exit code for the CLI.
    ///
    /// 2 = configuration, 3 = I/O, 4 = verification mismatch, 1 = other.
    pub fn exit_code(&self) -> u8 {
        if self.is_configuration_error() {
            2
        } else if self.is_io_error() {
            3
        } else if matches!(
            self,
            RpcError::VerificationFailed { .. } | RpcError::InvalidSkeleton { .. }
        ) {
            4
        } else {
            1
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            RpcError::InvalidConfiguration { .. } => vec![
                "Channel count must be a positive integer (default 8)",
                "Spacing, pitch, radius and width overrides must be positive",
            ],
            RpcError::ConfigFileError { .. } | RpcError::ConfigParseError { .. } => vec![
                "Check the --config path is correct",
                "The config file must be a JSON object with known keys only",
            ],
            RpcError::OutputDirectoryError { .. } => vec![
                "Check the --out path is a directory you can write to",
                "A regular file with the same name may be in the way",
            ],
            RpcError::OutputWriteError { .. } => vec![
                "Free up disk space or choose another --out directory",
                "Artifacts written earlier in this run have been removed",
            ],
            RpcError::ArtifactRead { .. } => {
                vec!["Run the generator into this directory before verifying"]
            }
            RpcError::VerificationFailed { .. } | RpcError::InvalidSkeleton { .. } => vec![
                "Artifacts may come from different runs; regenerate them together",
            ],
            _ => vec![],
        }
    }
}
