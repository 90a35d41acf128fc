use std::io;
use thiserror::Error;

/// Custom error type for perfscope
#[derive(Error, Debug)]
pub enum PerfError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Metric source '{source_name}' failed: {message}")]
    Source {
        source_name: String,
        message: String,
    },

    #[error("Metric source '{0}' timed out after {1:?}")]
    SourceTimeout(String, std::time::Duration),

    #[error("Cannot access process {pid}: {message}")]
    ProcessAccess { pid: u32, message: String },

    #[error("GPU not available: {0}")]
    GpuNotAvailable(String),

    #[error("Alert delivery failed: {0}")]
    Alert(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for perfscope
pub type Result<T> = std::result::Result<T, PerfError>;

impl PerfError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        PerfError::Config(msg.into())
    }

    /// Create a source error for the named subsystem
    pub fn source_failure<N: Into<String>, S: Into<String>>(source_name: N, msg: S) -> Self {
        PerfError::Source {
            source_name: source_name.into(),
            message: msg.into(),
        }
    }

    pub fn process_access<S: Into<String>>(pid: u32, msg: S) -> Self {
        PerfError::ProcessAccess {
            pid,
            message: msg.into(),
        }
    }

    pub fn gpu_not_available<S: Into<String>>(msg: S) -> Self {
        PerfError::GpuNotAvailable(msg.into())
    }

    pub fn alert<S: Into<String>>(msg: S) -> Self {
        PerfError::Alert(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        PerfError::Other(msg.into())
    }
}
