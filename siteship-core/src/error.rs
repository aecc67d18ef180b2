//! Error types for the siteship core pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for core sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Fatal errors of the sync pipeline.
///
/// Per-file conditions (a single upload failing, a single path not resolving
/// under the base) are not represented here: those are collected into the
/// [`crate::synchronise::SyncReport`] and never abort the batch.
#[derive(Error, Debug)]
pub enum SyncError {
    /// A required configuration value is missing or unparsable.
    /// Raised before any I/O is attempted.
    #[error("missing or invalid configuration value '{name}': {message}")]
    Configuration { name: String, message: String },

    /// The remote session could not be established or authenticated.
    /// Aborts the whole sync before any transfer begins.
    #[error("cannot establish remote session: {0}")]
    Connection(String),

    /// A glob pattern in the manifest configuration did not parse.
    #[error("invalid glob pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    /// A matched local file is not reachable beneath the configured base
    /// path. Fatal for that file only: the orchestration layer records it in
    /// the report and carries on.
    #[error("path '{path}' is not beneath base '{base}'")]
    PathResolution { path: PathBuf, base: PathBuf },

    /// Local I/O failure while enumerating the manifest.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Shorthand for a missing environment variable.
    pub fn missing_env(name: &str) -> Self {
        SyncError::Configuration {
            name: name.to_string(),
            message: "environment variable not set".to_string(),
        }
    }
}

/// Errors of the build task graph.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("unknown task '{0}'")]
    UnknownTask(String),

    #[error("task '{0}' is already registered")]
    DuplicateTask(String),

    #[error("task '{task}' has an empty command")]
    EmptyCommand { task: String },

    #[error("dependency cycle involving task '{0}'")]
    Cycle(String),

    #[error("task '{task}' failed to start: {source}")]
    Spawn {
        task: String,
        #[source]
        source: std::io::Error,
    },

    #[error("task '{task}' exited with {status}")]
    CommandFailed { task: String, status: String },

    #[error("task '{task}' could not copy {path}: {message}")]
    Copy {
        task: String,
        path: PathBuf,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_names_the_variable() {
        let err = SyncError::missing_env("FTP_HOST");
        assert!(err.to_string().contains("FTP_HOST"));
    }

    #[test]
    fn cycle_error_names_the_task() {
        let err = TaskError::Cycle("styles".into());
        assert!(err.to_string().contains("styles"));
    }
}
