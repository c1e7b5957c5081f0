//! Executor error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while changing the host.
#[derive(Error, Debug)]
pub enum ExecuteError {
    #[error("command failed: {cmd} (exit code: {code:?})\nstderr: {stderr}")]
    CommandFailed {
        cmd: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("failed to start {cmd}: {source}")]
    Spawn {
        cmd: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot fast-forward {path} to origin/{branch}\nDetails: {details}")]
    FastForward {
        path: PathBuf,
        branch: String,
        details: String,
    },

    #[error("{0} contains a .git directory but is not a valid repository")]
    CorruptCheckout(PathBuf),

    #[error("nginx rejected the configuration, not reloading\nDetails: {details}")]
    ProxyConfigInvalid { details: String },
}

impl ExecuteError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// stderr of a failed command, if this error carries one.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}
