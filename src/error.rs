//! Error types for package building.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building an installer package.
#[derive(Error, Debug)]
pub enum PkgError {
    #[error("{name} is not installed. First install it with 'brew install {name}'.")]
    NotInstalled { name: String },

    #[error("command failed: {cmd} (exit code: {code:?})")]
    CommandFailed { cmd: String, code: Option<i32> },

    #[error("failed to start {cmd}: {source}")]
    CommandSpawn {
        cmd: String,
        #[source]
        source: std::io::Error,
    },

    #[error("copy failed: {} -> {}: {source}", src.display(), dest.display())]
    Copy {
        src: PathBuf,
        dest: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid install receipt {}: {source}", path.display())]
    Receipt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = PkgError> = std::result::Result<T, E>;
