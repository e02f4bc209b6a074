//! Central error handling for tilecheck
//!
//! File-level failures carry the offending path so callers can tell which side of a
//! comparison failed to load.

use std::path::{Path, PathBuf};

use crate::config::ConfigError;
use crate::diff::PolicyError;
use crate::tiles3d::DecodeError;

/// Crate-level error for operations that touch the filesystem or build a policy
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {} [{}]: {source}", .path.display(), .source.code())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    #[error("invalid policy: {0}")]
    Policy(#[from] PolicyError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Error::Io { path: path.to_path_buf(), source }
    }

    pub fn decode(path: &Path, source: DecodeError) -> Self {
        Error::Decode { path: path.to_path_buf(), source }
    }

    /// Path of the file that failed, if the error is tied to one
    pub fn path(&self) -> Option<&Path> {
        match self {
            Error::Io { path, .. } | Error::Decode { path, .. } => Some(path),
            Error::Policy(_) | Error::Config(_) => None,
        }
    }
}

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, Error>;
