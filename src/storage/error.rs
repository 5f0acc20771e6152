//! Filesystem error kinds
//!
//! Each variant maps to exactly one HTTP status; see [`FsError::status`].

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsError {
    /// Metadata lookup failed. Missing and inaccessible paths are not told apart.
    #[error("stat '{}': {source}", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot delete a directory")]
    IsDirectory { path: PathBuf },

    #[error("{op} '{}': {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Forbidden: '{request_path}' resolves outside the root directory")]
    Forbidden { request_path: String },

    #[error("Bad path: '{request_path}' does not decode to UTF-8")]
    InvalidPath { request_path: String },
}

impl FsError {
    pub fn not_found(path: &Path, source: io::Error) -> Self {
        Self::NotFound {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn io(op: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    /// HTTP status for this error
    ///
    /// Stat failures answer 500, not 404.
    pub const fn status(&self) -> u16 {
        match self {
            Self::NotFound { .. } | Self::Io { .. } => 500,
            Self::IsDirectory { .. } | Self::InvalidPath { .. } => 400,
            Self::Forbidden { .. } => 403,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let missing = io::Error::from(io::ErrorKind::NotFound);
        assert_eq!(FsError::not_found(Path::new("/x"), missing).status(), 500);
        assert_eq!(
            FsError::IsDirectory {
                path: PathBuf::from("/x")
            }
            .status(),
            400
        );
        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        assert_eq!(FsError::io("unlink", Path::new("/x"), denied).status(), 500);
        assert_eq!(
            FsError::Forbidden {
                request_path: "/../etc".to_string()
            }
            .status(),
            403
        );
        assert_eq!(
            FsError::InvalidPath {
                request_path: "/%FF".to_string()
            }
            .status(),
            400
        );
    }

    #[test]
    fn test_message_includes_path_and_cause() {
        let err = FsError::io(
            "open",
            Path::new("/srv/a.txt"),
            io::Error::new(io::ErrorKind::Other, "disk on fire"),
        );
        let msg = err.to_string();
        assert!(msg.contains("open"));
        assert!(msg.contains("/srv/a.txt"));
        assert!(msg.contains("disk on fire"));
    }
}
