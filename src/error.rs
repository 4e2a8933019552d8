//! Error types for the region layout migrator

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classes of failure, attached to the failure log of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad root path, unreachable filesystem, or a live storage service
    Environment,
    /// A structural anomaly escalated to a run failure
    Anomaly,
    /// A directory create or rename failed while moving a region
    Relocation,
    /// Anything else (catalog, configuration, plain I/O)
    Other,
}

/// Errors that can occur during a layout migration
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Environment Errors
    // =========================================================================
    /// Root directory failed scheme/authority validation
    #[error("Root directory path '{path}' is not valid: {reason}")]
    InvalidRootPath { path: String, reason: String },

    /// Filesystem could not be reached
    #[error("File system is not available: {0}")]
    FilesystemUnavailable(String),

    /// Storage service answered the liveness probe
    #[error("Storage service at {url} is running; the cluster must be off-line")]
    ServiceRunning { url: String },

    // =========================================================================
    // Structural Errors
    // =========================================================================
    /// An anomaly was resolved with the abort policy
    #[error("{message} aborting")]
    AnomalyAborted { message: String, path: PathBuf },

    /// Root directory has no entries at all
    #[error("No files found under root directory {0}")]
    EmptyRoot(PathBuf),

    /// Old-layout root region directory is missing
    #[error("Cannot find root region {0}")]
    RootRegionMissing(PathBuf),

    // =========================================================================
    // Relocation Errors
    // =========================================================================
    /// Moving a region directory failed
    #[error("Failed to relocate {from} to {to}: {source}")]
    Relocation {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Plumbing
    // =========================================================================
    /// I/O error on a specific path
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Catalog could not be read
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidRootPath { .. }
            | Error::FilesystemUnavailable(_)
            | Error::ServiceRunning { .. } => ErrorKind::Environment,
            Error::AnomalyAborted { .. } | Error::EmptyRoot(_) | Error::RootRegionMissing(_) => {
                ErrorKind::Anomaly
            }
            Error::Relocation { .. } => ErrorKind::Relocation,
            Error::Io { .. } | Error::Catalog(_) | Error::Config(_) | Error::Internal(_) => {
                ErrorKind::Other
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err = Error::ServiceRunning {
            url: "http://localhost:60010".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Environment);

        let err = Error::AnomalyAborted {
            message: "Unrecognized file foo".to_string(),
            path: PathBuf::from("/data/foo"),
        };
        assert_eq!(err.kind(), ErrorKind::Anomaly);
        assert_eq!(err.to_string(), "Unrecognized file foo aborting");

        let err = Error::Relocation {
            from: PathBuf::from("/a"),
            to: PathBuf::from("/b"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.kind(), ErrorKind::Relocation);
    }

    #[test]
    fn test_io_helper_keeps_path() {
        let err = Error::io(
            "/data/x",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/data/x"));
        assert_eq!(err.kind(), ErrorKind::Other);
    }
}
