//! Typed errors shared by every requirement check

use serde::Serialize;
use thiserror::Error;

/// Error returned by admission and requirement checks.
///
/// Each variant carries the fully rendered message shown to the user; the
/// variant itself is what callers (and [`crate::best_error`]) branch on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A referenced id, device or requirement target does not exist
    #[error("{0}")]
    NotFound(String),
    /// A requirement kind, operator or topology shape that is rejected
    #[error("{0}")]
    NotSupported(String),
    /// Malformed input, or a requirement predicate that did not hold
    #[error("{0}")]
    InvalidFile(String),
    /// Invariant violation
    #[error("{0}")]
    Internal(String),
    /// The release version is already installed
    #[error("{0}")]
    VersionSame(String),
    /// The installed version is newer than the release
    #[error("{0}")]
    VersionNewer(String),
    /// Synthesized when every candidate is already up to date
    #[error("{0}")]
    NothingToDo(String),
}

/// Discriminant of [`Error`] without the message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    NotFound,
    NotSupported,
    InvalidFile,
    Internal,
    VersionSame,
    VersionNewer,
    NothingToDo,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::NotSupported(_) => ErrorKind::NotSupported,
            Error::InvalidFile(_) => ErrorKind::InvalidFile,
            Error::Internal(_) => ErrorKind::Internal,
            Error::VersionSame(_) => ErrorKind::VersionSame,
            Error::VersionNewer(_) => ErrorKind::VersionNewer,
            Error::NothingToDo(_) => ErrorKind::NothingToDo,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Error::NotFound(msg)
            | Error::NotSupported(msg)
            | Error::InvalidFile(msg)
            | Error::Internal(msg)
            | Error::VersionSame(msg)
            | Error::VersionNewer(msg)
            | Error::NothingToDo(msg) => msg,
        }
    }

    /// Prepend context to the message, keeping the kind
    pub fn prefixed(self, prefix: &str) -> Self {
        let msg = format!("{}{}", prefix, self.message());
        match self.kind() {
            ErrorKind::NotFound => Error::NotFound(msg),
            ErrorKind::NotSupported => Error::NotSupported(msg),
            ErrorKind::InvalidFile => Error::InvalidFile(msg),
            ErrorKind::Internal => Error::Internal(msg),
            ErrorKind::VersionSame => Error::VersionSame(msg),
            ErrorKind::VersionNewer => Error::VersionNewer(msg),
            ErrorKind::NothingToDo => Error::NothingToDo(msg),
        }
    }
}

/// Result type alias for requirement checks
pub type Result<T> = std::result::Result<T, Error>;
