//! Outcome of checking each release and device pair

use firmgate_core::{Error, ErrorKind};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&Error> for Failure {
    fn from(err: &Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.message().to_string(),
        }
    }
}

/// Result for one release on one device
#[derive(Debug, Clone, Serialize)]
pub struct PairReport {
    pub release: String,
    /// Absent when the release could not be loaded
    pub device: Option<String>,
    pub version: Option<String>,
    pub admitted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Failure>,
}

impl PairReport {
    pub fn new(
        release: &str,
        device: Option<&str>,
        version: Option<&str>,
        outcome: &firmgate_core::Result<()>,
    ) -> Self {
        Self {
            release: release.to_string(),
            device: device.map(str::to_string),
            version: version.map(str::to_string),
            admitted: outcome.is_ok(),
            error: outcome.as_ref().err().map(Failure::from),
        }
    }
}

impl fmt::Display for PairReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = self.device.as_deref().unwrap_or("-");
        let version = self.version.as_deref().unwrap_or("?");
        match &self.error {
            None => write!(f, "ok    {} {} -> {}", self.release, version, target),
            Some(failure) => write!(
                f,
                "fail  {} {} -> {}: {}",
                self.release, version, target, failure.message
            ),
        }
    }
}

/// Full harness output
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub pairs: Vec<PairReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_error: Option<Failure>,
}

impl Report {
    pub fn any_admitted(&self) -> bool {
        self.pairs.iter().any(|p| p.admitted)
    }
}
