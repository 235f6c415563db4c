//! Picks the one error to show when every candidate release was rejected

use crate::error::{Error, ErrorKind};

/// Most to least interesting
const PRIORITY: [ErrorKind; 6] = [
    ErrorKind::InvalidFile,
    ErrorKind::VersionSame,
    ErrorKind::VersionNewer,
    ErrorKind::NotSupported,
    ErrorKind::Internal,
    ErrorKind::NotFound,
];

fn count(errors: &[Error], kind: ErrorKind) -> usize {
    errors.iter().filter(|e| e.kind() == kind).count()
}

fn all_within(errors: &[Error], kinds: &[ErrorKind]) -> bool {
    errors.iter().all(|e| kinds.contains(&e.kind()))
}

/// Collapse per-release failures into a single error
///
/// Several "already installed" or "newer installed" outcomes, with nothing
/// more serious among them, become [`Error::NothingToDo`]. Otherwise the
/// first error of the highest priority kind is returned.
pub fn best_error(errors: &[Error]) -> Error {
    if count(errors, ErrorKind::VersionSame) > 1
        && all_within(
            errors,
            &[
                ErrorKind::VersionSame,
                ErrorKind::NotFound,
                ErrorKind::NotSupported,
            ],
        )
    {
        return Error::NothingToDo("All updatable firmware is already installed".to_string());
    }
    if count(errors, ErrorKind::VersionNewer) > 1
        && all_within(
            errors,
            &[
                ErrorKind::VersionNewer,
                ErrorKind::VersionSame,
                ErrorKind::NotFound,
                ErrorKind::NotSupported,
            ],
        )
    {
        return Error::NothingToDo("All updatable devices already have newer versions".to_string());
    }

    PRIORITY
        .iter()
        .find_map(|kind| errors.iter().find(|e| e.kind() == *kind))
        .cloned()
        .unwrap_or_else(|| Error::NotFound("No supported devices found".to_string()))
}
