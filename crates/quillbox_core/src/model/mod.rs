//! Domain models shared by repositories and services.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod invite;
pub mod note;
pub mod notebook;
pub mod todo;
pub mod user;

/// Field-level invariant violation raised by `validate()` on domain records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// Title is empty after trimming.
    BlankTitle(&'static str),
    /// Color value is not a recognized hex string.
    InvalidColor(String),
    /// `deleted_at` must be set if and only if the record is soft-deleted.
    DeleteMarkerMismatch(&'static str),
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle(entity) => write!(f, "{entity} title must not be blank"),
            Self::InvalidColor(value) => write!(f, "`{value}` is not a valid hex color"),
            Self::DeleteMarkerMismatch(entity) => write!(
                f,
                "{entity} deleted_at must be set exactly when the record is deleted"
            ),
        }
    }
}

impl Error for ModelValidationError {}

/// Current wall-clock time in Unix epoch milliseconds.
///
/// Soft-delete markers are stamped from the process clock so the value can
/// be cleared and compared without another storage round-trip.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

pub(crate) fn check_delete_marker(
    entity: &'static str,
    is_deleted: bool,
    deleted_at: Option<i64>,
) -> Result<(), ModelValidationError> {
    if is_deleted != deleted_at.is_some() {
        return Err(ModelValidationError::DeleteMarkerMismatch(entity));
    }
    Ok(())
}

pub(crate) fn check_title(
    entity: &'static str,
    title: &str,
) -> Result<(), ModelValidationError> {
    if title.trim().is_empty() {
        return Err(ModelValidationError::BlankTitle(entity));
    }
    Ok(())
}
