//! Notebook domain model.
//!
//! # Responsibility
//! - Define the notebook record owned by one creator and shared with members.
//! - Validate the color format before persistence.
//!
//! # Invariants
//! - `created_by` is immutable for the notebook lifetime.
//! - The access set always contains the owner; it is mutated only through
//!   the invite workflow (grants) and owner revocation, never by metadata
//!   updates.
//! - `deleted_at` is set if and only if `is_deleted` is true.

use crate::model::user::UserId;
use crate::model::{check_delete_marker, check_title, ModelValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable notebook identifier.
pub type NotebookId = Uuid;

static COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^((0x)?|#?)([0-9A-Fa-f]{8}|[0-9A-Fa-f]{6})$").expect("valid color regex")
});

/// Returns whether `value` is an accepted hex color string.
///
/// Accepted forms: bare, `#`-prefixed or `0x`-prefixed six or eight hex
/// digit strings, case-insensitive.
pub fn is_valid_color(value: &str) -> bool {
    COLOR_RE.is_match(value)
}

/// Canonical notebook record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notebook {
    pub uuid: NotebookId,
    pub title: String,
    pub emoji: Option<String>,
    pub color: String,
    /// Owner identity; immutable after creation.
    pub created_by: UserId,
    /// Soft delete tombstone; the record stays queryable for recovery.
    pub is_deleted: bool,
    /// Epoch ms deletion timestamp, present exactly when `is_deleted`.
    pub deleted_at: Option<i64>,
}

impl Notebook {
    /// Creates an active notebook with a generated stable ID.
    pub fn new(
        title: impl Into<String>,
        color: impl Into<String>,
        created_by: UserId,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            title: title.into(),
            emoji: None,
            color: color.into(),
            created_by,
            is_deleted: false,
            deleted_at: None,
        }
    }

    /// Checks field-level invariants before a write.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        check_title("notebook", &self.title)?;
        if !is_valid_color(&self.color) {
            return Err(ModelValidationError::InvalidColor(self.color.clone()));
        }
        check_delete_marker("notebook", self.is_deleted, self.deleted_at)
    }
}
