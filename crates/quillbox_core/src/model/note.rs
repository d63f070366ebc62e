//! Note domain model.
//!
//! # Responsibility
//! - Define the note record living inside exactly one notebook.
//!
//! # Invariants
//! - `notebook_uuid` is immutable: notes are never reparented.
//! - The access set is a derived mirror of the parent notebook's set and is
//!   never granted or revoked by note-level operations.
//! - Content edits are rejected while `locked` is true.
//! - `deleted_at` is set if and only if `is_deleted` is true.

use crate::model::notebook::NotebookId;
use crate::model::user::UserId;
use crate::model::{check_delete_marker, check_title, ModelValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable note identifier.
pub type NoteId = Uuid;

/// Canonical note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub uuid: NoteId,
    /// Parent notebook; immutable after creation.
    pub notebook_uuid: NotebookId,
    pub title: String,
    pub emoji: Option<String>,
    pub content: String,
    /// While set, content edits are rejected; metadata stays editable.
    pub locked: bool,
    pub created_by: UserId,
    pub last_updated_by: UserId,
    pub is_deleted: bool,
    pub deleted_at: Option<i64>,
}

impl Note {
    /// Creates an active note with a generated stable ID.
    ///
    /// The creator starts as `last_updated_by`; every later patch replaces
    /// it with the acting user.
    pub fn new(
        notebook_uuid: NotebookId,
        title: impl Into<String>,
        created_by: UserId,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            notebook_uuid,
            title: title.into(),
            emoji: None,
            content: String::new(),
            locked: false,
            created_by,
            last_updated_by: created_by,
            is_deleted: false,
            deleted_at: None,
        }
    }

    /// Checks field-level invariants before a write.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        check_title("note", &self.title)?;
        check_delete_marker("note", self.is_deleted, self.deleted_at)
    }
}

#[cfg(test)]
mod tests {
    use super::Note;
    use crate::model::ModelValidationError;
    use uuid::Uuid;

    #[test]
    fn validate_rejects_blank_title() {
        let mut note = Note::new(Uuid::new_v4(), "draft", Uuid::new_v4());
        note.title = "   ".to_string();
        assert_eq!(
            note.validate(),
            Err(ModelValidationError::BlankTitle("note"))
        );
    }
}
