//! Note use-case service.
//!
//! # Responsibility
//! - Provide note create/get/update/delete with access gating against the
//!   mirrored note access set.
//!
//! # Invariants
//! - Creation requires membership of the parent notebook; the new note
//!   inherits the notebook's current access set.
//! - The access set is never mutated through this service.
//! - Content edits are rejected while the note is locked; metadata edits
//!   (including unlocking) stay possible.

use crate::error::FailureKind;
use crate::model::note::{Note, NoteId};
use crate::model::notebook::NotebookId;
use crate::model::user::UserId;
use crate::model::{now_epoch_ms, ModelValidationError};
use crate::repo::note_repo::NoteRepository;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Input for note creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub emoji: Option<String>,
    pub content: String,
}

/// Partial note update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub emoji: Option<String>,
    pub content: Option<String>,
    pub locked: Option<bool>,
    /// Toggles the soft-delete marker; `deleted_at` follows automatically.
    pub deleted: Option<bool>,
}

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Target note does not exist.
    NoteNotFound(NoteId),
    /// Parent notebook does not exist.
    NotebookNotFound(NotebookId),
    /// Acting user is not in the relevant access set.
    NoAccess(UserId),
    /// Content edits are rejected while the note is locked.
    NoteLocked(NoteId),
    /// Field-level validation failure.
    Validation(ModelValidationError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl NoteServiceError {
    /// Classifies this error for the transport boundary.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NoteNotFound(_) | Self::NotebookNotFound(_) => FailureKind::NotFound,
            Self::NoAccess(_) => FailureKind::Forbidden,
            Self::NoteLocked(_) => FailureKind::Conflict,
            Self::Validation(_) => FailureKind::Invalid,
            Self::InconsistentState(_) | Self::Repo(_) => FailureKind::Internal,
        }
    }
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::NotebookNotFound(id) => write!(f, "notebook not found: {id}"),
            Self::NoAccess(user) => write!(f, "user {user} has no access to this note"),
            Self::NoteLocked(id) => write!(f, "note {id} is locked against content edits"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent note state: {details}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NoteNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Note service facade over repository implementations.
pub struct NoteService<R: NoteRepository> {
    repo: R,
}

impl<R: NoteRepository> NoteService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one note inside a notebook the acting user is a member of.
    pub fn create_note(
        &mut self,
        acting: UserId,
        notebook: NotebookId,
        draft: NoteDraft,
    ) -> Result<Note, NoteServiceError> {
        if !self.repo.notebook_exists(notebook)? {
            return Err(NoteServiceError::NotebookNotFound(notebook));
        }
        if !self.repo.is_notebook_member(notebook, acting)? {
            return Err(NoteServiceError::NoAccess(acting));
        }

        let mut note = Note::new(notebook, draft.title, acting);
        note.emoji = draft.emoji;
        note.content = draft.content;

        let uuid = self.repo.create_note(&note)?;
        self.repo
            .get_note(uuid)?
            .ok_or(NoteServiceError::InconsistentState(
                "created note not found in read-back",
            ))
    }

    /// Loads one note, access-gated.
    pub fn get_note(&self, acting: UserId, uuid: NoteId) -> Result<Note, NoteServiceError> {
        let note = self
            .repo
            .get_note(uuid)?
            .ok_or(NoteServiceError::NoteNotFound(uuid))?;
        self.ensure_access(uuid, acting)?;
        Ok(note)
    }

    /// Applies a patch, access-gated; stamps `last_updated_by`.
    pub fn update_note(
        &self,
        acting: UserId,
        uuid: NoteId,
        patch: NotePatch,
    ) -> Result<Note, NoteServiceError> {
        let mut note = self
            .repo
            .get_note(uuid)?
            .ok_or(NoteServiceError::NoteNotFound(uuid))?;
        self.ensure_access(uuid, acting)?;

        // Lock state at the time of the request decides, even when the
        // same patch also unlocks the note.
        if patch.content.is_some() && note.locked {
            return Err(NoteServiceError::NoteLocked(uuid));
        }

        if let Some(title) = patch.title {
            note.title = title;
        }
        if let Some(emoji) = patch.emoji {
            note.emoji = Some(emoji);
        }
        if let Some(content) = patch.content {
            note.content = content;
        }
        if let Some(locked) = patch.locked {
            note.locked = locked;
        }
        if let Some(deleted) = patch.deleted {
            note.is_deleted = deleted;
            note.deleted_at = deleted.then(now_epoch_ms);
        }
        note.last_updated_by = acting;

        self.repo.update_note(&note)?;
        self.repo
            .get_note(uuid)?
            .ok_or(NoteServiceError::InconsistentState(
                "updated note not found in read-back",
            ))
    }

    /// Hard-deletes one note, access-gated.
    pub fn delete_note(&mut self, acting: UserId, uuid: NoteId) -> Result<(), NoteServiceError> {
        self.repo
            .get_note(uuid)?
            .ok_or(NoteServiceError::NoteNotFound(uuid))?;
        self.ensure_access(uuid, acting)?;
        self.repo.delete_note(uuid)?;
        Ok(())
    }

    fn ensure_access(&self, uuid: NoteId, user: UserId) -> Result<(), NoteServiceError> {
        if !self.repo.is_note_member(uuid, user)? {
            return Err(NoteServiceError::NoAccess(user));
        }
        Ok(())
    }
}
