//! Notebook use-case service.
//!
//! # Responsibility
//! - Provide notebook create/get/update/delete with membership gating.
//! - Orchestrate owner-initiated access revocation and the note fan-out
//!   that follows it.
//!
//! # Invariants
//! - Creation always seeds the access set with the creator.
//! - Metadata updates never touch the access set.
//! - Every successful revoke is immediately followed by mirroring, so the
//!   staleness window between notebook and note access stays as small as
//!   the two-step protocol allows.

use crate::error::FailureKind;
use crate::model::notebook::{Notebook, NotebookId};
use crate::model::user::UserId;
use crate::model::{now_epoch_ms, ModelValidationError};
use crate::repo::access::RevokeOutcome;
use crate::repo::notebook_repo::{NotebookDetails, NotebookRepository};
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Input for notebook creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotebookDraft {
    pub title: String,
    pub emoji: Option<String>,
    pub color: String,
}

/// Partial metadata update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotebookPatch {
    pub title: Option<String>,
    pub emoji: Option<String>,
    pub color: Option<String>,
    /// Toggles the soft-delete marker; `deleted_at` follows automatically.
    pub deleted: Option<bool>,
}

/// Service error for notebook use-cases.
#[derive(Debug)]
pub enum NotebookServiceError {
    /// Target notebook does not exist.
    NotebookNotFound(NotebookId),
    /// Acting user is not in the notebook's access set.
    NoAccess { notebook: NotebookId, user: UserId },
    /// Operation is restricted to the notebook owner.
    NotOwner { notebook: NotebookId, user: UserId },
    /// Field-level validation failure (blank title, malformed color).
    Validation(ModelValidationError),
    /// Revoke target is not in the access set.
    TargetNotGranted { notebook: NotebookId, user: UserId },
    /// The owner cannot be removed from the access set.
    OwnerAlwaysMember(NotebookId),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl NotebookServiceError {
    /// Classifies this error for the transport boundary.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotebookNotFound(_) => FailureKind::NotFound,
            Self::NoAccess { .. } | Self::NotOwner { .. } => FailureKind::Forbidden,
            Self::Validation(_) => FailureKind::Invalid,
            Self::TargetNotGranted { .. } | Self::OwnerAlwaysMember(_) => FailureKind::Conflict,
            Self::InconsistentState(_) | Self::Repo(_) => FailureKind::Internal,
        }
    }
}

impl Display for NotebookServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotebookNotFound(id) => write!(f, "notebook not found: {id}"),
            Self::NoAccess { notebook, user } => {
                write!(f, "user {user} has no access to notebook {notebook}")
            }
            Self::NotOwner { notebook, user } => {
                write!(f, "user {user} is not the owner of notebook {notebook}")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::TargetNotGranted { notebook, user } => {
                write!(f, "user {user} has no access to revoke on notebook {notebook}")
            }
            Self::OwnerAlwaysMember(notebook) => {
                write!(f, "the owner of notebook {notebook} cannot be removed")
            }
            Self::InconsistentState(details) => {
                write!(f, "inconsistent notebook state: {details}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NotebookServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NotebookServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotebookNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Notebook service facade over repository implementations.
pub struct NotebookService<R: NotebookRepository> {
    repo: R,
}

impl<R: NotebookRepository> NotebookService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one notebook owned by the acting user.
    pub fn create_notebook(
        &mut self,
        acting: UserId,
        draft: NotebookDraft,
    ) -> Result<NotebookDetails, NotebookServiceError> {
        let mut notebook = Notebook::new(draft.title, draft.color, acting);
        notebook.emoji = draft.emoji;

        let uuid = self.repo.create_notebook(&notebook)?;
        self.repo
            .get_details(uuid)?
            .ok_or(NotebookServiceError::InconsistentState(
                "created notebook not found in read-back",
            ))
    }

    /// Loads one notebook with members and child notes, membership-gated.
    pub fn get_notebook(
        &self,
        acting: UserId,
        uuid: NotebookId,
    ) -> Result<NotebookDetails, NotebookServiceError> {
        let details = self
            .repo
            .get_details(uuid)?
            .ok_or(NotebookServiceError::NotebookNotFound(uuid))?;
        self.ensure_member(uuid, acting)?;
        Ok(details)
    }

    /// Applies a metadata patch, membership-gated.
    pub fn update_notebook(
        &self,
        acting: UserId,
        uuid: NotebookId,
        patch: NotebookPatch,
    ) -> Result<NotebookDetails, NotebookServiceError> {
        let mut notebook = self
            .repo
            .get_notebook(uuid)?
            .ok_or(NotebookServiceError::NotebookNotFound(uuid))?;
        self.ensure_member(uuid, acting)?;

        if let Some(title) = patch.title {
            notebook.title = title;
        }
        if let Some(emoji) = patch.emoji {
            notebook.emoji = Some(emoji);
        }
        if let Some(color) = patch.color {
            notebook.color = color;
        }
        if let Some(deleted) = patch.deleted {
            notebook.is_deleted = deleted;
            notebook.deleted_at = deleted.then(now_epoch_ms);
        }

        self.repo.update_notebook(&notebook)?;
        self.repo
            .get_details(uuid)?
            .ok_or(NotebookServiceError::InconsistentState(
                "updated notebook not found in read-back",
            ))
    }

    /// Hard-deletes one notebook with its notes and invites, owner-gated.
    pub fn delete_notebook(
        &mut self,
        acting: UserId,
        uuid: NotebookId,
    ) -> Result<(), NotebookServiceError> {
        self.ensure_owner(uuid, acting)?;
        self.repo.delete_notebook(uuid)?;
        Ok(())
    }

    /// Removes one user from the access set and mirrors the change onto
    /// every child note, owner-gated.
    pub fn revoke_access(
        &mut self,
        acting: UserId,
        uuid: NotebookId,
        target: UserId,
    ) -> Result<NotebookDetails, NotebookServiceError> {
        let owner = self.ensure_owner(uuid, acting)?;
        if target == owner {
            return Err(NotebookServiceError::OwnerAlwaysMember(uuid));
        }

        match self.repo.revoke_access(uuid, target)? {
            RevokeOutcome::NotGranted => {
                return Err(NotebookServiceError::TargetNotGranted {
                    notebook: uuid,
                    user: target,
                });
            }
            RevokeOutcome::Revoked => {
                let mirrored = self.repo.mirror_access(uuid)?;
                info!(
                    "event=access_revoke module=service status=ok notebook={uuid} user={target} mirrored_rows={mirrored}"
                );
            }
        }

        self.repo
            .get_details(uuid)?
            .ok_or(NotebookServiceError::InconsistentState(
                "notebook missing after revoke",
            ))
    }

    fn ensure_member(
        &self,
        uuid: NotebookId,
        user: UserId,
    ) -> Result<(), NotebookServiceError> {
        if !self.repo.is_member(uuid, user)? {
            return Err(NotebookServiceError::NoAccess {
                notebook: uuid,
                user,
            });
        }
        Ok(())
    }

    fn ensure_owner(
        &self,
        uuid: NotebookId,
        user: UserId,
    ) -> Result<UserId, NotebookServiceError> {
        let owner = self
            .repo
            .owner_of(uuid)?
            .ok_or(NotebookServiceError::NotebookNotFound(uuid))?;
        if owner != user {
            return Err(NotebookServiceError::NotOwner {
                notebook: uuid,
                user,
            });
        }
        Ok(owner)
    }
}
