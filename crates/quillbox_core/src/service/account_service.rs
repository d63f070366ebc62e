//! Account deletion cascade.
//!
//! # Responsibility
//! - Tear down everything an account owns, plus every invitation naming
//!   it, in a fixed order across collections.
//!
//! # Invariants
//! - Step order: todos, invitations, notes, notebooks, then the profile
//!   row itself.
//! - Steps are independently idempotent delete-by-filter operations with
//!   no cross-step transaction; repeating a partially completed cascade
//!   re-runs the satisfied steps as no-ops.
//! - Ownership-only: shared content the account did not create survives,
//!   with the account's identity left dangling in its access sets.

use crate::error::FailureKind;
use crate::model::user::UserId;
use crate::repo::account_repo::AccountRepository;
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Per-collection counts from one cascade run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub todos_deleted: usize,
    pub invites_deleted: usize,
    pub notes_deleted: usize,
    pub notebooks_deleted: usize,
}

/// Service error for the account deletion cascade.
#[derive(Debug)]
pub enum AccountServiceError {
    /// The profile row was already gone; prior steps still ran.
    UserNotFound(UserId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl AccountServiceError {
    /// Classifies this error for the transport boundary.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::UserNotFound(_) => FailureKind::NotFound,
            Self::Repo(_) => FailureKind::Internal,
        }
    }
}

impl Display for AccountServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AccountServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::UserNotFound(_) => None,
        }
    }
}

impl From<RepoError> for AccountServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Account teardown facade over repository implementations.
pub struct AccountService<R: AccountRepository> {
    repo: R,
}

impl<R: AccountRepository> AccountService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Deletes everything the user owns and every invitation naming them,
    /// then the profile row itself.
    ///
    /// Notebooks go through the full notebook cascade, so child notes
    /// created by other users disappear with the parent. Fails with
    /// `UserNotFound` when the profile row was already gone; the earlier
    /// steps have still been re-run as no-ops at that point.
    pub fn delete_account(
        &mut self,
        user: UserId,
    ) -> Result<CascadeReport, AccountServiceError> {
        let mut report = CascadeReport {
            todos_deleted: self.repo.delete_todos_by_creator(user)?,
            invites_deleted: self.repo.delete_invites_for_user(user)?,
            notes_deleted: self.repo.delete_notes_by_creator(user)?,
            notebooks_deleted: 0,
        };

        for notebook in self.repo.list_notebooks_by_creator(user)? {
            if self.repo.delete_notebook_cascade(notebook)? {
                report.notebooks_deleted += 1;
            }
        }

        let removed = self.repo.delete_user(user)?;
        info!(
            "event=account_cascade module=service status={} user={user} todos={} invites={} notes={} notebooks={}",
            if removed { "ok" } else { "user_missing" },
            report.todos_deleted,
            report.invites_deleted,
            report.notes_deleted,
            report.notebooks_deleted,
        );

        if !removed {
            return Err(AccountServiceError::UserNotFound(user));
        }
        Ok(report)
    }
}
