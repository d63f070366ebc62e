//! Notebook invitation state machine.
//!
//! # Responsibility
//! - Orchestrate invite create/accept/withdraw against the invitation
//!   ledger, and trigger access mirroring on acceptance.
//!
//! # Invariants
//! - Creation order: self-invite, notebook existence, ownership, receiver
//!   existence, membership, then duplicate check. Membership is checked
//!   before the duplicate check, so inviting an existing member reports
//!   the membership conflict even when a stale pending invite exists.
//! - Acceptance uses the conditional grant: of two concurrent accepts for
//!   the same invite, exactly one observes the grant and runs the fan-out;
//!   the loser reports the membership conflict and must not re-mirror.
//! - An invite whose receiver already has access is deleted during the
//!   failed accept instead of left dangling.

use crate::error::FailureKind;
use crate::model::invite::{InviteId, NotebookInvite};
use crate::model::notebook::NotebookId;
use crate::model::user::UserId;
use crate::repo::access::GrantOutcome;
use crate::repo::invite_repo::{InviteDetails, InviteRepository};
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for invitation use-cases.
#[derive(Debug)]
pub enum InviteServiceError {
    /// Target invite does not exist.
    InviteNotFound(InviteId),
    /// Referenced notebook does not exist.
    NotebookNotFound(NotebookId),
    /// Invite receiver has no profile row.
    ReceiverNotFound(UserId),
    /// Users cannot invite themselves.
    SelfInvite(UserId),
    /// Only the notebook owner can create invites.
    NotOwner { notebook: NotebookId, user: UserId },
    /// Only the invite receiver can accept.
    NotReceiver { invite: InviteId, user: UserId },
    /// Only the inviter or the receiver can withdraw.
    NotParticipant { invite: InviteId, user: UserId },
    /// Acting user is not in the notebook's access set.
    NoAccess { notebook: NotebookId, user: UserId },
    /// Receiver is already in the notebook's access set.
    AlreadyMember { notebook: NotebookId, user: UserId },
    /// A live invite already exists for this (notebook, receiver) pair.
    DuplicateInvite { notebook: NotebookId, receiver: UserId },
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl InviteServiceError {
    /// Classifies this error for the transport boundary.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InviteNotFound(_)
            | Self::NotebookNotFound(_)
            | Self::ReceiverNotFound(_) => FailureKind::NotFound,
            Self::NotOwner { .. }
            | Self::NotReceiver { .. }
            | Self::NotParticipant { .. }
            | Self::NoAccess { .. } => FailureKind::Forbidden,
            Self::SelfInvite(_) | Self::AlreadyMember { .. } | Self::DuplicateInvite { .. } => {
                FailureKind::Conflict
            }
            Self::InconsistentState(_) | Self::Repo(_) => FailureKind::Internal,
        }
    }
}

impl Display for InviteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InviteNotFound(id) => write!(f, "invite not found: {id}"),
            Self::NotebookNotFound(id) => write!(f, "notebook not found: {id}"),
            Self::ReceiverNotFound(id) => write!(f, "receiver not found: {id}"),
            Self::SelfInvite(user) => write!(f, "user {user} cannot invite themselves"),
            Self::NotOwner { notebook, user } => {
                write!(f, "user {user} is not the owner of notebook {notebook}")
            }
            Self::NotReceiver { invite, user } => {
                write!(f, "user {user} is not the receiver of invite {invite}")
            }
            Self::NotParticipant { invite, user } => {
                write!(f, "user {user} is not a participant of invite {invite}")
            }
            Self::NoAccess { notebook, user } => {
                write!(f, "user {user} has no access to notebook {notebook}")
            }
            Self::AlreadyMember { notebook, user } => {
                write!(f, "user {user} already has access to notebook {notebook}")
            }
            Self::DuplicateInvite { notebook, receiver } => write!(
                f,
                "an invite for user {receiver} to notebook {notebook} already exists"
            ),
            Self::InconsistentState(details) => {
                write!(f, "inconsistent invite state: {details}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for InviteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for InviteServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Invitation service facade over repository implementations.
pub struct InviteService<R: InviteRepository> {
    repo: R,
}

impl<R: InviteRepository> InviteService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one pending invite, owner-gated.
    pub fn create_invite(
        &self,
        acting: UserId,
        notebook: NotebookId,
        receiver: UserId,
    ) -> Result<InviteDetails, InviteServiceError> {
        if acting == receiver {
            return Err(InviteServiceError::SelfInvite(acting));
        }

        let owner = self
            .repo
            .notebook_owner(notebook)?
            .ok_or(InviteServiceError::NotebookNotFound(notebook))?;
        if owner != acting {
            return Err(InviteServiceError::NotOwner {
                notebook,
                user: acting,
            });
        }

        if !self.repo.user_exists(receiver)? {
            return Err(InviteServiceError::ReceiverNotFound(receiver));
        }

        if self.repo.is_member(notebook, receiver)? {
            return Err(InviteServiceError::AlreadyMember {
                notebook,
                user: receiver,
            });
        }

        if self.repo.invite_exists(notebook, receiver)? {
            return Err(InviteServiceError::DuplicateInvite { notebook, receiver });
        }

        let invite = NotebookInvite::new(notebook, acting, receiver);
        let uuid = self.repo.create_invite(&invite)?;
        self.repo
            .get_details(uuid)?
            .ok_or(InviteServiceError::InconsistentState(
                "created invite not found in read-back",
            ))
    }

    /// Deletes one pending invite without any access change.
    ///
    /// Covers both decline (by the receiver) and cancel (by the inviter);
    /// the two are indistinguishable terminal transitions.
    pub fn withdraw_invite(
        &self,
        acting: UserId,
        invite: InviteId,
    ) -> Result<InviteDetails, InviteServiceError> {
        let record = self
            .repo
            .get_invite(invite)?
            .ok_or(InviteServiceError::InviteNotFound(invite))?;
        if acting != record.inviter && acting != record.receiver {
            return Err(InviteServiceError::NotParticipant {
                invite,
                user: acting,
            });
        }

        let details = self
            .repo
            .get_details(invite)?
            .ok_or(InviteServiceError::InconsistentState(
                "invite projection missing before withdrawal",
            ))?;
        self.repo.delete_invite(invite)?;
        Ok(details)
    }

    /// Accepts one pending invite, receiver-gated.
    ///
    /// On success the receiver is granted access, the change is mirrored
    /// onto every child note, and the invite is consumed. When the
    /// receiver already has access (a concurrent accept or an out-of-band
    /// grant won the race), the invite is deleted as cleanup and the
    /// membership conflict is reported without re-mirroring.
    pub fn accept_invite(
        &mut self,
        acting: UserId,
        invite: InviteId,
    ) -> Result<InviteDetails, InviteServiceError> {
        let record = self
            .repo
            .get_invite(invite)?
            .ok_or(InviteServiceError::InviteNotFound(invite))?;
        if acting != record.receiver {
            return Err(InviteServiceError::NotReceiver {
                invite,
                user: acting,
            });
        }

        let notebook = record.notebook_uuid;
        if self.repo.notebook_owner(notebook)?.is_none() {
            return Err(InviteServiceError::NotebookNotFound(notebook));
        }

        let details = self
            .repo
            .get_details(invite)?
            .ok_or(InviteServiceError::InconsistentState(
                "invite projection missing before acceptance",
            ))?;

        match self.repo.grant_access(notebook, record.receiver)? {
            GrantOutcome::AlreadyGranted => {
                // The invite has outlived its purpose; consume it instead
                // of leaving a dangling record for manual cleanup.
                self.repo.delete_invite(invite)?;
                Err(InviteServiceError::AlreadyMember {
                    notebook,
                    user: record.receiver,
                })
            }
            GrantOutcome::Granted => {
                let mirrored = self.repo.mirror_access(notebook)?;
                self.repo.delete_invite(invite)?;
                info!(
                    "event=invite_accept module=service status=ok notebook={notebook} receiver={} mirrored_rows={mirrored}",
                    record.receiver
                );
                Ok(details)
            }
        }
    }

    /// Lists a notebook's pending invites, membership-gated.
    pub fn list_notebook_invites(
        &self,
        acting: UserId,
        notebook: NotebookId,
    ) -> Result<Vec<InviteDetails>, InviteServiceError> {
        if self.repo.notebook_owner(notebook)?.is_none() {
            return Err(InviteServiceError::NotebookNotFound(notebook));
        }
        if !self.repo.is_member(notebook, acting)? {
            return Err(InviteServiceError::NoAccess {
                notebook,
                user: acting,
            });
        }
        self.repo.list_notebook_invites(notebook).map_err(Into::into)
    }

    /// Lists pending invites addressed to the acting user.
    pub fn list_received_invites(
        &self,
        acting: UserId,
    ) -> Result<Vec<InviteDetails>, InviteServiceError> {
        self.repo.list_received_invites(acting).map_err(Into::into)
    }
}
