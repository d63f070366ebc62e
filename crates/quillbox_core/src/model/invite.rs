//! Notebook invite domain model.
//!
//! # Invariants
//! - At most one live invite exists per (notebook, receiver) pair.
//! - `inviter` must be the notebook owner at creation time.
//! - `inviter` and `receiver` are distinct identities.
//! - An invite never outlives acceptance or withdrawal; both terminal
//!   transitions delete the record.

use crate::model::notebook::NotebookId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable invite identifier.
pub type InviteId = Uuid;

/// Pending proposal to add `receiver` to a notebook's access set.
///
/// The record's existence is the PENDING state; there is no stored status
/// column. Acceptance grants access and deletes the record; withdrawal
/// (decline by the receiver or cancel by the inviter) deletes it without
/// any access change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotebookInvite {
    pub uuid: InviteId,
    pub notebook_uuid: NotebookId,
    pub inviter: UserId,
    pub receiver: UserId,
}

impl NotebookInvite {
    /// Creates a pending invite with a generated stable ID.
    pub fn new(notebook_uuid: NotebookId, inviter: UserId, receiver: UserId) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            notebook_uuid,
            inviter,
            receiver,
        }
    }
}
