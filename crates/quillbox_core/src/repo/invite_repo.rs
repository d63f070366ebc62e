//! Notebook invite repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist the pending-invite ledger and its joined display projections.
//! - Expose the notebook-side hooks the invitation state machine needs
//!   (ownership, membership, conditional grant, access mirroring).
//!
//! # Invariants
//! - `UNIQUE (notebook_uuid, receiver_uuid)` is the schema-level backstop
//!   for the one-live-invite-per-pair rule; the state machine checks it
//!   first to report the conflict instead of a storage error.

use crate::model::invite::{InviteId, NotebookInvite};
use crate::model::notebook::NotebookId;
use crate::model::user::{UserId, UserSummary};
use crate::repo::access::{self, GrantOutcome};
use crate::repo::notebook_repo::notebook_owner;
use crate::repo::{ensure_schema, parse_uuid, RepoResult, SchemaRequirement};
use rusqlite::{params, Connection, Row};

const INVITE_SCHEMA: &[SchemaRequirement] = &[
    SchemaRequirement {
        table: "notebook_invites",
        columns: &[
            "uuid",
            "notebook_uuid",
            "inviter_uuid",
            "receiver_uuid",
            "created_at",
        ],
    },
    SchemaRequirement {
        table: "notebooks",
        columns: &["uuid", "created_by"],
    },
    SchemaRequirement {
        table: "notebook_access",
        columns: &["notebook_uuid", "user_uuid"],
    },
    SchemaRequirement {
        table: "users",
        columns: &["uuid", "email", "first_name", "picture"],
    },
];

const INVITE_DETAILS_SQL: &str = "SELECT
    i.uuid,
    i.notebook_uuid,
    i.created_at,
    ui.uuid, ui.email, ui.first_name, ui.picture,
    ur.uuid, ur.email, ur.first_name, ur.picture
FROM notebook_invites i
INNER JOIN users ui ON ui.uuid = i.inviter_uuid
INNER JOIN users ur ON ur.uuid = i.receiver_uuid";

/// Invite read model joined with both parties' display projections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteDetails {
    pub uuid: InviteId,
    pub notebook_uuid: NotebookId,
    pub inviter: UserSummary,
    pub receiver: UserSummary,
    pub created_at: i64,
}

/// Repository interface for the invitation ledger.
pub trait InviteRepository {
    /// Stores one pending invite and returns its stable id.
    fn create_invite(&self, invite: &NotebookInvite) -> RepoResult<InviteId>;
    /// Loads one invite row by id.
    fn get_invite(&self, uuid: InviteId) -> RepoResult<Option<NotebookInvite>>;
    /// Loads one invite joined with inviter/receiver projections.
    fn get_details(&self, uuid: InviteId) -> RepoResult<Option<InviteDetails>>;
    /// Deletes one invite row; reports whether a row was removed.
    fn delete_invite(&self, uuid: InviteId) -> RepoResult<bool>;
    /// Returns whether a live invite exists for the (notebook, receiver) pair.
    fn invite_exists(&self, notebook: NotebookId, receiver: UserId) -> RepoResult<bool>;
    /// Lists a notebook's pending invites, oldest first.
    fn list_notebook_invites(&self, notebook: NotebookId) -> RepoResult<Vec<InviteDetails>>;
    /// Lists pending invites addressed to one receiver, oldest first.
    fn list_received_invites(&self, receiver: UserId) -> RepoResult<Vec<InviteDetails>>;
    /// Loads the notebook owner, if the notebook exists.
    fn notebook_owner(&self, notebook: NotebookId) -> RepoResult<Option<UserId>>;
    /// Returns whether the user is in the notebook's access set.
    fn is_member(&self, notebook: NotebookId, user: UserId) -> RepoResult<bool>;
    /// Conditionally adds one user to the notebook's access set.
    fn grant_access(&self, notebook: NotebookId, user: UserId) -> RepoResult<GrantOutcome>;
    /// Overwrites every child note's access set from the notebook's set.
    fn mirror_access(&mut self, notebook: NotebookId) -> RepoResult<usize>;
    /// Returns whether a profile row exists for the user.
    fn user_exists(&self, user: UserId) -> RepoResult<bool>;
}

/// SQLite-backed invite repository.
pub struct SqliteInviteRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteInviteRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_schema(conn, INVITE_SCHEMA)?;
        Ok(Self { conn })
    }
}

impl InviteRepository for SqliteInviteRepository<'_> {
    fn create_invite(&self, invite: &NotebookInvite) -> RepoResult<InviteId> {
        self.conn.execute(
            "INSERT INTO notebook_invites (uuid, notebook_uuid, inviter_uuid, receiver_uuid)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                invite.uuid.to_string(),
                invite.notebook_uuid.to_string(),
                invite.inviter.to_string(),
                invite.receiver.to_string(),
            ],
        )?;
        Ok(invite.uuid)
    }

    fn get_invite(&self, uuid: InviteId) -> RepoResult<Option<NotebookInvite>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, notebook_uuid, inviter_uuid, receiver_uuid
             FROM notebook_invites
             WHERE uuid = ?1;",
        )?;
        let mut rows = stmt.query([uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            let uuid_text: String = row.get(0)?;
            let notebook_text: String = row.get(1)?;
            let inviter_text: String = row.get(2)?;
            let receiver_text: String = row.get(3)?;
            return Ok(Some(NotebookInvite {
                uuid: parse_uuid(&uuid_text, "notebook_invites.uuid")?,
                notebook_uuid: parse_uuid(&notebook_text, "notebook_invites.notebook_uuid")?,
                inviter: parse_uuid(&inviter_text, "notebook_invites.inviter_uuid")?,
                receiver: parse_uuid(&receiver_text, "notebook_invites.receiver_uuid")?,
            }));
        }
        Ok(None)
    }

    fn get_details(&self, uuid: InviteId) -> RepoResult<Option<InviteDetails>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{INVITE_DETAILS_SQL} WHERE i.uuid = ?1;"))?;
        let mut rows = stmt.query([uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_details_row(row)?));
        }
        Ok(None)
    }

    fn delete_invite(&self, uuid: InviteId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM notebook_invites WHERE uuid = ?1;",
            [uuid.to_string()],
        )?;
        Ok(changed > 0)
    }

    fn invite_exists(&self, notebook: NotebookId, receiver: UserId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM notebook_invites
                WHERE notebook_uuid = ?1 AND receiver_uuid = ?2
            );",
            params![notebook.to_string(), receiver.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn list_notebook_invites(&self, notebook: NotebookId) -> RepoResult<Vec<InviteDetails>> {
        self.list_details(
            &format!(
                "{INVITE_DETAILS_SQL}
                 WHERE i.notebook_uuid = ?1
                 ORDER BY i.created_at ASC, i.uuid ASC;"
            ),
            notebook.to_string().as_str(),
        )
    }

    fn list_received_invites(&self, receiver: UserId) -> RepoResult<Vec<InviteDetails>> {
        self.list_details(
            &format!(
                "{INVITE_DETAILS_SQL}
                 WHERE i.receiver_uuid = ?1
                 ORDER BY i.created_at ASC, i.uuid ASC;"
            ),
            receiver.to_string().as_str(),
        )
    }

    fn notebook_owner(&self, notebook: NotebookId) -> RepoResult<Option<UserId>> {
        notebook_owner(self.conn, notebook)
    }

    fn is_member(&self, notebook: NotebookId, user: UserId) -> RepoResult<bool> {
        access::is_notebook_member(self.conn, notebook, user)
    }

    fn grant_access(&self, notebook: NotebookId, user: UserId) -> RepoResult<GrantOutcome> {
        access::grant_access(self.conn, notebook, user)
    }

    fn mirror_access(&mut self, notebook: NotebookId) -> RepoResult<usize> {
        access::mirror_notebook_access(self.conn, notebook)
    }

    fn user_exists(&self, user: UserId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE uuid = ?1);",
            [user.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

impl SqliteInviteRepository<'_> {
    fn list_details(&self, sql: &str, key: &str) -> RepoResult<Vec<InviteDetails>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([key])?;
        let mut invites = Vec::new();
        while let Some(row) = rows.next()? {
            invites.push(parse_details_row(row)?);
        }
        Ok(invites)
    }
}

fn parse_details_row(row: &Row<'_>) -> RepoResult<InviteDetails> {
    let uuid_text: String = row.get(0)?;
    let notebook_text: String = row.get(1)?;
    let inviter_uuid: String = row.get(3)?;
    let receiver_uuid: String = row.get(7)?;

    Ok(InviteDetails {
        uuid: parse_uuid(&uuid_text, "notebook_invites.uuid")?,
        notebook_uuid: parse_uuid(&notebook_text, "notebook_invites.notebook_uuid")?,
        created_at: row.get(2)?,
        inviter: UserSummary {
            uuid: parse_uuid(&inviter_uuid, "users.uuid")?,
            email: row.get(4)?,
            first_name: row.get(5)?,
            picture: row.get(6)?,
        },
        receiver: UserSummary {
            uuid: parse_uuid(&receiver_uuid, "users.uuid")?,
            email: row.get(8)?,
            first_name: row.get(9)?,
            picture: row.get(10)?,
        },
    })
}
