//! Notebook repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide notebook persistence plus the access-set entry points the
//!   sharing services build on.
//! - Own the notebook delete cascade (child notes, their access rows, and
//!   referencing invites go with the notebook).
//!
//! # Invariants
//! - Creation seeds the access set with the owner in the same transaction
//!   as the notebook row.
//! - The child-note listing is deterministic: `sort_order ASC, uuid ASC`.

use crate::model::note::NoteId;
use crate::model::notebook::{Notebook, NotebookId};
use crate::model::user::{UserId, UserSummary};
use crate::repo::access::{self, GrantOutcome, RevokeOutcome};
use crate::repo::{
    bool_to_int, ensure_schema, parse_bool, parse_uuid, RepoError, RepoResult,
    SchemaRequirement,
};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

const NOTEBOOK_SCHEMA: &[SchemaRequirement] = &[
    SchemaRequirement {
        table: "notebooks",
        columns: &[
            "uuid",
            "title",
            "emoji",
            "color",
            "created_by",
            "is_deleted",
            "deleted_at",
        ],
    },
    SchemaRequirement {
        table: "notebook_access",
        columns: &["notebook_uuid", "user_uuid"],
    },
    SchemaRequirement {
        table: "notes",
        columns: &["uuid", "notebook_uuid", "sort_order"],
    },
    SchemaRequirement {
        table: "notebook_invites",
        columns: &["uuid", "notebook_uuid"],
    },
];

const NOTEBOOK_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    emoji,
    color,
    created_by,
    is_deleted,
    deleted_at
FROM notebooks";

/// Child-note projection embedded in a notebook read model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteSummary {
    pub uuid: NoteId,
    pub title: String,
    pub emoji: Option<String>,
    pub is_deleted: bool,
    pub deleted_at: Option<i64>,
}

/// Notebook read model joined with members and ordered child notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotebookDetails {
    pub notebook: Notebook,
    /// Display projections for the access set. Dangling identities left by
    /// deleted accounts have no profile row and are omitted here while the
    /// underlying access rows persist.
    pub members: Vec<UserSummary>,
    /// Child notes ordered by `sort_order ASC, uuid ASC`.
    pub notes: Vec<NoteSummary>,
}

/// Repository interface for notebook operations.
pub trait NotebookRepository {
    /// Creates one notebook with its owner-seeded access set.
    fn create_notebook(&mut self, notebook: &Notebook) -> RepoResult<NotebookId>;
    /// Loads one notebook row by id.
    fn get_notebook(&self, uuid: NotebookId) -> RepoResult<Option<Notebook>>;
    /// Loads one notebook joined with members and child-note summaries.
    fn get_details(&self, uuid: NotebookId) -> RepoResult<Option<NotebookDetails>>;
    /// Replaces all mutable metadata fields.
    fn update_notebook(&self, notebook: &Notebook) -> RepoResult<()>;
    /// Hard-deletes one notebook with its notes, access rows and invites.
    fn delete_notebook(&mut self, uuid: NotebookId) -> RepoResult<()>;
    /// Conditionally adds one user to the access set.
    fn grant_access(&self, uuid: NotebookId, user: UserId) -> RepoResult<GrantOutcome>;
    /// Removes one user from the access set.
    fn revoke_access(&self, uuid: NotebookId, user: UserId) -> RepoResult<RevokeOutcome>;
    /// Overwrites every child note's access set from the notebook's set.
    fn mirror_access(&mut self, uuid: NotebookId) -> RepoResult<usize>;
    /// Loads the owner identity, if the notebook exists.
    fn owner_of(&self, uuid: NotebookId) -> RepoResult<Option<UserId>>;
    /// Returns whether the user is in the notebook's access set.
    fn is_member(&self, uuid: NotebookId, user: UserId) -> RepoResult<bool>;
    /// Loads the access set sorted by user identity.
    fn access_set(&self, uuid: NotebookId) -> RepoResult<Vec<UserId>>;
}

/// SQLite-backed notebook repository.
pub struct SqliteNotebookRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteNotebookRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_schema(conn, NOTEBOOK_SCHEMA)?;
        Ok(Self { conn })
    }
}

impl NotebookRepository for SqliteNotebookRepository<'_> {
    fn create_notebook(&mut self, notebook: &Notebook) -> RepoResult<NotebookId> {
        notebook.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO notebooks (
                uuid,
                title,
                emoji,
                color,
                created_by,
                is_deleted,
                deleted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                notebook.uuid.to_string(),
                notebook.title.as_str(),
                notebook.emoji.as_deref(),
                notebook.color.as_str(),
                notebook.created_by.to_string(),
                bool_to_int(notebook.is_deleted),
                notebook.deleted_at,
            ],
        )?;
        tx.execute(
            "INSERT INTO notebook_access (notebook_uuid, user_uuid)
             VALUES (?1, ?2);",
            params![
                notebook.uuid.to_string(),
                notebook.created_by.to_string()
            ],
        )?;
        tx.commit()?;

        Ok(notebook.uuid)
    }

    fn get_notebook(&self, uuid: NotebookId) -> RepoResult<Option<Notebook>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTEBOOK_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_notebook_row(row)?));
        }
        Ok(None)
    }

    fn get_details(&self, uuid: NotebookId) -> RepoResult<Option<NotebookDetails>> {
        let Some(notebook) = self.get_notebook(uuid)? else {
            return Ok(None);
        };

        Ok(Some(NotebookDetails {
            members: load_member_summaries(self.conn, uuid)?,
            notes: load_note_summaries(self.conn, uuid)?,
            notebook,
        }))
    }

    fn update_notebook(&self, notebook: &Notebook) -> RepoResult<()> {
        notebook.validate()?;

        let changed = self.conn.execute(
            "UPDATE notebooks
             SET
                title = ?1,
                emoji = ?2,
                color = ?3,
                is_deleted = ?4,
                deleted_at = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?6;",
            params![
                notebook.title.as_str(),
                notebook.emoji.as_deref(),
                notebook.color.as_str(),
                bool_to_int(notebook.is_deleted),
                notebook.deleted_at,
                notebook.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(notebook.uuid));
        }
        Ok(())
    }

    fn delete_notebook(&mut self, uuid: NotebookId) -> RepoResult<()> {
        if !delete_notebook_rows(self.conn, uuid)? {
            return Err(RepoError::NotFound(uuid));
        }
        Ok(())
    }

    fn grant_access(&self, uuid: NotebookId, user: UserId) -> RepoResult<GrantOutcome> {
        access::grant_access(self.conn, uuid, user)
    }

    fn revoke_access(&self, uuid: NotebookId, user: UserId) -> RepoResult<RevokeOutcome> {
        access::revoke_access(self.conn, uuid, user)
    }

    fn mirror_access(&mut self, uuid: NotebookId) -> RepoResult<usize> {
        access::mirror_notebook_access(self.conn, uuid)
    }

    fn owner_of(&self, uuid: NotebookId) -> RepoResult<Option<UserId>> {
        notebook_owner(self.conn, uuid)
    }

    fn is_member(&self, uuid: NotebookId, user: UserId) -> RepoResult<bool> {
        access::is_notebook_member(self.conn, uuid, user)
    }

    fn access_set(&self, uuid: NotebookId) -> RepoResult<Vec<UserId>> {
        access::load_notebook_access(self.conn, uuid)
    }
}

/// Loads the owner identity of one notebook.
pub(crate) fn notebook_owner(
    conn: &Connection,
    uuid: NotebookId,
) -> RepoResult<Option<UserId>> {
    let owner: Option<String> = conn
        .query_row(
            "SELECT created_by FROM notebooks WHERE uuid = ?1;",
            [uuid.to_string()],
            |row| row.get(0),
        )
        .optional()?;

    match owner {
        Some(value) => Ok(Some(parse_uuid(&value, "notebooks.created_by")?)),
        None => Ok(None),
    }
}

/// Hard-deletes one notebook and everything referencing it.
///
/// Order inside the transaction: child notes' access rows, child notes,
/// referencing invites, the notebook's own access rows, the notebook row.
/// Returns whether the notebook row existed.
pub(crate) fn delete_notebook_rows(
    conn: &mut Connection,
    uuid: NotebookId,
) -> RepoResult<bool> {
    let key = uuid.to_string();
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    tx.execute(
        "DELETE FROM note_access
         WHERE note_uuid IN (SELECT uuid FROM notes WHERE notebook_uuid = ?1);",
        [key.as_str()],
    )?;
    tx.execute(
        "DELETE FROM notes WHERE notebook_uuid = ?1;",
        [key.as_str()],
    )?;
    tx.execute(
        "DELETE FROM notebook_invites WHERE notebook_uuid = ?1;",
        [key.as_str()],
    )?;
    tx.execute(
        "DELETE FROM notebook_access WHERE notebook_uuid = ?1;",
        [key.as_str()],
    )?;
    let changed = tx.execute("DELETE FROM notebooks WHERE uuid = ?1;", [key.as_str()])?;

    tx.commit()?;
    Ok(changed > 0)
}

fn load_member_summaries(
    conn: &Connection,
    uuid: NotebookId,
) -> RepoResult<Vec<UserSummary>> {
    let mut stmt = conn.prepare(
        "SELECT u.uuid, u.email, u.first_name, u.picture
         FROM notebook_access a
         INNER JOIN users u ON u.uuid = a.user_uuid
         WHERE a.notebook_uuid = ?1
         ORDER BY u.uuid ASC;",
    )?;
    let mut rows = stmt.query([uuid.to_string()])?;
    let mut members = Vec::new();
    while let Some(row) = rows.next()? {
        let uuid_text: String = row.get(0)?;
        members.push(UserSummary {
            uuid: parse_uuid(&uuid_text, "users.uuid")?,
            email: row.get(1)?,
            first_name: row.get(2)?,
            picture: row.get(3)?,
        });
    }
    Ok(members)
}

fn load_note_summaries(conn: &Connection, uuid: NotebookId) -> RepoResult<Vec<NoteSummary>> {
    let mut stmt = conn.prepare(
        "SELECT uuid, title, emoji, is_deleted, deleted_at
         FROM notes
         WHERE notebook_uuid = ?1
         ORDER BY sort_order ASC, uuid ASC;",
    )?;
    let mut rows = stmt.query([uuid.to_string()])?;
    let mut notes = Vec::new();
    while let Some(row) = rows.next()? {
        let uuid_text: String = row.get(0)?;
        notes.push(NoteSummary {
            uuid: parse_uuid(&uuid_text, "notes.uuid")?,
            title: row.get(1)?,
            emoji: row.get(2)?,
            is_deleted: parse_bool(row.get(3)?, "notes.is_deleted")?,
            deleted_at: row.get(4)?,
        });
    }
    Ok(notes)
}

fn parse_notebook_row(row: &Row<'_>) -> RepoResult<Notebook> {
    let uuid_text: String = row.get("uuid")?;
    let created_by_text: String = row.get("created_by")?;

    let notebook = Notebook {
        uuid: parse_uuid(&uuid_text, "notebooks.uuid")?,
        title: row.get("title")?,
        emoji: row.get("emoji")?,
        color: row.get("color")?,
        created_by: parse_uuid(&created_by_text, "notebooks.created_by")?,
        is_deleted: parse_bool(row.get("is_deleted")?, "notebooks.is_deleted")?,
        deleted_at: row.get("deleted_at")?,
    };
    notebook.validate()?;
    Ok(notebook)
}
