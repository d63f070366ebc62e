//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist notes inside their parent notebook's ordered child list.
//! - Seed each new note's access mirror from the notebook's current set.
//!
//! # Invariants
//! - `sort_order` is append-only per notebook; listings are deterministic
//!   (`sort_order ASC, uuid ASC`).
//! - Note access rows are written here only at creation and deletion; every
//!   later change arrives through notebook-level mirroring.

use crate::model::note::{Note, NoteId};
use crate::model::notebook::NotebookId;
use crate::model::user::UserId;
use crate::repo::access;
use crate::repo::{
    bool_to_int, ensure_schema, parse_bool, parse_uuid, RepoError, RepoResult,
    SchemaRequirement,
};
use rusqlite::{params, Connection, Row, TransactionBehavior};

const NOTE_SCHEMA: &[SchemaRequirement] = &[
    SchemaRequirement {
        table: "notes",
        columns: &[
            "uuid",
            "notebook_uuid",
            "title",
            "emoji",
            "content",
            "locked",
            "created_by",
            "last_updated_by",
            "sort_order",
            "is_deleted",
            "deleted_at",
        ],
    },
    SchemaRequirement {
        table: "note_access",
        columns: &["note_uuid", "user_uuid"],
    },
    SchemaRequirement {
        table: "notebooks",
        columns: &["uuid"],
    },
    SchemaRequirement {
        table: "notebook_access",
        columns: &["notebook_uuid", "user_uuid"],
    },
];

const NOTE_SELECT_SQL: &str = "SELECT
    uuid,
    notebook_uuid,
    title,
    emoji,
    content,
    locked,
    created_by,
    last_updated_by,
    is_deleted,
    deleted_at
FROM notes";

/// Repository interface for note operations.
pub trait NoteRepository {
    /// Creates one note at the end of its notebook's child list and copies
    /// the notebook's current access set onto it.
    fn create_note(&mut self, note: &Note) -> RepoResult<NoteId>;
    /// Loads one note by id.
    fn get_note(&self, uuid: NoteId) -> RepoResult<Option<Note>>;
    /// Replaces all mutable note fields.
    fn update_note(&self, note: &Note) -> RepoResult<()>;
    /// Hard-deletes one note with its access rows.
    fn delete_note(&mut self, uuid: NoteId) -> RepoResult<()>;
    /// Lists a notebook's notes in child-list order.
    fn list_notebook_notes(&self, notebook: NotebookId) -> RepoResult<Vec<Note>>;
    /// Loads one note's mirrored access set sorted by user identity.
    fn note_access(&self, uuid: NoteId) -> RepoResult<Vec<UserId>>;
    /// Returns whether the user is in the note's mirrored access set.
    fn is_note_member(&self, uuid: NoteId, user: UserId) -> RepoResult<bool>;
    /// Returns whether the parent notebook exists.
    fn notebook_exists(&self, notebook: NotebookId) -> RepoResult<bool>;
    /// Returns whether the user is in the parent notebook's access set.
    fn is_notebook_member(&self, notebook: NotebookId, user: UserId) -> RepoResult<bool>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_schema(conn, NOTE_SCHEMA)?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create_note(&mut self, note: &Note) -> RepoResult<NoteId> {
        note.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let sort_order = next_sort_order(&tx, note.notebook_uuid)?;
        tx.execute(
            "INSERT INTO notes (
                uuid,
                notebook_uuid,
                title,
                emoji,
                content,
                locked,
                created_by,
                last_updated_by,
                sort_order,
                is_deleted,
                deleted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            params![
                note.uuid.to_string(),
                note.notebook_uuid.to_string(),
                note.title.as_str(),
                note.emoji.as_deref(),
                note.content.as_str(),
                bool_to_int(note.locked),
                note.created_by.to_string(),
                note.last_updated_by.to_string(),
                sort_order,
                bool_to_int(note.is_deleted),
                note.deleted_at,
            ],
        )?;
        tx.execute(
            "INSERT INTO note_access (note_uuid, user_uuid)
             SELECT ?1, user_uuid
             FROM notebook_access
             WHERE notebook_uuid = ?2;",
            params![note.uuid.to_string(), note.notebook_uuid.to_string()],
        )?;
        tx.commit()?;

        Ok(note.uuid)
    }

    fn get_note(&self, uuid: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_note_row(row)?));
        }
        Ok(None)
    }

    fn update_note(&self, note: &Note) -> RepoResult<()> {
        note.validate()?;

        let changed = self.conn.execute(
            "UPDATE notes
             SET
                title = ?1,
                emoji = ?2,
                content = ?3,
                locked = ?4,
                last_updated_by = ?5,
                is_deleted = ?6,
                deleted_at = ?7,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?8;",
            params![
                note.title.as_str(),
                note.emoji.as_deref(),
                note.content.as_str(),
                bool_to_int(note.locked),
                note.last_updated_by.to_string(),
                bool_to_int(note.is_deleted),
                note.deleted_at,
                note.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(note.uuid));
        }
        Ok(())
    }

    fn delete_note(&mut self, uuid: NoteId) -> RepoResult<()> {
        let key = uuid.to_string();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "DELETE FROM note_access WHERE note_uuid = ?1;",
            [key.as_str()],
        )?;
        let changed = tx.execute("DELETE FROM notes WHERE uuid = ?1;", [key.as_str()])?;
        tx.commit()?;

        if changed == 0 {
            return Err(RepoError::NotFound(uuid));
        }
        Ok(())
    }

    fn list_notebook_notes(&self, notebook: NotebookId) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_SELECT_SQL}
             WHERE notebook_uuid = ?1
             ORDER BY sort_order ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([notebook.to_string()])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }

    fn note_access(&self, uuid: NoteId) -> RepoResult<Vec<UserId>> {
        access::load_note_access(self.conn, uuid)
    }

    fn is_note_member(&self, uuid: NoteId, user: UserId) -> RepoResult<bool> {
        access::is_note_member(self.conn, uuid, user)
    }

    fn notebook_exists(&self, notebook: NotebookId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM notebooks WHERE uuid = ?1);",
            [notebook.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn is_notebook_member(&self, notebook: NotebookId, user: UserId) -> RepoResult<bool> {
        access::is_notebook_member(self.conn, notebook, user)
    }
}

fn next_sort_order(conn: &Connection, notebook: NotebookId) -> RepoResult<i64> {
    let next: i64 = conn.query_row(
        "SELECT COALESCE(MAX(sort_order) + 1, 0)
         FROM notes
         WHERE notebook_uuid = ?1;",
        [notebook.to_string()],
        |row| row.get(0),
    )?;
    Ok(next)
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let uuid_text: String = row.get("uuid")?;
    let notebook_text: String = row.get("notebook_uuid")?;
    let created_by_text: String = row.get("created_by")?;
    let last_updated_by_text: String = row.get("last_updated_by")?;

    let note = Note {
        uuid: parse_uuid(&uuid_text, "notes.uuid")?,
        notebook_uuid: parse_uuid(&notebook_text, "notes.notebook_uuid")?,
        title: row.get("title")?,
        emoji: row.get("emoji")?,
        content: row.get("content")?,
        locked: parse_bool(row.get("locked")?, "notes.locked")?,
        created_by: parse_uuid(&created_by_text, "notes.created_by")?,
        last_updated_by: parse_uuid(&last_updated_by_text, "notes.last_updated_by")?,
        is_deleted: parse_bool(row.get("is_deleted")?, "notes.is_deleted")?,
        deleted_at: row.get("deleted_at")?,
    };
    note.validate()?;
    Ok(note)
}
