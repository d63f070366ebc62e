//! Access-set persistence shared by notebook, note and invite repositories.
//!
//! # Responsibility
//! - Own the SQL for conditional grant/revoke on notebook access sets.
//! - Own the notebook-to-note access mirroring used after every grant or
//!   revoke.
//!
//! # Invariants
//! - A grant is one conditional insert: concurrent grants for the same
//!   (notebook, user) pair serialize on the primary key and exactly one
//!   caller observes `Granted`.
//! - Mirroring re-derives every child note's access set from the notebook's
//!   current set instead of applying a delta, so repeating it is a no-op
//!   and retrying after partial failure converges.
//! - Mirroring touches soft-deleted notes' access rows but never their
//!   visibility fields.

use crate::model::note::NoteId;
use crate::model::notebook::NotebookId;
use crate::model::user::UserId;
use crate::repo::{parse_uuid, RepoResult};
use rusqlite::{params, Connection, TransactionBehavior};

/// Result of a conditional access grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
    /// The user was newly added to the access set.
    Granted,
    /// The user was already present; nothing changed.
    AlreadyGranted,
}

/// Result of an access revocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
    /// The user was removed from the access set.
    Revoked,
    /// The user was not in the access set; nothing changed.
    NotGranted,
}

/// Conditionally adds `user_uuid` to the notebook's access set.
///
/// The membership check and the insert are one statement, so two
/// concurrent grants cannot both observe `Granted`.
pub fn grant_access(
    conn: &Connection,
    notebook_uuid: NotebookId,
    user_uuid: UserId,
) -> RepoResult<GrantOutcome> {
    let changed = conn.execute(
        "INSERT INTO notebook_access (notebook_uuid, user_uuid)
         VALUES (?1, ?2)
         ON CONFLICT (notebook_uuid, user_uuid) DO NOTHING;",
        params![notebook_uuid.to_string(), user_uuid.to_string()],
    )?;

    if changed == 0 {
        Ok(GrantOutcome::AlreadyGranted)
    } else {
        Ok(GrantOutcome::Granted)
    }
}

/// Removes `user_uuid` from the notebook's access set.
pub fn revoke_access(
    conn: &Connection,
    notebook_uuid: NotebookId,
    user_uuid: UserId,
) -> RepoResult<RevokeOutcome> {
    let changed = conn.execute(
        "DELETE FROM notebook_access
         WHERE notebook_uuid = ?1 AND user_uuid = ?2;",
        params![notebook_uuid.to_string(), user_uuid.to_string()],
    )?;

    if changed == 0 {
        Ok(RevokeOutcome::NotGranted)
    } else {
        Ok(RevokeOutcome::Revoked)
    }
}

/// Overwrites every child note's access set with the notebook's current set.
///
/// Returns the number of access rows written. Runs in one immediate
/// transaction; the notebook mutation that preceded it is a separate step,
/// so readers may observe a stale note access set in between.
pub fn mirror_notebook_access(
    conn: &mut Connection,
    notebook_uuid: NotebookId,
) -> RepoResult<usize> {
    let notebook_key = notebook_uuid.to_string();
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    tx.execute(
        "DELETE FROM note_access
         WHERE note_uuid IN (SELECT uuid FROM notes WHERE notebook_uuid = ?1);",
        [notebook_key.as_str()],
    )?;

    let written = tx.execute(
        "INSERT INTO note_access (note_uuid, user_uuid)
         SELECT n.uuid, a.user_uuid
         FROM notes n
         INNER JOIN notebook_access a ON a.notebook_uuid = n.notebook_uuid
         WHERE n.notebook_uuid = ?1;",
        [notebook_key.as_str()],
    )?;

    tx.commit()?;
    Ok(written)
}

/// Loads the notebook's access set sorted by user identity.
pub fn load_notebook_access(
    conn: &Connection,
    notebook_uuid: NotebookId,
) -> RepoResult<Vec<UserId>> {
    load_access_rows(
        conn,
        "SELECT user_uuid
         FROM notebook_access
         WHERE notebook_uuid = ?1
         ORDER BY user_uuid ASC;",
        notebook_uuid.to_string().as_str(),
        "notebook_access.user_uuid",
    )
}

/// Loads one note's mirrored access set sorted by user identity.
pub fn load_note_access(conn: &Connection, note_uuid: NoteId) -> RepoResult<Vec<UserId>> {
    load_access_rows(
        conn,
        "SELECT user_uuid
         FROM note_access
         WHERE note_uuid = ?1
         ORDER BY user_uuid ASC;",
        note_uuid.to_string().as_str(),
        "note_access.user_uuid",
    )
}

/// Returns whether `user_uuid` is in the notebook's access set.
pub fn is_notebook_member(
    conn: &Connection,
    notebook_uuid: NotebookId,
    user_uuid: UserId,
) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM notebook_access
            WHERE notebook_uuid = ?1 AND user_uuid = ?2
        );",
        params![notebook_uuid.to_string(), user_uuid.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Returns whether `user_uuid` is in the note's mirrored access set.
pub fn is_note_member(
    conn: &Connection,
    note_uuid: NoteId,
    user_uuid: UserId,
) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM note_access
            WHERE note_uuid = ?1 AND user_uuid = ?2
        );",
        params![note_uuid.to_string(), user_uuid.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn load_access_rows(
    conn: &Connection,
    sql: &str,
    key: &str,
    origin: &str,
) -> RepoResult<Vec<UserId>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([key])?;
    let mut users = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        users.push(parse_uuid(&value, origin)?);
    }
    Ok(users)
}
