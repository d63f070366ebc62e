//! Account teardown repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the delete-by-filter steps the account deletion cascade runs.
//!
//! # Invariants
//! - Every step is independently idempotent: deleting by filter is a no-op
//!   when nothing matches, so a repeated cascade is always safe.
//! - There is no cross-step transaction; partial completion leaves a
//!   forward-progressable state.

use crate::model::notebook::NotebookId;
use crate::model::user::UserId;
use crate::repo::notebook_repo::delete_notebook_rows;
use crate::repo::{ensure_schema, parse_uuid, RepoResult, SchemaRequirement};
use rusqlite::{params, Connection, TransactionBehavior};

const ACCOUNT_SCHEMA: &[SchemaRequirement] = &[
    SchemaRequirement {
        table: "users",
        columns: &["uuid"],
    },
    SchemaRequirement {
        table: "todos",
        columns: &["uuid", "created_by"],
    },
    SchemaRequirement {
        table: "notebook_invites",
        columns: &["uuid", "inviter_uuid", "receiver_uuid"],
    },
    SchemaRequirement {
        table: "notes",
        columns: &["uuid", "created_by"],
    },
    SchemaRequirement {
        table: "notebooks",
        columns: &["uuid", "created_by"],
    },
];

/// Repository interface for the account deletion cascade.
pub trait AccountRepository {
    /// Deletes every todo created by the user; returns the count removed.
    fn delete_todos_by_creator(&self, user: UserId) -> RepoResult<usize>;
    /// Deletes every invite naming the user as inviter or receiver.
    fn delete_invites_for_user(&self, user: UserId) -> RepoResult<usize>;
    /// Deletes every note created by the user, wherever it lives, along
    /// with its access rows.
    fn delete_notes_by_creator(&mut self, user: UserId) -> RepoResult<usize>;
    /// Lists notebooks owned by the user.
    fn list_notebooks_by_creator(&self, user: UserId) -> RepoResult<Vec<NotebookId>>;
    /// Hard-deletes one notebook with everything referencing it.
    fn delete_notebook_cascade(&mut self, notebook: NotebookId) -> RepoResult<bool>;
    /// Deletes the profile row; reports whether a row was removed.
    fn delete_user(&self, user: UserId) -> RepoResult<bool>;
}

/// SQLite-backed account teardown repository.
pub struct SqliteAccountRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteAccountRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_schema(conn, ACCOUNT_SCHEMA)?;
        Ok(Self { conn })
    }
}

impl AccountRepository for SqliteAccountRepository<'_> {
    fn delete_todos_by_creator(&self, user: UserId) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "DELETE FROM todos WHERE created_by = ?1;",
            [user.to_string()],
        )?;
        Ok(changed)
    }

    fn delete_invites_for_user(&self, user: UserId) -> RepoResult<usize> {
        let key = user.to_string();
        let changed = self.conn.execute(
            "DELETE FROM notebook_invites
             WHERE inviter_uuid = ?1 OR receiver_uuid = ?1;",
            params![key.as_str()],
        )?;
        Ok(changed)
    }

    fn delete_notes_by_creator(&mut self, user: UserId) -> RepoResult<usize> {
        let key = user.to_string();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "DELETE FROM note_access
             WHERE note_uuid IN (SELECT uuid FROM notes WHERE created_by = ?1);",
            [key.as_str()],
        )?;
        let changed = tx.execute(
            "DELETE FROM notes WHERE created_by = ?1;",
            [key.as_str()],
        )?;
        tx.commit()?;
        Ok(changed)
    }

    fn list_notebooks_by_creator(&self, user: UserId) -> RepoResult<Vec<NotebookId>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid
             FROM notebooks
             WHERE created_by = ?1
             ORDER BY uuid ASC;",
        )?;
        let mut rows = stmt.query([user.to_string()])?;
        let mut notebooks = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            notebooks.push(parse_uuid(&value, "notebooks.uuid")?);
        }
        Ok(notebooks)
    }

    fn delete_notebook_cascade(&mut self, notebook: NotebookId) -> RepoResult<bool> {
        delete_notebook_rows(self.conn, notebook)
    }

    fn delete_user(&self, user: UserId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE uuid = ?1;", [user.to_string()])?;
        Ok(changed > 0)
    }
}
