//! Todo repository contract and SQLite implementation.
//!
//! # Invariants
//! - All queries are creator-scoped; todos have no sharing semantics.
//! - Stored `priority`/`repeating` columns only ever hold canonical tokens.

use crate::model::todo::{Priority, Repeating, Todo, TodoId};
use crate::model::user::UserId;
use crate::repo::{
    bool_to_int, ensure_schema, parse_bool, parse_uuid, RepoError, RepoResult,
    SchemaRequirement,
};
use rusqlite::{params, Connection, Row};

const TODO_SCHEMA: &[SchemaRequirement] = &[SchemaRequirement {
    table: "todos",
    columns: &[
        "uuid",
        "title",
        "emoji",
        "created_by",
        "done",
        "due_date",
        "priority",
        "notification",
        "repeating",
        "is_deleted",
        "deleted_at",
    ],
}];

const TODO_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    emoji,
    created_by,
    done,
    due_date,
    priority,
    notification,
    repeating,
    is_deleted,
    deleted_at
FROM todos";

/// Repository interface for todo operations.
pub trait TodoRepository {
    /// Creates one todo and returns its stable id.
    fn create_todo(&self, todo: &Todo) -> RepoResult<TodoId>;
    /// Loads one todo by id.
    fn get_todo(&self, uuid: TodoId) -> RepoResult<Option<Todo>>;
    /// Replaces all mutable todo fields.
    fn update_todo(&self, todo: &Todo) -> RepoResult<()>;
    /// Hard-deletes one todo.
    fn delete_todo(&self, uuid: TodoId) -> RepoResult<()>;
    /// Lists one creator's todos, most recently updated first.
    fn list_by_creator(&self, creator: UserId) -> RepoResult<Vec<Todo>>;
}

/// SQLite-backed todo repository.
pub struct SqliteTodoRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTodoRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema(conn, TODO_SCHEMA)?;
        Ok(Self { conn })
    }
}

impl TodoRepository for SqliteTodoRepository<'_> {
    fn create_todo(&self, todo: &Todo) -> RepoResult<TodoId> {
        todo.validate()?;

        self.conn.execute(
            "INSERT INTO todos (
                uuid,
                title,
                emoji,
                created_by,
                done,
                due_date,
                priority,
                notification,
                repeating,
                is_deleted,
                deleted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            params![
                todo.uuid.to_string(),
                todo.title.as_str(),
                todo.emoji.as_deref(),
                todo.created_by.to_string(),
                bool_to_int(todo.done),
                todo.due_date,
                todo.priority.as_db_str(),
                bool_to_int(todo.notification),
                todo.repeating.map(Repeating::as_db_str),
                bool_to_int(todo.is_deleted),
                todo.deleted_at,
            ],
        )?;
        Ok(todo.uuid)
    }

    fn get_todo(&self, uuid: TodoId) -> RepoResult<Option<Todo>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TODO_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_todo_row(row)?));
        }
        Ok(None)
    }

    fn update_todo(&self, todo: &Todo) -> RepoResult<()> {
        todo.validate()?;

        let changed = self.conn.execute(
            "UPDATE todos
             SET
                title = ?1,
                emoji = ?2,
                done = ?3,
                due_date = ?4,
                priority = ?5,
                notification = ?6,
                repeating = ?7,
                is_deleted = ?8,
                deleted_at = ?9,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?10;",
            params![
                todo.title.as_str(),
                todo.emoji.as_deref(),
                bool_to_int(todo.done),
                todo.due_date,
                todo.priority.as_db_str(),
                bool_to_int(todo.notification),
                todo.repeating.map(Repeating::as_db_str),
                bool_to_int(todo.is_deleted),
                todo.deleted_at,
                todo.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(todo.uuid));
        }
        Ok(())
    }

    fn delete_todo(&self, uuid: TodoId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM todos WHERE uuid = ?1;", [uuid.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(uuid));
        }
        Ok(())
    }

    fn list_by_creator(&self, creator: UserId) -> RepoResult<Vec<Todo>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TODO_SELECT_SQL}
             WHERE created_by = ?1
             ORDER BY updated_at DESC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([creator.to_string()])?;
        let mut todos = Vec::new();
        while let Some(row) = rows.next()? {
            todos.push(parse_todo_row(row)?);
        }
        Ok(todos)
    }
}

fn parse_todo_row(row: &Row<'_>) -> RepoResult<Todo> {
    let uuid_text: String = row.get("uuid")?;
    let created_by_text: String = row.get("created_by")?;

    let priority_text: String = row.get("priority")?;
    let priority = Priority::parse(&priority_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid priority `{priority_text}` in todos.priority"))
    })?;

    let repeating = match row.get::<_, Option<String>>("repeating")? {
        Some(value) => Some(Repeating::parse(&value).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid repeating value `{value}` in todos.repeating"
            ))
        })?),
        None => None,
    };

    let todo = Todo {
        uuid: parse_uuid(&uuid_text, "todos.uuid")?,
        title: row.get("title")?,
        emoji: row.get("emoji")?,
        created_by: parse_uuid(&created_by_text, "todos.created_by")?,
        done: parse_bool(row.get("done")?, "todos.done")?,
        due_date: row.get("due_date")?,
        priority,
        notification: parse_bool(row.get("notification")?, "todos.notification")?,
        repeating,
        is_deleted: parse_bool(row.get("is_deleted")?, "todos.is_deleted")?,
        deleted_at: row.get("deleted_at")?,
    };
    todo.validate()?;
    Ok(todo)
}
