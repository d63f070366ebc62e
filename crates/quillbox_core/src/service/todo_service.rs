//! Todo use-case service.
//!
//! # Invariants
//! - Every operation is gated on the creator; todos are never shared.
//! - Priority/repeating values are typed and therefore always canonical.

use crate::error::FailureKind;
use crate::model::todo::{Priority, Repeating, Todo, TodoId};
use crate::model::user::UserId;
use crate::model::{now_epoch_ms, ModelValidationError};
use crate::repo::todo_repo::TodoRepository;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Input for todo creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoDraft {
    pub title: String,
    pub emoji: Option<String>,
    pub due_date: i64,
    pub priority: Priority,
    pub notification: bool,
    pub repeating: Option<Repeating>,
}

/// Partial todo update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub emoji: Option<String>,
    pub done: Option<bool>,
    pub due_date: Option<i64>,
    pub priority: Option<Priority>,
    pub notification: Option<bool>,
    pub repeating: Option<Repeating>,
    /// Toggles the soft-delete marker; `deleted_at` follows automatically.
    pub deleted: Option<bool>,
}

/// Service error for todo use-cases.
#[derive(Debug)]
pub enum TodoServiceError {
    /// Target todo does not exist.
    TodoNotFound(TodoId),
    /// Acting user did not create this todo.
    NotOwner { todo: TodoId, user: UserId },
    /// Field-level validation failure.
    Validation(ModelValidationError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl TodoServiceError {
    /// Classifies this error for the transport boundary.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::TodoNotFound(_) => FailureKind::NotFound,
            Self::NotOwner { .. } => FailureKind::Forbidden,
            Self::Validation(_) => FailureKind::Invalid,
            Self::InconsistentState(_) | Self::Repo(_) => FailureKind::Internal,
        }
    }
}

impl Display for TodoServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TodoNotFound(id) => write!(f, "todo not found: {id}"),
            Self::NotOwner { todo, user } => {
                write!(f, "user {user} is not the owner of todo {todo}")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent todo state: {details}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TodoServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TodoServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::TodoNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Todo service facade over repository implementations.
pub struct TodoService<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> TodoService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one todo owned by the acting user.
    pub fn create_todo(&self, acting: UserId, draft: TodoDraft) -> Result<Todo, TodoServiceError> {
        let mut todo = Todo::new(
            draft.title,
            acting,
            draft.due_date,
            draft.priority,
            draft.notification,
        );
        todo.emoji = draft.emoji;
        todo.repeating = draft.repeating;

        let uuid = self.repo.create_todo(&todo)?;
        self.repo
            .get_todo(uuid)?
            .ok_or(TodoServiceError::InconsistentState(
                "created todo not found in read-back",
            ))
    }

    /// Loads one todo, owner-gated.
    pub fn get_todo(&self, acting: UserId, uuid: TodoId) -> Result<Todo, TodoServiceError> {
        let todo = self
            .repo
            .get_todo(uuid)?
            .ok_or(TodoServiceError::TodoNotFound(uuid))?;
        ensure_owner(&todo, acting)?;
        Ok(todo)
    }

    /// Lists the acting user's todos, most recently updated first.
    pub fn list_todos(&self, acting: UserId) -> Result<Vec<Todo>, TodoServiceError> {
        self.repo.list_by_creator(acting).map_err(Into::into)
    }

    /// Applies a patch, owner-gated.
    pub fn update_todo(
        &self,
        acting: UserId,
        uuid: TodoId,
        patch: TodoPatch,
    ) -> Result<Todo, TodoServiceError> {
        let mut todo = self
            .repo
            .get_todo(uuid)?
            .ok_or(TodoServiceError::TodoNotFound(uuid))?;
        ensure_owner(&todo, acting)?;

        if let Some(title) = patch.title {
            todo.title = title;
        }
        if let Some(emoji) = patch.emoji {
            todo.emoji = Some(emoji);
        }
        if let Some(done) = patch.done {
            todo.done = done;
        }
        if let Some(due_date) = patch.due_date {
            todo.due_date = due_date;
        }
        if let Some(priority) = patch.priority {
            todo.priority = priority;
        }
        if let Some(notification) = patch.notification {
            todo.notification = notification;
        }
        if let Some(repeating) = patch.repeating {
            todo.repeating = Some(repeating);
        }
        if let Some(deleted) = patch.deleted {
            todo.is_deleted = deleted;
            todo.deleted_at = deleted.then(now_epoch_ms);
        }

        self.repo.update_todo(&todo)?;
        self.repo
            .get_todo(uuid)?
            .ok_or(TodoServiceError::InconsistentState(
                "updated todo not found in read-back",
            ))
    }

    /// Hard-deletes one todo, owner-gated.
    pub fn delete_todo(&self, acting: UserId, uuid: TodoId) -> Result<(), TodoServiceError> {
        let todo = self
            .repo
            .get_todo(uuid)?
            .ok_or(TodoServiceError::TodoNotFound(uuid))?;
        ensure_owner(&todo, acting)?;
        self.repo.delete_todo(uuid)?;
        Ok(())
    }
}

fn ensure_owner(todo: &Todo, user: UserId) -> Result<(), TodoServiceError> {
    if todo.created_by != user {
        return Err(TodoServiceError::NotOwner {
            todo: todo.uuid,
            user,
        });
    }
    Ok(())
}
