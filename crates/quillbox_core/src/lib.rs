//! Core domain logic for Quillbox, a multi-user note-taking service.
//! This crate is the single source of truth for business invariants:
//! notebook/note access sets, invite lifecycle, and account teardown.

pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use error::FailureKind;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::invite::{InviteId, NotebookInvite};
pub use model::note::{Note, NoteId};
pub use model::notebook::{is_valid_color, Notebook, NotebookId};
pub use model::todo::{Priority, Repeating, Todo, TodoId};
pub use model::user::{NotificationPref, Theme, UserId, UserProfile, UserSummary};
pub use model::ModelValidationError;
pub use repo::access::{GrantOutcome, RevokeOutcome};
pub use repo::account_repo::{AccountRepository, SqliteAccountRepository};
pub use repo::invite_repo::{InviteDetails, InviteRepository, SqliteInviteRepository};
pub use repo::note_repo::{NoteRepository, SqliteNoteRepository};
pub use repo::notebook_repo::{
    NotebookDetails, NotebookRepository, NoteSummary, SqliteNotebookRepository,
};
pub use repo::todo_repo::{SqliteTodoRepository, TodoRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::account_service::{AccountService, AccountServiceError, CascadeReport};
pub use service::invite_service::{InviteService, InviteServiceError};
pub use service::note_service::{NoteDraft, NotePatch, NoteService, NoteServiceError};
pub use service::notebook_service::{
    NotebookDraft, NotebookPatch, NotebookService, NotebookServiceError,
};
pub use service::todo_service::{TodoDraft, TodoPatch, TodoService, TodoServiceError};
pub use service::user_service::{ProfilePatch, UserService, UserServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
