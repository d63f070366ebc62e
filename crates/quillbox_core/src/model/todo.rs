//! Todo domain model.
//!
//! # Responsibility
//! - Define the personal todo record and its closed value-sets.
//!
//! # Invariants
//! - Todos belong to exactly one creator and are never shared.
//! - `priority` and `repeating` only ever hold canonical tokens.
//! - `deleted_at` is set if and only if `is_deleted` is true.

use crate::model::user::UserId;
use crate::model::{check_delete_marker, check_title, ModelValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable todo identifier.
pub type TodoId = Uuid;

/// Todo urgency scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Highest,
    High,
    Medium,
    Low,
    Lowest,
}

impl Priority {
    /// Parses the canonical spelling, rejecting unknown tokens.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "HIGHEST" => Some(Self::Highest),
            "HIGH" => Some(Self::High),
            "MEDIUM" => Some(Self::Medium),
            "LOW" => Some(Self::Low),
            "LOWEST" => Some(Self::Lowest),
            _ => None,
        }
    }

    /// Canonical spelling used in storage and transport.
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::Highest => "HIGHEST",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
            Self::Lowest => "LOWEST",
        }
    }
}

/// Recurrence marker for repeating todos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Repeating {
    Maybe,
    Not,
    Needed,
}

impl Repeating {
    /// Parses the canonical spelling, rejecting unknown tokens.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "MAYBE" => Some(Self::Maybe),
            "NOT" => Some(Self::Not),
            "NEEDED" => Some(Self::Needed),
            _ => None,
        }
    }

    /// Canonical spelling used in storage and transport.
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::Maybe => "MAYBE",
            Self::Not => "NOT",
            Self::Needed => "NEEDED",
        }
    }
}

/// Canonical todo record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub uuid: TodoId,
    pub title: String,
    pub emoji: Option<String>,
    /// Sole authorized user; todos have no sharing semantics.
    pub created_by: UserId,
    pub done: bool,
    /// Unix epoch milliseconds; always required.
    pub due_date: i64,
    pub priority: Priority,
    pub notification: bool,
    pub repeating: Option<Repeating>,
    pub is_deleted: bool,
    pub deleted_at: Option<i64>,
}

impl Todo {
    /// Creates an open todo with a generated stable ID.
    pub fn new(
        title: impl Into<String>,
        created_by: UserId,
        due_date: i64,
        priority: Priority,
        notification: bool,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            title: title.into(),
            emoji: None,
            created_by,
            done: false,
            due_date,
            priority,
            notification,
            repeating: None,
            is_deleted: false,
            deleted_at: None,
        }
    }

    /// Checks field-level invariants before a write.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        check_title("todo", &self.title)?;
        check_delete_marker("todo", self.is_deleted, self.deleted_at)
    }
}
