//! User profile domain model.
//!
//! # Responsibility
//! - Define the profile projection stored for every account.
//! - Own the closed value-sets for user settings.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another account.
//! - Authentication material is never part of this model; credential
//!   lifecycle belongs to the external authentication collaborator.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier referenced by all shared content as an opaque key.
pub type UserId = Uuid;

/// UI theme selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    /// Parses the canonical spelling, rejecting unknown tokens.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "LIGHT" => Some(Self::Light),
            "DARK" => Some(Self::Dark),
            _ => None,
        }
    }

    /// Canonical spelling used in storage and transport.
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::Light => "LIGHT",
            Self::Dark => "DARK",
        }
    }
}

/// Notification delivery preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationPref {
    All,
    Todos,
    Invites,
    None,
}

impl NotificationPref {
    /// Parses the canonical spelling, rejecting unknown tokens.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ALL" => Some(Self::All),
            "TODOS" => Some(Self::Todos),
            "INVITES" => Some(Self::Invites),
            "NONE" => Some(Self::None),
            _ => None,
        }
    }

    /// Canonical spelling used in storage and transport.
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Todos => "TODOS",
            Self::Invites => "INVITES",
            Self::None => "NONE",
        }
    }
}

/// Stored profile record for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uuid: UserId,
    pub email: String,
    pub first_name: String,
    pub picture: Option<String>,
    pub theme: Theme,
    pub notifications: NotificationPref,
}

impl UserProfile {
    /// Creates a profile with default settings and a generated stable ID.
    pub fn new(email: impl Into<String>, first_name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            email: email.into(),
            first_name: first_name.into(),
            picture: None,
            theme: Theme::Light,
            notifications: NotificationPref::All,
        }
    }
}

/// Display projection attached to shared content (members, invite parties).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub uuid: UserId,
    pub email: String,
    pub first_name: String,
    pub picture: Option<String>,
}

impl From<UserProfile> for UserSummary {
    fn from(value: UserProfile) -> Self {
        Self {
            uuid: value.uuid,
            email: value.email,
            first_name: value.first_name,
            picture: value.picture,
        }
    }
}
