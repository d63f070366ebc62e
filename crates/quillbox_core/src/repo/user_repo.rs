//! User profile repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist the profile projection consumed by display joins.
//!
//! # Invariants
//! - Stored settings columns only ever hold canonical value-set tokens;
//!   unknown tokens on read are surfaced as invalid data.

use crate::model::user::{NotificationPref, Theme, UserId, UserProfile, UserSummary};
use crate::repo::{ensure_schema, parse_uuid, RepoError, RepoResult, SchemaRequirement};
use rusqlite::{params, Connection, Row};

const USER_SCHEMA: &[SchemaRequirement] = &[SchemaRequirement {
    table: "users",
    columns: &[
        "uuid",
        "email",
        "first_name",
        "picture",
        "theme",
        "notifications",
    ],
}];

/// Repository interface for user profile operations.
pub trait UserRepository {
    /// Stores one profile and returns its stable id.
    fn create_user(&self, user: &UserProfile) -> RepoResult<UserId>;
    /// Loads one profile by id.
    fn get_user(&self, uuid: UserId) -> RepoResult<Option<UserProfile>>;
    /// Replaces all mutable profile fields.
    fn update_user(&self, user: &UserProfile) -> RepoResult<()>;
    /// Deletes one profile row; reports whether a row was removed.
    fn delete_user(&self, uuid: UserId) -> RepoResult<bool>;
    /// Loads the display projection for one user.
    fn get_summary(&self, uuid: UserId) -> RepoResult<Option<UserSummary>>;
}

/// SQLite-backed user profile repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema(conn, USER_SCHEMA)?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &UserProfile) -> RepoResult<UserId> {
        self.conn.execute(
            "INSERT INTO users (uuid, email, first_name, picture, theme, notifications)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                user.uuid.to_string(),
                user.email.as_str(),
                user.first_name.as_str(),
                user.picture.as_deref(),
                user.theme.as_db_str(),
                user.notifications.as_db_str(),
            ],
        )?;
        Ok(user.uuid)
    }

    fn get_user(&self, uuid: UserId) -> RepoResult<Option<UserProfile>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, email, first_name, picture, theme, notifications
             FROM users
             WHERE uuid = ?1;",
        )?;
        let mut rows = stmt.query([uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn update_user(&self, user: &UserProfile) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users
             SET
                email = ?1,
                first_name = ?2,
                picture = ?3,
                theme = ?4,
                notifications = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?6;",
            params![
                user.email.as_str(),
                user.first_name.as_str(),
                user.picture.as_deref(),
                user.theme.as_db_str(),
                user.notifications.as_db_str(),
                user.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(user.uuid));
        }
        Ok(())
    }

    fn delete_user(&self, uuid: UserId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE uuid = ?1;", [uuid.to_string()])?;
        Ok(changed > 0)
    }

    fn get_summary(&self, uuid: UserId) -> RepoResult<Option<UserSummary>> {
        Ok(self.get_user(uuid)?.map(UserSummary::from))
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<UserProfile> {
    let uuid_text: String = row.get("uuid")?;
    let theme_text: String = row.get("theme")?;
    let notifications_text: String = row.get("notifications")?;

    let theme = Theme::parse(&theme_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid theme `{theme_text}` in users.theme"))
    })?;
    let notifications = NotificationPref::parse(&notifications_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid notification preference `{notifications_text}` in users.notifications"
        ))
    })?;

    Ok(UserProfile {
        uuid: parse_uuid(&uuid_text, "users.uuid")?,
        email: row.get("email")?,
        first_name: row.get("first_name")?,
        picture: row.get("picture")?,
        theme,
        notifications,
    })
}
