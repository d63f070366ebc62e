//! User profile use-case service.
//!
//! # Responsibility
//! - Store the profile projection consumed by display joins.
//! - Apply settings patches whose value-sets are enforced at the type
//!   boundary.

use crate::error::FailureKind;
use crate::model::user::{NotificationPref, Theme, UserId, UserProfile};
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Partial profile update. `None` fields are left untouched.
///
/// Settings arrive as typed enums: unknown tokens never reach this layer
/// because `Theme::parse` / `NotificationPref::parse` reject them at the
/// boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub first_name: Option<String>,
    pub picture: Option<String>,
    pub theme: Option<Theme>,
    pub notifications: Option<NotificationPref>,
}

/// Service error for user profile use-cases.
#[derive(Debug)]
pub enum UserServiceError {
    /// Target user does not exist.
    UserNotFound(UserId),
    /// Email is empty after trimming.
    BlankEmail,
    /// First name is empty after trimming.
    BlankFirstName,
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl UserServiceError {
    /// Classifies this error for the transport boundary.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::UserNotFound(_) => FailureKind::NotFound,
            Self::BlankEmail | Self::BlankFirstName => FailureKind::Invalid,
            Self::InconsistentState(_) | Self::Repo(_) => FailureKind::Internal,
        }
    }
}

impl Display for UserServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::BlankEmail => write!(f, "email must not be blank"),
            Self::BlankFirstName => write!(f, "first name must not be blank"),
            Self::InconsistentState(details) => write!(f, "inconsistent user state: {details}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for UserServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for UserServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::UserNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// User profile service facade over repository implementations.
pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Stores the profile projection for a freshly authenticated account.
    pub fn register_profile(
        &self,
        email: impl Into<String>,
        first_name: impl Into<String>,
    ) -> Result<UserProfile, UserServiceError> {
        let email = email.into();
        let first_name = first_name.into();
        if email.trim().is_empty() {
            return Err(UserServiceError::BlankEmail);
        }
        if first_name.trim().is_empty() {
            return Err(UserServiceError::BlankFirstName);
        }

        let profile = UserProfile::new(email, first_name);
        let uuid = self.repo.create_user(&profile)?;
        self.repo
            .get_user(uuid)?
            .ok_or(UserServiceError::InconsistentState(
                "created profile not found in read-back",
            ))
    }

    /// Loads one profile by id.
    pub fn get_profile(&self, uuid: UserId) -> Result<UserProfile, UserServiceError> {
        self.repo
            .get_user(uuid)?
            .ok_or(UserServiceError::UserNotFound(uuid))
    }

    /// Applies a profile patch for the acting user.
    pub fn update_profile(
        &self,
        acting: UserId,
        patch: ProfilePatch,
    ) -> Result<UserProfile, UserServiceError> {
        let mut profile = self
            .repo
            .get_user(acting)?
            .ok_or(UserServiceError::UserNotFound(acting))?;

        if let Some(first_name) = patch.first_name {
            if first_name.trim().is_empty() {
                return Err(UserServiceError::BlankFirstName);
            }
            profile.first_name = first_name;
        }
        if let Some(picture) = patch.picture {
            profile.picture = Some(picture);
        }
        if let Some(theme) = patch.theme {
            profile.theme = theme;
        }
        if let Some(notifications) = patch.notifications {
            profile.notifications = notifications;
        }

        self.repo.update_user(&profile)?;
        self.repo
            .get_user(acting)?
            .ok_or(UserServiceError::InconsistentState(
                "updated profile not found in read-back",
            ))
    }
}
