use std::sync::Arc;

use quiz_core::model::{User, UserId, normalize_email};
use storage::repository::{NewUserRecord, StorageError, UserRepository};
use tracing::{debug, info};

use crate::Clock;
use crate::error::UserServiceError;

/// Registration and lookup of quiz takers.
#[derive(Clone)]
pub struct UserService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
}

impl UserService {
    #[must_use]
    pub fn new(clock: Clock, users: Arc<dyn UserRepository>) -> Self {
        Self { clock, users }
    }

    /// Validate and register a new user.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::User` for a blank name or malformed email.
    /// Returns `UserServiceError::EmailTaken` if the email is already registered.
    /// Returns `UserServiceError::Storage` if persistence fails.
    pub async fn register_user(&self, name: &str, email: &str) -> Result<User, UserServiceError> {
        let now = self.clock.now();
        let draft = User::new(UserId::new(1), name, email, now)?;

        let id = match self
            .users
            .insert_new_user(NewUserRecord::from_user(&draft))
            .await
        {
            Ok(id) => id,
            Err(StorageError::Conflict) => {
                return Err(UserServiceError::EmailTaken(draft.email().to_owned()));
            }
            Err(e) => return Err(e.into()),
        };

        info!(user_id = %id, email = draft.email(), "registered user");
        Ok(User::new(id, draft.name(), draft.email(), draft.created_at())?)
    }

    /// Look a user up by email (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::User` if the email is blank or malformed,
    /// `UserServiceError::EmailNotFound` if nobody registered it.
    pub async fn find_by_email(&self, email: &str) -> Result<User, UserServiceError> {
        let email = normalize_email(email)?;
        debug!(email = %email, "looking up user by email");
        self.users
            .find_user_by_email(&email)
            .await?
            .ok_or(UserServiceError::EmailNotFound(email))
    }

    /// # Errors
    ///
    /// Returns `UserServiceError::UserNotFound` if the id does not resolve.
    pub async fn get_user(&self, id: UserId) -> Result<User, UserServiceError> {
        self.users
            .get_user(id)
            .await?
            .ok_or(UserServiceError::UserNotFound(id))
    }
}
