use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::ids::UserId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("user name cannot be empty")]
    EmptyName,

    #[error("email cannot be empty")]
    EmptyEmail,

    #[error("invalid email address: {0}")]
    InvalidEmail(String),
}

/// Trims and checks an email address.
///
/// Only the shape `local@domain` is enforced.
///
/// # Errors
///
/// Returns `UserError::EmptyEmail` or `UserError::InvalidEmail`.
pub fn normalize_email(raw: &str) -> Result<String, UserError> {
    let email = raw.trim();
    if email.is_empty() {
        return Err(UserError::EmptyEmail);
    }
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.contains(char::is_whitespace) =>
        {
            Ok(email.to_owned())
        }
        _ => Err(UserError::InvalidEmail(email.to_owned())),
    }
}

/// A registered quiz taker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    id: UserId,
    name: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl User {
    /// Creates a user, trimming name and email.
    ///
    /// # Errors
    ///
    /// Returns `UserError` if the name is blank or the email is malformed.
    pub fn new(
        id: UserId,
        name: impl Into<String>,
        email: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(UserError::EmptyName);
        }
        let email = normalize_email(email)?;

        Ok(Self {
            id,
            name: name.to_owned(),
            email,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
