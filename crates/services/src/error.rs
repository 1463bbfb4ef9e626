//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{OptionId, QuestionError, QuestionId, TopicError, TopicId, UserError, UserId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Coarse classification a boundary layer maps to its own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed input (400-equivalent).
    Validation,
    /// A referenced user, topic, question or option does not exist (404-equivalent).
    NotFound,
    /// Storage or other unexpected failure (500-equivalent).
    Internal,
}

fn storage_kind(err: &StorageError) -> ErrorKind {
    match err {
        StorageError::NotFound => ErrorKind::NotFound,
        _ => ErrorKind::Internal,
    }
}

/// Errors emitted by `UserService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UserServiceError {
    #[error(transparent)]
    User(#[from] UserError),
    #[error("email {0} is already registered")]
    EmailTaken(String),
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error("no user with email {0}")]
    EmailNotFound(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl UserServiceError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::User(_) | Self::EmailTaken(_) => ErrorKind::Validation,
            Self::UserNotFound(_) | Self::EmailNotFound(_) => ErrorKind::NotFound,
            Self::Storage(e) => storage_kind(e),
        }
    }
}

/// Errors emitted by `QuestionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionServiceError {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Topic(#[from] TopicError),
    #[error("topic {0:?} not found")]
    TopicNotFound(String),
    #[error("topic {0} not found")]
    TopicIdNotFound(TopicId),
    #[error("question {0} not found")]
    QuestionNotFound(QuestionId),
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl QuestionServiceError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Question(_) | Self::Topic(_) => ErrorKind::Validation,
            Self::TopicNotFound(_)
            | Self::TopicIdNotFound(_)
            | Self::QuestionNotFound(_)
            | Self::UserNotFound(_) => ErrorKind::NotFound,
            Self::Storage(e) => storage_kind(e),
        }
    }
}

/// Errors emitted by `AnswerService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnswerServiceError {
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error("question {0} not found")]
    QuestionNotFound(QuestionId),
    #[error("option {0} not found")]
    OptionNotFound(OptionId),
    #[error("option {option_id} does not belong to question {question_id}")]
    OptionNotInQuestion {
        option_id: OptionId,
        question_id: QuestionId,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl AnswerServiceError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::OptionNotInQuestion { .. } => ErrorKind::Validation,
            Self::UserNotFound(_) | Self::QuestionNotFound(_) | Self::OptionNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::Storage(e) => storage_kind(e),
        }
    }
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ProgressServiceError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UserNotFound(_) => ErrorKind::NotFound,
            Self::Storage(e) => storage_kind(e),
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_taxonomy() {
        assert_eq!(
            UserServiceError::EmailTaken("a@b.c".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            QuestionServiceError::TopicNotFound("Go".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            AnswerServiceError::OptionNotInQuestion {
                option_id: OptionId::new(1),
                question_id: QuestionId::new(2),
            }
            .kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            ProgressServiceError::Storage(StorageError::Connection("down".into())).kind(),
            ErrorKind::Internal
        );
        assert_eq!(
            AnswerServiceError::Storage(StorageError::NotFound).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn messages_name_the_missing_entity() {
        assert_eq!(
            AnswerServiceError::OptionNotFound(OptionId::new(9)).to_string(),
            "option 9 not found"
        );
        assert_eq!(
            QuestionServiceError::TopicNotFound("Go".into()).to_string(),
            "topic \"Go\" not found"
        );
    }
}
