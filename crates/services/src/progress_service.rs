use std::sync::Arc;

use quiz_core::model::{ProgressReport, UserId};
use storage::repository::{AnswerRepository, UserRepository};
use tracing::debug;

use crate::error::ProgressServiceError;

/// Per-topic completion statistics for a user.
#[derive(Clone)]
pub struct ProgressService {
    users: Arc<dyn UserRepository>,
    answers: Arc<dyn AnswerRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>, answers: Arc<dyn AnswerRepository>) -> Self {
        Self { users, answers }
    }

    /// Progress for every topic, whether or not the user has touched it.
    ///
    /// Topics the user has fully attempted carry correct/wrong counts; a topic
    /// with no questions reports 0% and counts as fully attempted.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::UserNotFound` if the user is missing.
    /// Returns `ProgressServiceError::Storage` on repository failures.
    pub async fn get_progress(
        &self,
        user_id: UserId,
    ) -> Result<ProgressReport, ProgressServiceError> {
        self.users
            .get_user(user_id)
            .await?
            .ok_or(ProgressServiceError::UserNotFound(user_id))?;

        let tallies = self.answers.topic_tallies(user_id).await?;
        debug!(user_id = %user_id, topics = tallies.len(), "computed progress");
        Ok(ProgressReport::from_tallies(tallies))
    }
}
