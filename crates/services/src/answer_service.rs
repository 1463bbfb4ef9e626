use std::sync::Arc;

use quiz_core::model::{OptionId, QuestionId, SubmissionResult, UserAnswer, UserId};
use storage::repository::{AnswerRepository, QuestionRepository, UserRepository};
use tracing::{info, warn};

use crate::Clock;
use crate::error::AnswerServiceError;

/// Grades and records answer submissions.
#[derive(Clone)]
pub struct AnswerService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    questions: Arc<dyn QuestionRepository>,
    answers: Arc<dyn AnswerRepository>,
}

impl AnswerService {
    #[must_use]
    pub fn new(
        clock: Clock,
        users: Arc<dyn UserRepository>,
        questions: Arc<dyn QuestionRepository>,
        answers: Arc<dyn AnswerRepository>,
    ) -> Self {
        Self {
            clock,
            users,
            questions,
            answers,
        }
    }

    /// Record the user's choice for a question, replacing any earlier choice.
    ///
    /// Correctness is read from the selected option at submission time.
    /// Resubmission is always accepted; `updated` reports whether an earlier
    /// answer was overwritten.
    ///
    /// # Errors
    ///
    /// Returns a `*NotFound` variant if the user, question or option is missing.
    /// Returns `AnswerServiceError::OptionNotInQuestion` if the option belongs
    /// to a different question.
    /// Returns `AnswerServiceError::Storage` if persistence fails.
    pub async fn submit_answer(
        &self,
        user_id: UserId,
        question_id: QuestionId,
        selected_option_id: OptionId,
    ) -> Result<SubmissionResult, AnswerServiceError> {
        self.users
            .get_user(user_id)
            .await?
            .ok_or(AnswerServiceError::UserNotFound(user_id))?;
        let question = self
            .questions
            .get_question(question_id)
            .await?
            .ok_or(AnswerServiceError::QuestionNotFound(question_id))?;
        let option = self
            .questions
            .get_option(selected_option_id)
            .await?
            .ok_or(AnswerServiceError::OptionNotFound(selected_option_id))?;

        if option.question_id != question.id {
            warn!(
                user_id = %user_id,
                question_id = %question_id,
                option_id = %selected_option_id,
                "rejected answer: option belongs to another question"
            );
            return Err(AnswerServiceError::OptionNotInQuestion {
                option_id: selected_option_id,
                question_id,
            });
        }

        let answer = UserAnswer::grade(user_id, question.id, &option, self.clock.now());
        let outcome = self.answers.upsert_answer(&answer).await?;

        info!(
            user_id = %user_id,
            question_id = %question_id,
            option_id = %selected_option_id,
            is_correct = answer.is_correct,
            updated = outcome.is_update(),
            "answer submitted"
        );

        Ok(SubmissionResult {
            is_correct: answer.is_correct,
            updated: outcome.is_update(),
        })
    }
}
