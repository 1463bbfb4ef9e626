use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::ids::{OptionId, QuestionId, UserId};
use crate::model::question::QuestionOption;

/// A user's recorded choice for one question.
///
/// At most one exists per `(user_id, question_id)`; later submissions overwrite
/// `selected_option_id` and `is_correct` but keep the first `answered_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAnswer {
    pub user_id: UserId,
    pub question_id: QuestionId,
    pub selected_option_id: OptionId,
    pub is_correct: bool,
    pub answered_at: DateTime<Utc>,
}

impl UserAnswer {
    /// Grades a selection using the option's stored flag.
    #[must_use]
    pub fn grade(
        user_id: UserId,
        question_id: QuestionId,
        selected: &QuestionOption,
        answered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            question_id,
            selected_option_id: selected.id,
            is_correct: selected.is_correct,
            answered_at,
        }
    }
}

/// Outcome returned to the caller of an answer submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubmissionResult {
    pub is_correct: bool,
    /// True when a prior answer for the same question was overwritten.
    pub updated: bool,
}
