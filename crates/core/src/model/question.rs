use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{OptionId, QuestionId, TopicId};
use crate::model::topic::{TopicError, TopicName};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error(transparent)]
    Topic(#[from] TopicError),

    #[error("question text cannot be empty")]
    EmptyText,

    #[error("a question needs at least one option")]
    NoOptions,

    #[error("option {index} has empty text")]
    EmptyOptionText { index: usize },

    #[error("at least one option must be marked correct")]
    NoCorrectOption,
}

//
// ─── DRAFTS ────────────────────────────────────────────────────────────────────
//

/// Unvalidated answer option as supplied by an author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDraft {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

impl OptionDraft {
    #[must_use]
    pub fn new(text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            text: text.into(),
            is_correct,
        }
    }
}

/// Unvalidated question submission: the topic it is filed under, its body and options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub topic: String,
    pub text: String,
    pub options: Vec<OptionDraft>,
}

impl QuestionDraft {
    /// Validates the draft.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the topic or text is blank, there are no
    /// options, an option is blank, or no option is marked correct.
    pub fn validate(self) -> Result<ValidatedQuestion, QuestionError> {
        let topic = TopicName::new(self.topic)?;

        let text = self.text.trim();
        if text.is_empty() {
            return Err(QuestionError::EmptyText);
        }

        if self.options.is_empty() {
            return Err(QuestionError::NoOptions);
        }

        let mut options = Vec::with_capacity(self.options.len());
        for (index, option) in self.options.into_iter().enumerate() {
            let option_text = option.text.trim();
            if option_text.is_empty() {
                return Err(QuestionError::EmptyOptionText { index });
            }
            options.push(OptionDraft::new(option_text, option.is_correct));
        }

        if !options.iter().any(|o| o.is_correct) {
            return Err(QuestionError::NoCorrectOption);
        }

        Ok(ValidatedQuestion {
            topic,
            text: text.to_owned(),
            options,
        })
    }
}

/// A question draft that passed validation and is ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuestion {
    pub topic: TopicName,
    pub text: String,
    pub options: Vec<OptionDraft>,
}

//
// ─── PERSISTED ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionOption {
    pub id: OptionId,
    pub question_id: QuestionId,
    pub text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    pub topic_id: TopicId,
    pub text: String,
    pub options: Vec<QuestionOption>,
}

impl Question {
    #[must_use]
    pub fn option(&self, id: OptionId) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.id == id)
    }
}

//
// ─── VIEWS ─────────────────────────────────────────────────────────────────────
//

/// Option as shown to a quiz taker. Correctness is never exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    pub id: OptionId,
    pub text: String,
    /// Presentation hint only; resubmission is still accepted.
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub id: QuestionId,
    pub text: String,
    pub answered: bool,
    pub options: Vec<OptionView>,
}

impl QuestionView {
    #[must_use]
    pub fn new(question: &Question, answered: bool) -> Self {
        Self {
            id: question.id,
            text: question.text.clone(),
            answered,
            options: question
                .options
                .iter()
                .map(|o| OptionView {
                    id: o.id,
                    text: o.text.clone(),
                    disabled: answered,
                })
                .collect(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
