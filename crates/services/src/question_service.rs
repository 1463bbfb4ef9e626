use std::collections::HashSet;
use std::sync::Arc;

use quiz_core::model::{
    QuestionDraft, QuestionId, QuestionView, Topic, TopicError, TopicId, TopicName, UserId,
};
use serde::Serialize;
use storage::repository::{
    AnswerRepository, NewQuestionRecord, QuestionRepository, TopicRepository, UserRepository,
};
use tracing::{debug, info};

use crate::error::QuestionServiceError;

/// Result of authoring a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CreatedQuestion {
    pub question_id: QuestionId,
    pub topic_id: TopicId,
    /// True when the topic did not exist before this question.
    pub topic_created: bool,
}

/// Topic and question authoring, plus the per-user question listing.
#[derive(Clone)]
pub struct QuestionService {
    users: Arc<dyn UserRepository>,
    topics: Arc<dyn TopicRepository>,
    questions: Arc<dyn QuestionRepository>,
    answers: Arc<dyn AnswerRepository>,
}

impl QuestionService {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        topics: Arc<dyn TopicRepository>,
        questions: Arc<dyn QuestionRepository>,
        answers: Arc<dyn AnswerRepository>,
    ) -> Self {
        Self {
            users,
            topics,
            questions,
            answers,
        }
    }

    /// Get or create a topic by name.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError::Topic` for a blank name.
    /// Returns `QuestionServiceError::Storage` if persistence fails.
    pub async fn create_topic(&self, name: &str) -> Result<Topic, QuestionServiceError> {
        let name = TopicName::new(name)?;
        let (topic, created) = self.topics.get_or_create_topic(&name).await?;
        if created {
            info!(topic_id = %topic.id(), name = %topic.name(), "created topic");
        }
        Ok(topic)
    }

    /// Validate a question and persist it with its options under its topic,
    /// creating the topic on first use.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError::Question` for validation failures.
    /// Returns `QuestionServiceError::Storage` if persistence fails.
    pub async fn create_question(
        &self,
        draft: QuestionDraft,
    ) -> Result<CreatedQuestion, QuestionServiceError> {
        let question = draft.validate()?;
        let (topic, topic_created) = self.topics.get_or_create_topic(&question.topic).await?;
        let stored = self
            .questions
            .insert_question(NewQuestionRecord::from_validated(topic.id(), &question))
            .await?;

        info!(
            question_id = %stored.id,
            topic_id = %topic.id(),
            topic_created,
            options = stored.options.len(),
            "created question"
        );

        Ok(CreatedQuestion {
            question_id: stored.id,
            topic_id: topic.id(),
            topic_created,
        })
    }

    /// List the questions of a topic (matched case-insensitively).
    ///
    /// With a user, questions that user already answered come back with
    /// `answered = true` and every option `disabled = true`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError::Topic` for a blank topic name,
    /// `QuestionServiceError::TopicNotFound` / `UserNotFound` when a lookup fails.
    pub async fn list_questions(
        &self,
        topic_name: &str,
        user_id: Option<UserId>,
    ) -> Result<Vec<QuestionView>, QuestionServiceError> {
        let topic_name = topic_name.trim();
        if topic_name.is_empty() {
            return Err(TopicError::EmptyName.into());
        }

        let topic = self
            .topics
            .find_topic_by_name(topic_name)
            .await?
            .ok_or_else(|| QuestionServiceError::TopicNotFound(topic_name.to_owned()))?;

        let answered: HashSet<QuestionId> = match user_id {
            Some(user_id) => {
                self.users
                    .get_user(user_id)
                    .await?
                    .ok_or(QuestionServiceError::UserNotFound(user_id))?;
                self.answers
                    .answered_question_ids(user_id, topic.id())
                    .await?
                    .into_iter()
                    .collect()
            }
            None => HashSet::new(),
        };

        let questions = self.questions.questions_for_topic(topic.id()).await?;
        debug!(
            topic_id = %topic.id(),
            questions = questions.len(),
            answered = answered.len(),
            "listed questions"
        );

        Ok(questions
            .iter()
            .map(|q| QuestionView::new(q, answered.contains(&q.id)))
            .collect())
    }

    /// Delete a topic with all its questions, options and answers.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError::TopicIdNotFound` if the topic is missing.
    pub async fn delete_topic(&self, id: TopicId) -> Result<(), QuestionServiceError> {
        if !self.topics.delete_topic(id).await? {
            return Err(QuestionServiceError::TopicIdNotFound(id));
        }
        info!(topic_id = %id, "deleted topic");
        Ok(())
    }

    /// Delete a question with its options and answers.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError::QuestionNotFound` if the question is missing.
    pub async fn delete_question(&self, id: QuestionId) -> Result<(), QuestionServiceError> {
        if !self.questions.delete_question(id).await? {
            return Err(QuestionServiceError::QuestionNotFound(id));
        }
        info!(question_id = %id, "deleted question");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use quiz_core::model::{OptionDraft, QuestionError, UserAnswer};
    use quiz_core::time::fixed_now;
    use storage::repository::{InMemoryRepository, NewUserRecord};

    fn service(repo: &InMemoryRepository) -> QuestionService {
        QuestionService::new(
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        )
    }

    fn draft(topic: &str, text: &str) -> QuestionDraft {
        QuestionDraft {
            topic: topic.into(),
            text: text.into(),
            options: vec![OptionDraft::new("yes", true), OptionDraft::new("no", false)],
        }
    }

    async fn add_user(repo: &InMemoryRepository) -> UserId {
        repo.insert_new_user(NewUserRecord {
            name: "Kim".into(),
            email: "kim@example.com".into(),
            created_at: fixed_now(),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn create_question_creates_topic_once() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);

        let first = svc.create_question(draft("React", "Q1")).await.unwrap();
        assert!(first.topic_created);
        let second = svc.create_question(draft("react", "Q2")).await.unwrap();
        assert!(!second.topic_created);
        assert_eq!(first.topic_id, second.topic_id);

        let topic = svc.create_topic("REACT").await.unwrap();
        assert_eq!(topic.id(), first.topic_id);
    }

    #[tokio::test]
    async fn create_question_validates() {
        let repo = InMemoryRepository::new();
        let mut bad = draft("React", "Q");
        bad.options.clear();
        let err = service(&repo).create_question(bad).await.unwrap_err();
        assert!(matches!(
            err,
            QuestionServiceError::Question(QuestionError::NoOptions)
        ));
        assert!(repo.list_topics().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_questions_without_user_is_all_enabled() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);
        svc.create_question(draft("React", "Q1")).await.unwrap();
        svc.create_question(draft("React", "Q2")).await.unwrap();
        svc.create_question(draft("CSS", "Q3")).await.unwrap();

        let views = svc.list_questions("react", None).await.unwrap();
        let texts: Vec<&str> = views.iter().map(|v| v.text.as_str()).collect();
        assert_eq!(texts, ["Q1", "Q2"]);
        assert!(views.iter().all(|v| !v.answered));
        assert!(views.iter().flat_map(|v| &v.options).all(|o| !o.disabled));
    }

    #[tokio::test]
    async fn list_questions_disables_only_answered_question() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);
        let user = add_user(&repo).await;
        let q1 = svc.create_question(draft("React", "Q1")).await.unwrap();
        svc.create_question(draft("React", "Q2")).await.unwrap();

        let before = svc.list_questions("React", Some(user)).await.unwrap();
        assert!(before.iter().flat_map(|v| &v.options).all(|o| !o.disabled));

        let question = repo.get_question(q1.question_id).await.unwrap().unwrap();
        let answer = UserAnswer::grade(user, question.id, &question.options[1], fixed_now());
        repo.upsert_answer(&answer).await.unwrap();

        let after = svc.list_questions("React", Some(user)).await.unwrap();
        assert!(after[0].answered);
        assert!(after[0].options.iter().all(|o| o.disabled));
        assert!(!after[1].answered);
        assert!(after[1].options.iter().all(|o| !o.disabled));
    }

    #[tokio::test]
    async fn list_questions_lookup_failures() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);
        svc.create_question(draft("React", "Q1")).await.unwrap();

        let err = svc.list_questions("Go", None).await.unwrap_err();
        assert!(matches!(err, QuestionServiceError::TopicNotFound(ref name) if name == "Go"));

        let err = svc
            .list_questions("React", Some(UserId::new(404)))
            .await
            .unwrap_err();
        assert!(matches!(err, QuestionServiceError::UserNotFound(_)));

        let err = svc.list_questions("  ", None).await.unwrap_err();
        assert!(matches!(err, QuestionServiceError::Topic(TopicError::EmptyName)));
    }

    #[tokio::test]
    async fn delete_reports_missing_rows() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);
        let created = svc.create_question(draft("CSS", "Q")).await.unwrap();

        svc.delete_question(created.question_id).await.unwrap();
        let err = svc.delete_question(created.question_id).await.unwrap_err();
        assert!(matches!(err, QuestionServiceError::QuestionNotFound(_)));

        svc.delete_topic(created.topic_id).await.unwrap();
        let err = svc.delete_topic(created.topic_id).await.unwrap_err();
        assert!(matches!(err, QuestionServiceError::TopicIdNotFound(_)));
    }
}
