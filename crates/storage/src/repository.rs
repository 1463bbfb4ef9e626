use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{
    OptionId, Question, QuestionId, QuestionOption, Topic, TopicId, TopicName, TopicTally, User,
    UserAnswer, UserId, ValidatedQuestion,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Insert shape for a user before an id is assigned.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl NewUserRecord {
    #[must_use]
    pub fn from_user(user: &User) -> Self {
        Self {
            name: user.name().to_owned(),
            email: user.email().to_owned(),
            created_at: user.created_at(),
        }
    }
}

/// Insert shape for a question and its options.
#[derive(Debug, Clone)]
pub struct NewQuestionRecord {
    pub topic_id: TopicId,
    pub text: String,
    pub options: Vec<(String, bool)>,
}

impl NewQuestionRecord {
    #[must_use]
    pub fn from_validated(topic_id: TopicId, question: &ValidatedQuestion) -> Self {
        Self {
            topic_id,
            text: question.text.clone(),
            options: question
                .options
                .iter()
                .map(|o| (o.text.clone(), o.is_correct))
                .collect(),
        }
    }
}

/// What an answer upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

impl UpsertOutcome {
    #[must_use]
    pub fn is_update(self) -> bool {
        matches!(self, Self::Updated)
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the email is already registered
    /// (case-insensitive), or other storage errors.
    async fn insert_new_user(&self, user: NewUserRecord) -> Result<UserId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures. A missing user is `Ok(None)`.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError>;

    /// Case-insensitive email lookup.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;
}

#[async_trait]
pub trait TopicRepository: Send + Sync {
    /// Fetch the topic matching `name` case-insensitively, creating it if absent.
    ///
    /// Returns `true` alongside the topic when it was created by this call.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_or_create_topic(&self, name: &TopicName) -> Result<(Topic, bool), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_topic(&self, id: TopicId) -> Result<Option<Topic>, StorageError>;

    /// Case-insensitive name lookup.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn find_topic_by_name(&self, name: &str) -> Result<Option<Topic>, StorageError>;

    /// All topics ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_topics(&self) -> Result<Vec<Topic>, StorageError>;

    /// Delete a topic together with its questions, options and answers.
    ///
    /// Returns `false` if the topic did not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn delete_topic(&self, id: TopicId) -> Result<bool, StorageError>;
}

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Insert a question and all of its options atomically.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the topic does not exist, or other storage errors.
    async fn insert_question(&self, question: NewQuestionRecord)
    -> Result<Question, StorageError>;

    /// Fetch a question with its options (ordered by id).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError>;

    /// Fetch a single option by id, regardless of its question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_option(&self, id: OptionId) -> Result<Option<QuestionOption>, StorageError>;

    /// Questions of a topic with their options, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn questions_for_topic(&self, topic_id: TopicId) -> Result<Vec<Question>, StorageError>;

    /// Delete a question together with its options and answers.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn delete_question(&self, id: QuestionId) -> Result<bool, StorageError>;
}

#[async_trait]
pub trait AnswerRepository: Send + Sync {
    /// Insert or overwrite the answer keyed by `(user_id, question_id)`.
    ///
    /// On overwrite only the selected option and correctness change.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if a referenced row is missing, or other storage errors.
    async fn upsert_answer(&self, answer: &UserAnswer) -> Result<UpsertOutcome, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_answer(
        &self,
        user_id: UserId,
        question_id: QuestionId,
    ) -> Result<Option<UserAnswer>, StorageError>;

    /// Ids of the questions in `topic_id` the user has answered.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn answered_question_ids(
        &self,
        user_id: UserId,
        topic_id: TopicId,
    ) -> Result<Vec<QuestionId>, StorageError>;

    /// Per-topic question/answer counts for a user, one entry per topic, ordered by topic id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn topic_tallies(&self, user_id: UserId) -> Result<Vec<TopicTally>, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct MemoryState {
    next_id: u64,
    users: BTreeMap<UserId, User>,
    topics: BTreeMap<TopicId, Topic>,
    questions: BTreeMap<QuestionId, Question>,
    answers: HashMap<(UserId, QuestionId), UserAnswer>,
}

impl MemoryState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn remove_question(&mut self, id: QuestionId) -> bool {
        if self.questions.remove(&id).is_none() {
            return false;
        }
        self.answers.retain(|(_, question_id), _| *question_id != id);
        true
    }
}

/// In-memory repository for tests and prototyping.
///
/// Mirrors the SQL constraints: unique emails and topic names (case-insensitive),
/// one answer per `(user, question)`, and cascading deletes.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn insert_new_user(&self, user: NewUserRecord) -> Result<UserId, StorageError> {
        let mut guard = self.lock()?;
        let taken = guard
            .users
            .values()
            .any(|u| u.email().eq_ignore_ascii_case(&user.email));
        if taken {
            return Err(StorageError::Conflict);
        }
        let id = UserId::new(guard.next_id());
        let stored = User::new(id, user.name, &user.email, user.created_at)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        guard.users.insert(id, stored);
        Ok(id)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .users
            .values()
            .find(|u| u.email().eq_ignore_ascii_case(email.trim()))
            .cloned())
    }
}

#[async_trait]
impl TopicRepository for InMemoryRepository {
    async fn get_or_create_topic(&self, name: &TopicName) -> Result<(Topic, bool), StorageError> {
        let mut guard = self.lock()?;
        if let Some(existing) = guard.topics.values().find(|t| t.name().matches(name.as_str())) {
            return Ok((existing.clone(), false));
        }
        let topic = Topic::new(TopicId::new(guard.next_id()), name.clone());
        guard.topics.insert(topic.id(), topic.clone());
        Ok((topic, true))
    }

    async fn get_topic(&self, id: TopicId) -> Result<Option<Topic>, StorageError> {
        Ok(self.lock()?.topics.get(&id).cloned())
    }

    async fn find_topic_by_name(&self, name: &str) -> Result<Option<Topic>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.topics.values().find(|t| t.name().matches(name)).cloned())
    }

    async fn list_topics(&self) -> Result<Vec<Topic>, StorageError> {
        Ok(self.lock()?.topics.values().cloned().collect())
    }

    async fn delete_topic(&self, id: TopicId) -> Result<bool, StorageError> {
        let mut guard = self.lock()?;
        if guard.topics.remove(&id).is_none() {
            return Ok(false);
        }
        let owned: Vec<QuestionId> = guard
            .questions
            .values()
            .filter(|q| q.topic_id == id)
            .map(|q| q.id)
            .collect();
        for question_id in owned {
            guard.remove_question(question_id);
        }
        Ok(true)
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn insert_question(
        &self,
        question: NewQuestionRecord,
    ) -> Result<Question, StorageError> {
        let mut guard = self.lock()?;
        if !guard.topics.contains_key(&question.topic_id) {
            return Err(StorageError::NotFound);
        }
        let id = QuestionId::new(guard.next_id());
        let mut options = Vec::with_capacity(question.options.len());
        for (text, is_correct) in question.options {
            options.push(QuestionOption {
                id: OptionId::new(guard.next_id()),
                question_id: id,
                text,
                is_correct,
            });
        }
        let stored = Question {
            id,
            topic_id: question.topic_id,
            text: question.text,
            options,
        };
        guard.questions.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError> {
        Ok(self.lock()?.questions.get(&id).cloned())
    }

    async fn get_option(&self, id: OptionId) -> Result<Option<QuestionOption>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .questions
            .values()
            .find_map(|q| q.option(id))
            .cloned())
    }

    async fn questions_for_topic(&self, topic_id: TopicId) -> Result<Vec<Question>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .questions
            .values()
            .filter(|q| q.topic_id == topic_id)
            .cloned()
            .collect())
    }

    async fn delete_question(&self, id: QuestionId) -> Result<bool, StorageError> {
        Ok(self.lock()?.remove_question(id))
    }
}

#[async_trait]
impl AnswerRepository for InMemoryRepository {
    async fn upsert_answer(&self, answer: &UserAnswer) -> Result<UpsertOutcome, StorageError> {
        let mut guard = self.lock()?;
        let option_exists = guard
            .questions
            .values()
            .any(|q| q.option(answer.selected_option_id).is_some());
        if !guard.users.contains_key(&answer.user_id)
            || !guard.questions.contains_key(&answer.question_id)
            || !option_exists
        {
            return Err(StorageError::NotFound);
        }

        let key = (answer.user_id, answer.question_id);
        if let Some(existing) = guard.answers.get_mut(&key) {
            existing.selected_option_id = answer.selected_option_id;
            existing.is_correct = answer.is_correct;
            return Ok(UpsertOutcome::Updated);
        }
        guard.answers.insert(key, answer.clone());
        Ok(UpsertOutcome::Inserted)
    }

    async fn get_answer(
        &self,
        user_id: UserId,
        question_id: QuestionId,
    ) -> Result<Option<UserAnswer>, StorageError> {
        Ok(self.lock()?.answers.get(&(user_id, question_id)).cloned())
    }

    async fn answered_question_ids(
        &self,
        user_id: UserId,
        topic_id: TopicId,
    ) -> Result<Vec<QuestionId>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .questions
            .values()
            .filter(|q| q.topic_id == topic_id && guard.answers.contains_key(&(user_id, q.id)))
            .map(|q| q.id)
            .collect())
    }

    async fn topic_tallies(&self, user_id: UserId) -> Result<Vec<TopicTally>, StorageError> {
        let guard = self.lock()?;
        let mut tallies = Vec::with_capacity(guard.topics.len());
        for topic in guard.topics.values() {
            let mut tally = TopicTally {
                topic_id: topic.id(),
                name: topic.name().to_string(),
                total_questions: 0,
                answered: 0,
                correct: 0,
            };
            for question in guard.questions.values().filter(|q| q.topic_id == topic.id()) {
                tally.total_questions += 1;
                if let Some(answer) = guard.answers.get(&(user_id, question.id)) {
                    tally.answered += 1;
                    if answer.is_correct {
                        tally.correct += 1;
                    }
                }
            }
            tallies.push(tally);
        }
        Ok(tallies)
    }
}

/// Bundles the repositories behind trait objects so backends can be swapped.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
    pub topics: Arc<dyn TopicRepository>,
    pub questions: Arc<dyn QuestionRepository>,
    pub answers: Arc<dyn AnswerRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            users: Arc::new(repo.clone()),
            topics: Arc::new(repo.clone()),
            questions: Arc::new(repo.clone()),
            answers: Arc::new(repo),
        }
    }
}
