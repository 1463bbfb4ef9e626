use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::answer_service::AnswerService;
use crate::error::AppServicesError;
use crate::progress_service::ProgressService;
use crate::question_service::QuestionService;
use crate::user_service::UserService;

/// Assembles the quiz services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    users: Arc<UserService>,
    questions: Arc<QuestionService>,
    answers: Arc<AnswerService>,
    progress: Arc<ProgressService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage, running migrations first.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock))
    }

    /// Build services over in-memory storage.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(&Storage::in_memory(), clock)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock) -> Self {
        let users = Arc::new(UserService::new(clock, Arc::clone(&storage.users)));
        let questions = Arc::new(QuestionService::new(
            Arc::clone(&storage.users),
            Arc::clone(&storage.topics),
            Arc::clone(&storage.questions),
            Arc::clone(&storage.answers),
        ));
        let answers = Arc::new(AnswerService::new(
            clock,
            Arc::clone(&storage.users),
            Arc::clone(&storage.questions),
            Arc::clone(&storage.answers),
        ));
        let progress = Arc::new(ProgressService::new(
            Arc::clone(&storage.users),
            Arc::clone(&storage.answers),
        ));

        Self {
            users,
            questions,
            answers,
            progress,
        }
    }

    #[must_use]
    pub fn users(&self) -> Arc<UserService> {
        Arc::clone(&self.users)
    }

    #[must_use]
    pub fn questions(&self) -> Arc<QuestionService> {
        Arc::clone(&self.questions)
    }

    #[must_use]
    pub fn answers(&self) -> Arc<AnswerService> {
        Arc::clone(&self.answers)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use quiz_core::model::{OptionDraft, QuestionDraft};
    use quiz_core::time::fixed_clock;

    #[tokio::test]
    async fn services_share_one_backend() {
        let app = AppServices::in_memory(fixed_clock());
        let user = app
            .users()
            .register_user("Ana", "ana@example.com")
            .await
            .unwrap();
        let created = app
            .questions()
            .create_question(QuestionDraft {
                topic: "React".into(),
                text: "Hooks start with?".into(),
                options: vec![OptionDraft::new("use", true), OptionDraft::new("get", false)],
            })
            .await
            .unwrap();

        let views = app
            .questions()
            .list_questions("React", Some(user.id()))
            .await
            .unwrap();
        let option = views[0].options[0].id;
        let result = app
            .answers()
            .submit_answer(user.id(), created.question_id, option)
            .await
            .unwrap();
        assert!(result.is_correct);

        let report = app.progress().get_progress(user.id()).await.unwrap();
        assert_eq!(report.progress[0].breakdown(), Some((1, 0)));
    }
}
