use quiz_core::model::{OptionId, Question, QuestionId, QuestionOption, TopicId};

use super::SqliteRepository;
use super::mapping::{
    QUESTION_WITH_OPTIONS_SELECT, assemble_questions, bool_to_i64, db_err, id_i64,
    map_option_row, option_id_from_i64, question_id_from_i64,
};
use crate::repository::{NewQuestionRecord, QuestionRepository, StorageError};

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn insert_question(
        &self,
        question: NewQuestionRecord,
    ) -> Result<Question, StorageError> {
        let topic_id = id_i64("topic_id", question.topic_id.value())?;

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let res = sqlx::query("INSERT INTO questions (topic_id, text) VALUES (?1, ?2)")
            .bind(topic_id)
            .bind(question.text.as_str())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        let question_row_id = res.last_insert_rowid();
        let question_id = question_id_from_i64(question_row_id)?;

        let mut options = Vec::with_capacity(question.options.len());
        for (text, is_correct) in question.options {
            let res = sqlx::query(
                r"
                INSERT INTO options (question_id, text, is_correct)
                VALUES (?1, ?2, ?3)
                ",
            )
            .bind(question_row_id)
            .bind(text.as_str())
            .bind(bool_to_i64(is_correct))
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

            options.push(QuestionOption {
                id: option_id_from_i64(res.last_insert_rowid())?,
                question_id,
                text,
                is_correct,
            });
        }

        tx.commit().await.map_err(db_err)?;

        Ok(Question {
            id: question_id,
            topic_id: question.topic_id,
            text: question.text,
            options,
        })
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError> {
        let sql = format!("{QUESTION_WITH_OPTIONS_SELECT} WHERE q.id = ?1 ORDER BY o.id ASC");
        let rows = sqlx::query(&sql)
            .bind(id_i64("question_id", id.value())?)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(assemble_questions(&rows)?.into_iter().next())
    }

    async fn get_option(&self, id: OptionId) -> Result<Option<QuestionOption>, StorageError> {
        let row = sqlx::query("SELECT id, question_id, text, is_correct FROM options WHERE id = ?1")
            .bind(id_i64("option_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_option_row).transpose()
    }

    async fn questions_for_topic(&self, topic_id: TopicId) -> Result<Vec<Question>, StorageError> {
        let sql = format!(
            "{QUESTION_WITH_OPTIONS_SELECT} WHERE q.topic_id = ?1 ORDER BY q.id ASC, o.id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(id_i64("topic_id", topic_id.value())?)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        assemble_questions(&rows)
    }

    async fn delete_question(&self, id: QuestionId) -> Result<bool, StorageError> {
        let res = sqlx::query("DELETE FROM questions WHERE id = ?1")
            .bind(id_i64("question_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(res.rows_affected() > 0)
    }
}
