use quiz_core::model::{QuestionId, TopicId, TopicTally, UserAnswer, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{
    bool_to_i64, count_u32, db_err, id_i64, map_answer_row, question_id_from_i64, ser,
    topic_id_from_i64,
};
use crate::repository::{AnswerRepository, StorageError, UpsertOutcome};

#[async_trait::async_trait]
impl AnswerRepository for SqliteRepository {
    async fn upsert_answer(&self, answer: &UserAnswer) -> Result<UpsertOutcome, StorageError> {
        let user_id = id_i64("user_id", answer.user_id.value())?;
        let question_id = id_i64("question_id", answer.question_id.value())?;
        let option_id = id_i64("option_id", answer.selected_option_id.value())?;

        // Take the write lock up front so overlapping submissions queue on
        // busy_timeout instead of failing to upgrade a read snapshot.
        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(db_err)?;

        let existing = sqlx::query(
            "SELECT 1 FROM user_answers WHERE user_id = ?1 AND question_id = ?2",
        )
        .bind(user_id)
        .bind(question_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        sqlx::query(
            r"
            INSERT INTO user_answers (user_id, question_id, selected_option_id, is_correct, answered_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id, question_id) DO UPDATE SET
                -- answered_at keeps the first submission time
                selected_option_id = excluded.selected_option_id,
                is_correct = excluded.is_correct
            ",
        )
        .bind(user_id)
        .bind(question_id)
        .bind(option_id)
        .bind(bool_to_i64(answer.is_correct))
        .bind(answer.answered_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        Ok(if existing.is_some() {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        })
    }

    async fn get_answer(
        &self,
        user_id: UserId,
        question_id: QuestionId,
    ) -> Result<Option<UserAnswer>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, question_id, selected_option_id, is_correct, answered_at
            FROM user_answers
            WHERE user_id = ?1 AND question_id = ?2
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .bind(id_i64("question_id", question_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_answer_row).transpose()
    }

    async fn answered_question_ids(
        &self,
        user_id: UserId,
        topic_id: TopicId,
    ) -> Result<Vec<QuestionId>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT a.question_id
            FROM user_answers a
            JOIN questions q ON q.id = a.question_id
            WHERE a.user_id = ?1 AND q.topic_id = ?2
            ORDER BY a.question_id ASC
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .bind(id_i64("topic_id", topic_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| question_id_from_i64(row.try_get::<i64, _>("question_id").map_err(ser)?))
            .collect()
    }

    async fn topic_tallies(&self, user_id: UserId) -> Result<Vec<TopicTally>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT
                t.id AS topic_id,
                t.name AS name,
                (SELECT COUNT(*) FROM questions q WHERE q.topic_id = t.id) AS total_questions,
                (
                    SELECT COUNT(*)
                    FROM user_answers a
                    JOIN questions q ON q.id = a.question_id
                    WHERE q.topic_id = t.id AND a.user_id = ?1
                ) AS answered,
                (
                    SELECT COUNT(*)
                    FROM user_answers a
                    JOIN questions q ON q.id = a.question_id
                    WHERE q.topic_id = t.id AND a.user_id = ?1 AND a.is_correct = 1
                ) AS correct
            FROM topics t
            ORDER BY t.id ASC
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(TopicTally {
                topic_id: topic_id_from_i64(row.try_get::<i64, _>("topic_id").map_err(ser)?)?,
                name: row.try_get("name").map_err(ser)?,
                total_questions: count_u32(
                    "total_questions",
                    row.try_get::<i64, _>("total_questions").map_err(ser)?,
                )?,
                answered: count_u32("answered", row.try_get::<i64, _>("answered").map_err(ser)?)?,
                correct: count_u32("correct", row.try_get::<i64, _>("correct").map_err(ser)?)?,
            });
        }
        Ok(out)
    }
}
