use quiz_core::model::{Topic, TopicId, TopicName};

use super::SqliteRepository;
use super::mapping::{db_err, id_i64, map_topic_row};
use crate::repository::{StorageError, TopicRepository};

#[async_trait::async_trait]
impl TopicRepository for SqliteRepository {
    async fn get_or_create_topic(&self, name: &TopicName) -> Result<(Topic, bool), StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let res = sqlx::query(
            r"
            INSERT INTO topics (name) VALUES (?1)
            ON CONFLICT(name) DO NOTHING
            ",
        )
        .bind(name.as_str())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        let created = res.rows_affected() == 1;

        let row = sqlx::query("SELECT id, name FROM topics WHERE name = ?1")
            .bind(name.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err)?;
        let topic = map_topic_row(&row)?;

        tx.commit().await.map_err(db_err)?;
        Ok((topic, created))
    }

    async fn get_topic(&self, id: TopicId) -> Result<Option<Topic>, StorageError> {
        let row = sqlx::query("SELECT id, name FROM topics WHERE id = ?1")
            .bind(id_i64("topic_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_topic_row).transpose()
    }

    async fn find_topic_by_name(&self, name: &str) -> Result<Option<Topic>, StorageError> {
        let row = sqlx::query("SELECT id, name FROM topics WHERE name = ?1")
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_topic_row).transpose()
    }

    async fn list_topics(&self) -> Result<Vec<Topic>, StorageError> {
        let rows = sqlx::query("SELECT id, name FROM topics ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter().map(map_topic_row).collect()
    }

    async fn delete_topic(&self, id: TopicId) -> Result<bool, StorageError> {
        let res = sqlx::query("DELETE FROM topics WHERE id = ?1")
            .bind(id_i64("topic_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(res.rows_affected() > 0)
    }
}
