use quiz_core::model::{User, UserId};

use super::SqliteRepository;
use super::mapping::{db_err, id_i64, map_user_row, user_id_from_i64};
use crate::repository::{NewUserRecord, StorageError, UserRepository};

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn insert_new_user(&self, user: NewUserRecord) -> Result<UserId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO users (name, email, created_at)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(user.name)
        .bind(user.email)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        user_id_from_i64(res.last_insert_rowid())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let row = sqlx::query("SELECT id, name, email, created_at FROM users WHERE id = ?1")
            .bind(id_i64("user_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_user_row).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        // `email` carries COLLATE NOCASE, so `=` is case-insensitive.
        let row = sqlx::query("SELECT id, name, email, created_at FROM users WHERE email = ?1")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_user_row).transpose()
    }
}
