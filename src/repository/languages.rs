//! Language persistence on PostgreSQL

use async_trait::async_trait;

use super::{LanguageStore, PgRepository};
use crate::{
    error::{AppError, AppResult},
    models::language::{Language, LanguageInput},
};

#[async_trait]
impl LanguageStore for PgRepository {
    async fn create_language(&self, data: &LanguageInput) -> AppResult<Language> {
        let row =
            sqlx::query_as::<_, Language>("INSERT INTO languages (name) VALUES ($1) RETURNING *")
                .bind(&data.name)
                .fetch_one(&self.pool)
                .await?;
        Ok(row)
    }

    async fn get_language(&self, id: i32) -> AppResult<Language> {
        sqlx::query_as::<_, Language>("SELECT * FROM languages WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Language {} not found", id)))
    }

    async fn list_languages(&self) -> AppResult<Vec<Language>> {
        let rows = sqlx::query_as::<_, Language>("SELECT * FROM languages ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn rename_language(&self, id: i32, data: &LanguageInput) -> AppResult<Language> {
        sqlx::query_as::<_, Language>("UPDATE languages SET name = $1 WHERE id = $2 RETURNING *")
            .bind(&data.name)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Language {} not found", id)))
    }

    async fn delete_language(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE books SET language_id = NULL WHERE language_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM languages WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Language {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn count_languages(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM languages")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
