//! Genre persistence on PostgreSQL

use async_trait::async_trait;

use super::{GenreStore, PgRepository};
use crate::{
    error::{AppError, AppResult},
    models::genre::{Genre, GenreInput},
};

#[async_trait]
impl GenreStore for PgRepository {
    async fn create_genre(&self, data: &GenreInput) -> AppResult<Genre> {
        let row = sqlx::query_as::<_, Genre>("INSERT INTO genres (name) VALUES ($1) RETURNING *")
            .bind(&data.name)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_genre(&self, id: i32) -> AppResult<Genre> {
        sqlx::query_as::<_, Genre>("SELECT * FROM genres WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", id)))
    }

    async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        let rows = sqlx::query_as::<_, Genre>("SELECT * FROM genres ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn rename_genre(&self, id: i32, data: &GenreInput) -> AppResult<Genre> {
        sqlx::query_as::<_, Genre>("UPDATE genres SET name = $1 WHERE id = $2 RETURNING *")
            .bind(&data.name)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", id)))
    }

    async fn delete_genre(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM book_genres WHERE genre_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM genres WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Genre {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn count_genres(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM genres")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
