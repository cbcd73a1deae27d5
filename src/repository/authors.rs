//! Author persistence on PostgreSQL

use async_trait::async_trait;

use super::{AuthorStore, PgRepository};
use crate::{
    error::{AppError, AppResult},
    models::author::{Author, CreateAuthor, UpdateAuthor},
};

#[async_trait]
impl AuthorStore for PgRepository {
    async fn create_author(&self, data: &CreateAuthor) -> AppResult<Author> {
        let row = sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (first_name, last_name, date_of_birth, date_of_death)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(data.date_of_birth)
        .bind(data.date_of_death)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_author(&self, id: i32) -> AppResult<Author> {
        sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))
    }

    async fn list_authors(&self) -> AppResult<Vec<Author>> {
        let rows = sqlx::query_as::<_, Author>(
            "SELECT * FROM authors ORDER BY last_name, first_name, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn update_author(&self, id: i32, data: &UpdateAuthor) -> AppResult<Author> {
        let mut tx = self.pool.begin().await?;

        let mut author = sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))?;

        author.apply(data);

        let updated = sqlx::query_as::<_, Author>(
            r#"
            UPDATE authors
            SET first_name = $1, last_name = $2, date_of_birth = $3, date_of_death = $4
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&author.first_name)
        .bind(&author.last_name)
        .bind(author.date_of_birth)
        .bind(author.date_of_death)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn delete_author(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE books SET author_id = NULL WHERE author_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Author {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn count_authors(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
