//! Book instance persistence on PostgreSQL

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgConnection;
use uuid::Uuid;

use super::{InstanceStore, PgRepository};
use crate::{
    error::{AppError, AppResult},
    models::book_instance::{BookInstance, CreateBookInstance, LoanStatus, UpdateBookInstance},
};

const INSTANCE_SELECT: &str = r#"
    SELECT bi.id, bi.book_id, bi.imprint, bi.due_back, bi.borrower_id, bi.status,
           b.title AS book_title
    FROM book_instances bi
    LEFT JOIN books b ON b.id = bi.book_id
"#;

const INSTANCE_ORDER: &str = "ORDER BY bi.due_back ASC NULLS LAST, bi.id";

/// Fetch one copy and hold its row lock until the transaction ends
async fn lock_instance(conn: &mut PgConnection, id: Uuid) -> AppResult<BookInstance> {
    let query = format!("{} WHERE bi.id = $1 FOR UPDATE OF bi", INSTANCE_SELECT);
    sqlx::query_as::<_, BookInstance>(&query)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
}

async fn fetch_instance(conn: &mut PgConnection, id: Uuid) -> AppResult<BookInstance> {
    let query = format!("{} WHERE bi.id = $1", INSTANCE_SELECT);
    sqlx::query_as::<_, BookInstance>(&query)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
}

#[async_trait]
impl InstanceStore for PgRepository {
    async fn create_instance(&self, data: &CreateBookInstance) -> AppResult<BookInstance> {
        let instance = BookInstance::from_create(data);
        let mut conn = self.pool.acquire().await?;

        sqlx::query(
            r#"
            INSERT INTO book_instances (id, book_id, imprint, due_back, borrower_id, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(instance.id)
        .bind(instance.book_id)
        .bind(&instance.imprint)
        .bind(instance.due_back)
        .bind(instance.borrower_id)
        .bind(instance.status)
        .execute(&mut *conn)
        .await?;

        fetch_instance(&mut conn, instance.id).await
    }

    async fn get_instance(&self, id: Uuid) -> AppResult<BookInstance> {
        let mut conn = self.pool.acquire().await?;
        fetch_instance(&mut conn, id).await
    }

    async fn list_instances(&self, book_id: Option<i32>) -> AppResult<Vec<BookInstance>> {
        let query = format!(
            "{} WHERE ($1::int IS NULL OR bi.book_id = $1) {}",
            INSTANCE_SELECT, INSTANCE_ORDER
        );
        let rows = sqlx::query_as::<_, BookInstance>(&query)
            .bind(book_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn update_instance(&self, id: Uuid, data: &UpdateBookInstance) -> AppResult<BookInstance> {
        let mut tx = self.pool.begin().await?;

        let mut instance = lock_instance(&mut tx, id).await?;
        instance.apply(data);
        instance.check_consistency().map_err(AppError::Validation)?;

        sqlx::query(
            r#"
            UPDATE book_instances
            SET book_id = $1, imprint = $2, status = $3, borrower_id = $4, due_back = $5
            WHERE id = $6
            "#,
        )
        .bind(instance.book_id)
        .bind(&instance.imprint)
        .bind(instance.status)
        .bind(instance.borrower_id)
        .bind(instance.due_back)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let updated = fetch_instance(&mut tx, id).await?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn delete_instance(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM book_instances WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book instance {} not found", id)));
        }
        Ok(())
    }

    async fn count_instances(&self, status: Option<LoanStatus>) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_instances WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn list_instances_with_status(
        &self,
        status: LoanStatus,
        borrower_id: Option<i32>,
    ) -> AppResult<Vec<BookInstance>> {
        let query = format!(
            "{} WHERE bi.status = $1 AND ($2::int IS NULL OR bi.borrower_id = $2) {}",
            INSTANCE_SELECT, INSTANCE_ORDER
        );
        let rows = sqlx::query_as::<_, BookInstance>(&query)
            .bind(status)
            .bind(borrower_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn renew_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<BookInstance> {
        let mut tx = self.pool.begin().await?;

        // Concurrent renewals of this copy queue on the row lock
        let instance = lock_instance(&mut tx, id).await?;
        if !instance.is_on_loan() {
            return Err(AppError::InvalidState(format!(
                "Book instance {} is not on loan ({})",
                id, instance.status
            )));
        }

        sqlx::query("UPDATE book_instances SET due_back = $1 WHERE id = $2")
            .bind(due_back)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let updated = fetch_instance(&mut tx, id).await?;
        tx.commit().await?;
        Ok(updated)
    }
}
