//! Book persistence on PostgreSQL

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, Row};

use super::{BookStore, PgRepository};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookQuery, CreateBook, UpdateBook},
        genre::Genre,
    },
};

impl PgRepository {
    /// Genres of each book, in the order they were linked
    async fn books_load_genres(&self, book_ids: &[i32]) -> AppResult<HashMap<i32, Vec<Genre>>> {
        let rows = sqlx::query(
            r#"
            SELECT bg.book_id, g.id, g.name
            FROM book_genres bg
            JOIN genres g ON g.id = bg.genre_id
            WHERE bg.book_id = ANY($1)
            ORDER BY bg.position
            "#,
        )
        .bind(book_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut genres: HashMap<i32, Vec<Genre>> = HashMap::new();
        for row in rows {
            genres.entry(row.get("book_id")).or_default().push(Genre {
                id: row.get("id"),
                name: row.get("name"),
            });
        }
        Ok(genres)
    }

    async fn books_with_genres(&self, mut books: Vec<Book>) -> AppResult<Vec<Book>> {
        let ids: Vec<i32> = books.iter().map(|b| b.id).collect();
        let mut genres = self.books_load_genres(&ids).await?;
        for book in books.iter_mut() {
            book.genres = genres.remove(&book.id).unwrap_or_default();
        }
        Ok(books)
    }
}

/// Replace the genre set of a book
async fn relink_genres(conn: &mut PgConnection, book_id: i32, genre_ids: &[i32]) -> AppResult<()> {
    sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
        .bind(book_id)
        .execute(&mut *conn)
        .await?;

    for genre_id in genre_ids {
        sqlx::query(
            "INSERT INTO book_genres (book_id, genre_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(book_id)
        .bind(genre_id)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl BookStore for PgRepository {
    async fn create_book(&self, data: &CreateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO books (title, summary, isbn, author_id, language_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&data.title)
        .bind(&data.summary)
        .bind(&data.isbn)
        .bind(data.author_id)
        .bind(data.language_id)
        .fetch_one(&mut *tx)
        .await?;

        relink_genres(&mut tx, id, &data.genre_ids).await?;

        tx.commit().await?;
        self.get_book(id).await
    }

    async fn get_book(&self, id: i32) -> AppResult<Book> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;

        let mut books = self.books_with_genres(vec![book]).await?;
        books
            .pop()
            .ok_or_else(|| AppError::Internal("Book lost while loading genres".to_string()))
    }

    async fn list_books(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT * FROM books
            WHERE ($1::text IS NULL OR strpos(lower(title), lower($1)) > 0)
            ORDER BY lower(title) COLLATE "C", id
            LIMIT $2
            "#,
        )
        .bind(&query.title)
        .bind(query.limit)
        .fetch_all(&self.pool)
        .await?;

        self.books_with_genres(books).await
    }

    async fn update_book(&self, id: i32, data: &UpdateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let mut book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;

        book.apply(data);

        sqlx::query(
            r#"
            UPDATE books
            SET title = $1, summary = $2, isbn = $3, author_id = $4, language_id = $5
            WHERE id = $6
            "#,
        )
        .bind(&book.title)
        .bind(&book.summary)
        .bind(&book.isbn)
        .bind(book.author_id)
        .bind(book.language_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if let Some(ref genre_ids) = data.genre_ids {
            relink_genres(&mut tx, id, genre_ids).await?;
        }

        tx.commit().await?;
        self.get_book(id).await
    }

    async fn delete_book(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE book_instances SET book_id = NULL WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn count_books(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
