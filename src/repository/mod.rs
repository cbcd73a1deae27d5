//! Repository layer: catalog store traits and their backends
//!
//! Every delete applies the catalog's referential policy explicitly:
//! - author or language deleted: referencing books keep existing with the field cleared
//! - genre deleted: removed from every book's genre set
//! - book deleted: referencing copies keep existing with `book_id` cleared

pub mod authors;
pub mod books;
pub mod genres;
pub mod instances;
pub mod languages;
pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        author::{Author, CreateAuthor, UpdateAuthor},
        book::{Book, BookQuery, CreateBook, UpdateBook},
        book_instance::{BookInstance, CreateBookInstance, LoanStatus, UpdateBookInstance},
        genre::{Genre, GenreInput},
        language::{Language, LanguageInput},
    },
};

pub use memory::MemoryRepository;

#[async_trait]
pub trait AuthorStore: Send + Sync {
    async fn create_author(&self, data: &CreateAuthor) -> AppResult<Author>;
    async fn get_author(&self, id: i32) -> AppResult<Author>;
    /// Ordered by last name, then first name
    async fn list_authors(&self) -> AppResult<Vec<Author>>;
    async fn update_author(&self, id: i32, data: &UpdateAuthor) -> AppResult<Author>;
    /// Delete the author and clear `author_id` on its books
    async fn delete_author(&self, id: i32) -> AppResult<()>;
    async fn count_authors(&self) -> AppResult<i64>;
}

#[async_trait]
pub trait GenreStore: Send + Sync {
    async fn create_genre(&self, data: &GenreInput) -> AppResult<Genre>;
    async fn get_genre(&self, id: i32) -> AppResult<Genre>;
    async fn list_genres(&self) -> AppResult<Vec<Genre>>;
    async fn rename_genre(&self, id: i32, data: &GenreInput) -> AppResult<Genre>;
    /// Delete the genre and unlink it from every book
    async fn delete_genre(&self, id: i32) -> AppResult<()>;
    async fn count_genres(&self) -> AppResult<i64>;
}

#[async_trait]
pub trait LanguageStore: Send + Sync {
    async fn create_language(&self, data: &LanguageInput) -> AppResult<Language>;
    async fn get_language(&self, id: i32) -> AppResult<Language>;
    async fn list_languages(&self) -> AppResult<Vec<Language>>;
    async fn rename_language(&self, id: i32, data: &LanguageInput) -> AppResult<Language>;
    /// Delete the language and clear `language_id` on its books
    async fn delete_language(&self, id: i32) -> AppResult<()>;
    async fn count_languages(&self) -> AppResult<i64>;
}

#[async_trait]
pub trait BookStore: Send + Sync {
    async fn create_book(&self, data: &CreateBook) -> AppResult<Book>;
    async fn get_book(&self, id: i32) -> AppResult<Book>;
    /// Ordered by lowercased title, then id
    async fn list_books(&self, query: &BookQuery) -> AppResult<Vec<Book>>;
    async fn update_book(&self, id: i32, data: &UpdateBook) -> AppResult<Book>;
    /// Delete the book, its genre links, and clear `book_id` on its copies
    async fn delete_book(&self, id: i32) -> AppResult<()>;
    async fn count_books(&self) -> AppResult<i64>;
}

/// Physical copies. Every listing uses the due date ordering (nulls last, then id).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InstanceStore: Send + Sync {
    async fn create_instance(&self, data: &CreateBookInstance) -> AppResult<BookInstance>;
    async fn get_instance(&self, id: Uuid) -> AppResult<BookInstance>;
    /// All copies, or the copies of one book
    async fn list_instances(&self, book_id: Option<i32>) -> AppResult<Vec<BookInstance>>;
    /// Never sets `due_back`; a copy leaving OnLoan loses its borrower and due date
    async fn update_instance(&self, id: Uuid, data: &UpdateBookInstance) -> AppResult<BookInstance>;
    async fn delete_instance(&self, id: Uuid) -> AppResult<()>;
    /// All copies, or the copies in one status
    async fn count_instances(&self, status: Option<LoanStatus>) -> AppResult<i64>;
    /// Copies in `status`, optionally restricted to one borrower
    async fn list_instances_with_status(
        &self,
        status: LoanStatus,
        borrower_id: Option<i32>,
    ) -> AppResult<Vec<BookInstance>>;
    /// Atomically set `due_back` of a copy that is still on loan.
    /// Fails with `NotFound` or `InvalidState` without writing.
    async fn renew_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<BookInstance>;
}

/// Full catalog persistence
pub trait CatalogStore: AuthorStore + GenreStore + LanguageStore + BookStore + InstanceStore {}

impl<T> CatalogStore for T where T: AuthorStore + GenreStore + LanguageStore + BookStore + InstanceStore {}

/// PostgreSQL-backed catalog store
#[derive(Clone)]
pub struct PgRepository {
    pub pool: Pool<Postgres>,
}

impl PgRepository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}
