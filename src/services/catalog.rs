//! Catalog management service

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, CreateAuthor, UpdateAuthor},
        book::{Book, BookQuery, CreateBook, UpdateBook},
        book_instance::{BookInstance, CreateBookInstance, UpdateBookInstance},
        genre::{Genre, GenreInput},
        language::{Language, LanguageInput},
        Capabilities, Capability,
    },
    repository::{AuthorStore, BookStore, CatalogStore, GenreStore, InstanceStore, LanguageStore},
};

/// Upper bound on a single book listing
const MAX_BOOK_LIMIT: i64 = 500;

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Referenced author, language and genres must exist
    async fn check_book_references(
        &self,
        author_id: Option<i32>,
        language_id: Option<i32>,
        genre_ids: &[i32],
    ) -> AppResult<()> {
        if let Some(id) = author_id {
            self.store.get_author(id).await?;
        }
        if let Some(id) = language_id {
            self.store.get_language(id).await?;
        }
        for id in genre_ids {
            self.store.get_genre(*id).await?;
        }
        Ok(())
    }

    // Authors

    pub async fn list_authors(&self) -> AppResult<Vec<Author>> {
        self.store.list_authors().await
    }

    pub async fn get_author(&self, id: i32) -> AppResult<Author> {
        self.store.get_author(id).await
    }

    pub async fn create_author(&self, user: &dyn Capabilities, data: &CreateAuthor) -> AppResult<Author> {
        user.require(Capability::CanManageCatalog)?;
        data.validate()?;
        self.store.create_author(data).await
    }

    pub async fn update_author(
        &self,
        user: &dyn Capabilities,
        id: i32,
        data: &UpdateAuthor,
    ) -> AppResult<Author> {
        user.require(Capability::CanManageCatalog)?;
        data.validate()?;
        self.store.update_author(id, data).await
    }

    pub async fn delete_author(&self, user: &dyn Capabilities, id: i32) -> AppResult<()> {
        user.require(Capability::CanManageCatalog)?;
        self.store.delete_author(id).await?;
        tracing::info!(author_id = id, user_id = user.user_id(), "Author deleted, books detached");
        Ok(())
    }

    // Genres

    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.store.list_genres().await
    }

    pub async fn get_genre(&self, id: i32) -> AppResult<Genre> {
        self.store.get_genre(id).await
    }

    pub async fn create_genre(&self, user: &dyn Capabilities, data: &GenreInput) -> AppResult<Genre> {
        user.require(Capability::CanManageCatalog)?;
        data.validate()?;
        self.store.create_genre(data).await
    }

    pub async fn rename_genre(&self, user: &dyn Capabilities, id: i32, data: &GenreInput) -> AppResult<Genre> {
        user.require(Capability::CanManageCatalog)?;
        data.validate()?;
        self.store.rename_genre(id, data).await
    }

    pub async fn delete_genre(&self, user: &dyn Capabilities, id: i32) -> AppResult<()> {
        user.require(Capability::CanManageCatalog)?;
        self.store.delete_genre(id).await?;
        tracing::info!(genre_id = id, user_id = user.user_id(), "Genre deleted");
        Ok(())
    }

    // Languages

    pub async fn list_languages(&self) -> AppResult<Vec<Language>> {
        self.store.list_languages().await
    }

    pub async fn get_language(&self, id: i32) -> AppResult<Language> {
        self.store.get_language(id).await
    }

    pub async fn create_language(&self, user: &dyn Capabilities, data: &LanguageInput) -> AppResult<Language> {
        user.require(Capability::CanManageCatalog)?;
        data.validate()?;
        self.store.create_language(data).await
    }

    pub async fn rename_language(
        &self,
        user: &dyn Capabilities,
        id: i32,
        data: &LanguageInput,
    ) -> AppResult<Language> {
        user.require(Capability::CanManageCatalog)?;
        data.validate()?;
        self.store.rename_language(id, data).await
    }

    pub async fn delete_language(&self, user: &dyn Capabilities, id: i32) -> AppResult<()> {
        user.require(Capability::CanManageCatalog)?;
        self.store.delete_language(id).await?;
        tracing::info!(language_id = id, user_id = user.user_id(), "Language deleted, books detached");
        Ok(())
    }

    // Books

    /// Search books by title
    pub async fn list_books(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let query = BookQuery {
            title: query.title.clone().filter(|t| !t.trim().is_empty()),
            limit: Some(query.limit.unwrap_or(MAX_BOOK_LIMIT).clamp(0, MAX_BOOK_LIMIT)),
        };
        self.store.list_books(&query).await
    }

    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.store.get_book(id).await
    }

    pub async fn create_book(&self, user: &dyn Capabilities, data: &CreateBook) -> AppResult<Book> {
        user.require(Capability::CanManageCatalog)?;
        data.validate()?;
        self.check_book_references(data.author_id, data.language_id, &data.genre_ids)
            .await?;
        self.store.create_book(data).await
    }

    pub async fn update_book(&self, user: &dyn Capabilities, id: i32, data: &UpdateBook) -> AppResult<Book> {
        user.require(Capability::CanManageCatalog)?;
        data.validate()?;
        self.check_book_references(
            data.author_id,
            data.language_id,
            data.genre_ids.as_deref().unwrap_or_default(),
        )
        .await?;
        self.store.update_book(id, data).await
    }

    pub async fn delete_book(&self, user: &dyn Capabilities, id: i32) -> AppResult<()> {
        user.require(Capability::CanManageCatalog)?;
        self.store.delete_book(id).await?;
        tracing::info!(book_id = id, user_id = user.user_id(), "Book deleted, copies detached");
        Ok(())
    }

    // Book instances

    /// All copies, or the copies of one book
    pub async fn list_instances(&self, book_id: Option<i32>) -> AppResult<Vec<BookInstance>> {
        if let Some(id) = book_id {
            self.store.get_book(id).await?;
        }
        self.store.list_instances(book_id).await
    }

    pub async fn get_instance(&self, id: Uuid) -> AppResult<BookInstance> {
        self.store.get_instance(id).await
    }

    pub async fn create_instance(
        &self,
        user: &dyn Capabilities,
        data: &CreateBookInstance,
    ) -> AppResult<BookInstance> {
        user.require(Capability::CanManageCatalog)?;
        data.validate()?;
        BookInstance::from_create(data)
            .check_consistency()
            .map_err(AppError::Validation)?;
        if let Some(id) = data.book_id {
            self.store.get_book(id).await?;
        }
        self.store.create_instance(data).await
    }

    pub async fn update_instance(
        &self,
        user: &dyn Capabilities,
        id: Uuid,
        data: &UpdateBookInstance,
    ) -> AppResult<BookInstance> {
        user.require(Capability::CanManageCatalog)?;
        data.validate()?;
        if let Some(book_id) = data.book_id {
            self.store.get_book(book_id).await?;
        }
        self.store.update_instance(id, data).await
    }

    pub async fn delete_instance(&self, user: &dyn Capabilities, id: Uuid) -> AppResult<()> {
        user.require(Capability::CanManageCatalog)?;
        self.store.delete_instance(id).await?;
        tracing::info!(instance_id = %id, user_id = user.user_id(), "Book instance deleted");
        Ok(())
    }
}
