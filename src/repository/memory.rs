//! In-process catalog store
//!
//! Holds the whole catalog behind one `RwLock`. Writers take the lock for
//! the full read-modify-write, so updates of one record are serialized.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AuthorStore, BookStore, GenreStore, InstanceStore, LanguageStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, CreateAuthor, UpdateAuthor},
        book::{Book, BookQuery, CreateBook, UpdateBook},
        book_instance::{
            due_back_order, BookInstance, CreateBookInstance, LoanStatus, UpdateBookInstance,
        },
        genre::{Genre, GenreInput},
        language::{Language, LanguageInput},
    },
};

#[derive(Debug, Default)]
struct Sequences {
    author: i32,
    genre: i32,
    language: i32,
    book: i32,
}

/// Book row plus its ordered genre links
#[derive(Debug, Clone)]
struct BookRecord {
    book: Book,
    genre_ids: Vec<i32>,
}

#[derive(Debug, Default)]
struct MemoryState {
    sequences: Sequences,
    authors: BTreeMap<i32, Author>,
    genres: BTreeMap<i32, Genre>,
    languages: BTreeMap<i32, Language>,
    books: BTreeMap<i32, BookRecord>,
    instances: HashMap<Uuid, BookInstance>,
}

impl MemoryState {
    fn materialize_book(&self, record: &BookRecord) -> Book {
        let mut book = record.book.clone();
        book.genres = record
            .genre_ids
            .iter()
            .filter_map(|id| self.genres.get(id).cloned())
            .collect();
        book
    }

    fn materialize_instance(&self, instance: &BookInstance) -> BookInstance {
        let mut instance = instance.clone();
        instance.book_title = instance
            .book_id
            .and_then(|id| self.books.get(&id))
            .map(|r| r.book.title.clone());
        instance
    }

    fn sorted_instances<'a>(
        &self,
        instances: impl Iterator<Item = &'a BookInstance>,
    ) -> Vec<BookInstance> {
        let mut rows: Vec<BookInstance> = instances.map(|i| self.materialize_instance(i)).collect();
        rows.sort_by(due_back_order);
        rows
    }

    fn instance_mut(&mut self, id: Uuid) -> AppResult<&mut BookInstance> {
        self.instances
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }
}

/// Remove duplicates while keeping first occurrence order
fn dedup_ids(ids: &[i32]) -> Vec<i32> {
    let mut seen = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.contains(id) {
            seen.push(*id);
        }
    }
    seen
}

#[derive(Clone, Default)]
pub struct MemoryRepository {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthorStore for MemoryRepository {
    async fn create_author(&self, data: &CreateAuthor) -> AppResult<Author> {
        let mut state = self.state.write().await;
        state.sequences.author += 1;
        let author = Author {
            id: state.sequences.author,
            first_name: data.first_name.clone(),
            last_name: data.last_name.clone(),
            date_of_birth: data.date_of_birth,
            date_of_death: data.date_of_death,
        };
        state.authors.insert(author.id, author.clone());
        Ok(author)
    }

    async fn get_author(&self, id: i32) -> AppResult<Author> {
        let state = self.state.read().await;
        state
            .authors
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))
    }

    async fn list_authors(&self) -> AppResult<Vec<Author>> {
        let state = self.state.read().await;
        let mut authors: Vec<Author> = state.authors.values().cloned().collect();
        authors.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Ok(authors)
    }

    async fn update_author(&self, id: i32, data: &UpdateAuthor) -> AppResult<Author> {
        let mut state = self.state.write().await;
        let author = state
            .authors
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))?;
        author.apply(data);
        Ok(author.clone())
    }

    async fn delete_author(&self, id: i32) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.authors.remove(&id).is_none() {
            return Err(AppError::NotFound(format!("Author {} not found", id)));
        }
        for record in state.books.values_mut() {
            if record.book.author_id == Some(id) {
                record.book.author_id = None;
            }
        }
        Ok(())
    }

    async fn count_authors(&self) -> AppResult<i64> {
        Ok(self.state.read().await.authors.len() as i64)
    }
}

#[async_trait]
impl GenreStore for MemoryRepository {
    async fn create_genre(&self, data: &GenreInput) -> AppResult<Genre> {
        let mut state = self.state.write().await;
        state.sequences.genre += 1;
        let genre = Genre {
            id: state.sequences.genre,
            name: data.name.clone(),
        };
        state.genres.insert(genre.id, genre.clone());
        Ok(genre)
    }

    async fn get_genre(&self, id: i32) -> AppResult<Genre> {
        let state = self.state.read().await;
        state
            .genres
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", id)))
    }

    async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        let state = self.state.read().await;
        let mut genres: Vec<Genre> = state.genres.values().cloned().collect();
        genres.sort_by(|a, b| (&a.name, a.id).cmp(&(&b.name, b.id)));
        Ok(genres)
    }

    async fn rename_genre(&self, id: i32, data: &GenreInput) -> AppResult<Genre> {
        let mut state = self.state.write().await;
        let genre = state
            .genres
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", id)))?;
        genre.name = data.name.clone();
        Ok(genre.clone())
    }

    async fn delete_genre(&self, id: i32) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.genres.remove(&id).is_none() {
            return Err(AppError::NotFound(format!("Genre {} not found", id)));
        }
        for record in state.books.values_mut() {
            record.genre_ids.retain(|g| *g != id);
        }
        Ok(())
    }

    async fn count_genres(&self) -> AppResult<i64> {
        Ok(self.state.read().await.genres.len() as i64)
    }
}

#[async_trait]
impl LanguageStore for MemoryRepository {
    async fn create_language(&self, data: &LanguageInput) -> AppResult<Language> {
        let mut state = self.state.write().await;
        state.sequences.language += 1;
        let language = Language {
            id: state.sequences.language,
            name: data.name.clone(),
        };
        state.languages.insert(language.id, language.clone());
        Ok(language)
    }

    async fn get_language(&self, id: i32) -> AppResult<Language> {
        let state = self.state.read().await;
        state
            .languages
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Language {} not found", id)))
    }

    async fn list_languages(&self) -> AppResult<Vec<Language>> {
        let state = self.state.read().await;
        let mut languages: Vec<Language> = state.languages.values().cloned().collect();
        languages.sort_by(|a, b| (&a.name, a.id).cmp(&(&b.name, b.id)));
        Ok(languages)
    }

    async fn rename_language(&self, id: i32, data: &LanguageInput) -> AppResult<Language> {
        let mut state = self.state.write().await;
        let language = state
            .languages
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Language {} not found", id)))?;
        language.name = data.name.clone();
        Ok(language.clone())
    }

    async fn delete_language(&self, id: i32) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.languages.remove(&id).is_none() {
            return Err(AppError::NotFound(format!("Language {} not found", id)));
        }
        for record in state.books.values_mut() {
            if record.book.language_id == Some(id) {
                record.book.language_id = None;
            }
        }
        Ok(())
    }

    async fn count_languages(&self) -> AppResult<i64> {
        Ok(self.state.read().await.languages.len() as i64)
    }
}

#[async_trait]
impl BookStore for MemoryRepository {
    async fn create_book(&self, data: &CreateBook) -> AppResult<Book> {
        let mut state = self.state.write().await;
        state.sequences.book += 1;
        let record = BookRecord {
            book: Book {
                id: state.sequences.book,
                title: data.title.clone(),
                summary: data.summary.clone(),
                isbn: data.isbn.clone(),
                author_id: data.author_id,
                language_id: data.language_id,
                genres: Vec::new(),
            },
            genre_ids: dedup_ids(&data.genre_ids),
        };
        let book = state.materialize_book(&record);
        state.books.insert(book.id, record);
        Ok(book)
    }

    async fn get_book(&self, id: i32) -> AppResult<Book> {
        let state = self.state.read().await;
        state
            .books
            .get(&id)
            .map(|r| state.materialize_book(r))
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    async fn list_books(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let state = self.state.read().await;
        let mut books: Vec<Book> = state
            .books
            .values()
            .filter(|r| query.matches(&r.book))
            .map(|r| state.materialize_book(r))
            .collect();
        books.sort_by(|a, b| a.title_key().cmp(&b.title_key()));
        if let Some(limit) = query.limit {
            books.truncate(limit.max(0) as usize);
        }
        Ok(books)
    }

    async fn update_book(&self, id: i32, data: &UpdateBook) -> AppResult<Book> {
        let mut state = self.state.write().await;
        let record = state
            .books
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;
        record.book.apply(data);
        if let Some(ref genre_ids) = data.genre_ids {
            record.genre_ids = dedup_ids(genre_ids);
        }
        let record = record.clone();
        Ok(state.materialize_book(&record))
    }

    async fn delete_book(&self, id: i32) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.books.remove(&id).is_none() {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }
        for instance in state.instances.values_mut() {
            if instance.book_id == Some(id) {
                instance.book_id = None;
            }
        }
        Ok(())
    }

    async fn count_books(&self) -> AppResult<i64> {
        Ok(self.state.read().await.books.len() as i64)
    }
}

#[async_trait]
impl InstanceStore for MemoryRepository {
    async fn create_instance(&self, data: &CreateBookInstance) -> AppResult<BookInstance> {
        let mut state = self.state.write().await;
        let mut instance = BookInstance::from_create(data);
        // v4 collisions are not expected, but an id is never handed out twice
        while state.instances.contains_key(&instance.id) {
            instance.id = Uuid::new_v4();
        }
        state.instances.insert(instance.id, instance.clone());
        Ok(state.materialize_instance(&instance))
    }

    async fn get_instance(&self, id: Uuid) -> AppResult<BookInstance> {
        let state = self.state.read().await;
        state
            .instances
            .get(&id)
            .map(|i| state.materialize_instance(i))
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    async fn list_instances(&self, book_id: Option<i32>) -> AppResult<Vec<BookInstance>> {
        let state = self.state.read().await;
        Ok(state.sorted_instances(
            state
                .instances
                .values()
                .filter(|i| book_id.is_none() || i.book_id == book_id),
        ))
    }

    async fn update_instance(&self, id: Uuid, data: &UpdateBookInstance) -> AppResult<BookInstance> {
        let mut state = self.state.write().await;
        let stored = state.instance_mut(id)?;
        let mut candidate = stored.clone();
        candidate.apply(data);
        candidate.check_consistency().map_err(AppError::Validation)?;
        *stored = candidate.clone();
        Ok(state.materialize_instance(&candidate))
    }

    async fn delete_instance(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.state.write().await;
        state
            .instances
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    async fn count_instances(&self, status: Option<LoanStatus>) -> AppResult<i64> {
        let state = self.state.read().await;
        let count = state
            .instances
            .values()
            .filter(|i| status.map_or(true, |s| i.status == s))
            .count();
        Ok(count as i64)
    }

    async fn list_instances_with_status(
        &self,
        status: LoanStatus,
        borrower_id: Option<i32>,
    ) -> AppResult<Vec<BookInstance>> {
        let state = self.state.read().await;
        Ok(state.sorted_instances(state.instances.values().filter(|i| {
            i.status == status && (borrower_id.is_none() || i.borrower_id == borrower_id)
        })))
    }

    async fn renew_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<BookInstance> {
        let mut state = self.state.write().await;
        let instance = state.instance_mut(id)?;
        if !instance.is_on_loan() {
            return Err(AppError::InvalidState(format!(
                "Book instance {} is not on loan ({})",
                id, instance.status
            )));
        }
        instance.due_back = Some(due_back);
        let instance = instance.clone();
        Ok(state.materialize_instance(&instance))
    }
}
