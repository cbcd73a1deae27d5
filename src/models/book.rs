//! Book model: the abstract title, not a physical copy

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::genre::Genre;

/// Number of genre names shown in compact listings
const DISPLAY_GENRE_COUNT: usize = 3;

/// Full book model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    /// Cleared when the author is deleted
    pub author_id: Option<i32>,
    /// Cleared when the language is deleted
    pub language_id: Option<i32>,
    // Loaded from book_genres, not a column
    #[sqlx(skip)]
    #[serde(default)]
    pub genres: Vec<Genre>,
}

impl Book {
    /// Listing order: case-insensitive title in code point order, then id
    pub fn title_key(&self) -> (String, i32) {
        (self.title.to_lowercase(), self.id)
    }

    /// Comma separated names of the first few genres
    pub fn display_genre(&self) -> String {
        self.genres
            .iter()
            .take(DISPLAY_GENRE_COUNT)
            .map(|g| g.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,
    #[validate(length(max = 1000, message = "Summary cannot exceed 1000 characters"))]
    #[serde(default)]
    pub summary: String,
    /// 13 character ISBN
    #[validate(length(equal = 13, message = "ISBN must be exactly 13 characters"))]
    pub isbn: String,
    pub author_id: Option<i32>,
    pub language_id: Option<i32>,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
}

/// Update book request. `genre_ids`, when present, replaces the genre set.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 1000, message = "Summary cannot exceed 1000 characters"))]
    pub summary: Option<String>,
    #[validate(length(equal = 13, message = "ISBN must be exactly 13 characters"))]
    pub isbn: Option<String>,
    pub author_id: Option<i32>,
    pub language_id: Option<i32>,
    pub genre_ids: Option<Vec<i32>>,
}

impl Book {
    /// Apply the scalar fields of an update request; genres are relinked by the store
    pub fn apply(&mut self, data: &UpdateBook) {
        if let Some(ref v) = data.title {
            self.title = v.clone();
        }
        if let Some(ref v) = data.summary {
            self.summary = v.clone();
        }
        if let Some(ref v) = data.isbn {
            self.isbn = v.clone();
        }
        if data.author_id.is_some() {
            self.author_id = data.author_id;
        }
        if data.language_id.is_some() {
            self.language_id = data.language_id;
        }
    }
}

/// Book search parameters
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Case-insensitive substring of the title
    pub title: Option<String>,
    /// Maximum number of books returned
    pub limit: Option<i64>,
}

impl BookQuery {
    pub fn matches(&self, book: &Book) -> bool {
        match self.title {
            Some(ref needle) => book.title.to_lowercase().contains(&needle.to_lowercase()),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book_with_genres(names: &[&str]) -> Book {
        Book {
            id: 1,
            title: "War and Peace".to_string(),
            summary: String::new(),
            isbn: "9780140447934".to_string(),
            author_id: None,
            language_id: None,
            genres: names
                .iter()
                .enumerate()
                .map(|(i, n)| Genre { id: i as i32 + 1, name: n.to_string() })
                .collect(),
        }
    }

    #[test]
    fn test_display_genre_keeps_first_three() {
        let book = book_with_genres(&["Novel", "History", "War", "Romance"]);
        assert_eq!(book.display_genre(), "Novel, History, War");
        assert_eq!(book_with_genres(&[]).display_genre(), "");
    }

    #[test]
    fn test_title_filter_is_case_insensitive() {
        let book = book_with_genres(&[]);
        let query = BookQuery { title: Some("WAR".to_string()), limit: None };
        assert!(query.matches(&book));
        let query = BookQuery { title: Some("peace and".to_string()), limit: None };
        assert!(!query.matches(&book));
        assert!(BookQuery::default().matches(&book));
    }

    #[test]
    fn test_isbn_length_validated() {
        let mut input = CreateBook {
            title: "Dune".to_string(),
            summary: String::new(),
            isbn: "9780441013593".to_string(),
            author_id: None,
            language_id: None,
            genre_ids: vec![],
        };
        assert!(input.validate().is_ok());
        input.isbn = "0441013597".to_string();
        assert!(input.validate().is_err());
    }
}
