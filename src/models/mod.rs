//! Data models for the catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;
pub mod language;
pub mod stats;
pub mod user;

// Re-export commonly used types
pub use author::Author;
pub use book::Book;
pub use book_instance::{BookInstance, LoanStatus};
pub use genre::Genre;
pub use language::Language;
pub use stats::{CatalogSummary, EntityKind};
pub use user::{Capabilities, Capability, UserClaims};
