//! Catalog counters

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Record kinds that can be counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Book,
    Author,
    Genre,
    Language,
    BookInstance,
}

/// Figures shown on the catalog home page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CatalogSummary {
    pub num_books: i64,
    pub num_instances: i64,
    pub num_instances_available: i64,
    pub num_authors: i64,
    pub num_genres: i64,
    pub num_languages: i64,
}
