//! Genre tag (e.g. Science Fiction, French Poetry)

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Create or rename a genre
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct GenreInput {
    #[validate(length(min = 1, max = 200, message = "Genre name must be 1 to 200 characters"))]
    pub name: String,
}
