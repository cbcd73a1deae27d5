//! Natural language of a book (e.g. English, French, Japanese)

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Language {
    pub id: i32,
    pub name: String,
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Create or rename a language
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LanguageInput {
    #[validate(length(min = 1, max = 200, message = "Language name must be 1 to 200 characters"))]
    pub name: String,
}
