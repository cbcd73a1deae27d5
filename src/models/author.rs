//! Author model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Full author model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl Author {
    /// Listing order: last name, then first name
    pub fn sort_key(&self) -> (&str, &str, i32) {
        (&self.last_name, &self.first_name, self.id)
    }
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

/// Create author request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAuthor {
    #[validate(length(min = 1, max = 100, message = "First name must be 1 to 100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name must be 1 to 100 characters"))]
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

/// Update author request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAuthor {
    #[validate(length(min = 1, max = 100, message = "First name must be 1 to 100 characters"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Last name must be 1 to 100 characters"))]
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl Author {
    /// Apply the fields present in an update request
    pub fn apply(&mut self, data: &UpdateAuthor) {
        if let Some(ref v) = data.first_name {
            self.first_name = v.clone();
        }
        if let Some(ref v) = data.last_name {
            self.last_name = v.clone();
        }
        if data.date_of_birth.is_some() {
            self.date_of_birth = data.date_of_birth;
        }
        if data.date_of_death.is_some() {
            self.date_of_death = data.date_of_death;
        }
    }
}
