//! Book instance (physical copy) model and related types

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Availability of a physical copy, stored as a one-letter code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    #[default]
    Maintenance,
    OnLoan,
    Available,
    Reserved,
}

impl LoanStatus {
    pub fn code(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "m",
            LoanStatus::OnLoan => "o",
            LoanStatus::Available => "a",
            LoanStatus::Reserved => "r",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "Maintenance",
            LoanStatus::OnLoan => "On loan",
            LoanStatus::Available => "Available",
            LoanStatus::Reserved => "Reserved",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "m" => Ok(LoanStatus::Maintenance),
            "o" => Ok(LoanStatus::OnLoan),
            "a" => Ok(LoanStatus::Available),
            "r" => Ok(LoanStatus::Reserved),
            _ => Err(format!("Invalid loan status code: {}", s)),
        }
    }
}

// SQLx conversion for LoanStatus
impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.code(), buf)
    }
}

/// Physical copy of a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstance {
    pub id: Uuid,
    /// Cleared when the book is deleted
    pub book_id: Option<i32>,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
    pub status: LoanStatus,
    // Computed field (populated when queried with a JOIN on books)
    #[sqlx(default)]
    #[serde(default)]
    pub book_title: Option<String>,
}

impl BookInstance {
    /// True iff the copy has a due date strictly before `today`
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        matches!(self.due_back, Some(due) if due < today)
    }

    pub fn is_on_loan(&self) -> bool {
        self.status == LoanStatus::OnLoan
    }

    /// A copy on loan must name its borrower and due date
    pub fn check_consistency(&self) -> Result<(), String> {
        if self.is_on_loan() && (self.borrower_id.is_none() || self.due_back.is_none()) {
            return Err("A copy on loan requires a borrower and a due date".to_string());
        }
        Ok(())
    }

    pub fn view(self, today: NaiveDate) -> BookInstanceView {
        let is_overdue = self.is_overdue(today);
        BookInstanceView {
            id: self.id,
            book_id: self.book_id,
            book_title: self.book_title,
            imprint: self.imprint,
            due_back: self.due_back,
            borrower_id: self.borrower_id,
            status: self.status,
            is_overdue,
        }
    }
}

impl std::fmt::Display for BookInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.book_title {
            Some(ref title) => write!(f, "{} ({})", self.id, title),
            None => write!(f, "{}", self.id),
        }
    }
}

/// Default ordering of copies: due date ascending, undated copies last,
/// then id so that equal dates still sort deterministically.
pub fn due_back_order(a: &BookInstance, b: &BookInstance) -> Ordering {
    let by_due = match (a.due_back, b.due_back) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_due.then_with(|| a.id.cmp(&b.id))
}

/// Book instance as returned by the API
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookInstanceView {
    pub id: Uuid,
    pub book_id: Option<i32>,
    pub book_title: Option<String>,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
    pub status: LoanStatus,
    pub is_overdue: bool,
}

/// Create book instance request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBookInstance {
    pub book_id: Option<i32>,
    #[validate(length(min = 1, max = 200, message = "Imprint must be 1 to 200 characters"))]
    pub imprint: String,
    /// Defaults to maintenance
    #[serde(default)]
    pub status: LoanStatus,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
}

/// Update book instance request. The due date is only changed by renewals.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBookInstance {
    pub book_id: Option<i32>,
    #[validate(length(min = 1, max = 200, message = "Imprint must be 1 to 200 characters"))]
    pub imprint: Option<String>,
    pub status: Option<LoanStatus>,
    pub borrower_id: Option<i32>,
}

impl BookInstance {
    /// New copy with a freshly generated identifier
    pub fn from_create(data: &CreateBookInstance) -> Self {
        Self {
            id: Uuid::new_v4(),
            book_id: data.book_id,
            imprint: data.imprint.clone(),
            due_back: data.due_back,
            borrower_id: data.borrower_id,
            status: data.status,
            book_title: None,
        }
    }

    /// Apply the fields present in an update request
    pub fn apply(&mut self, data: &UpdateBookInstance) {
        if data.book_id.is_some() {
            self.book_id = data.book_id;
        }
        if let Some(ref imprint) = data.imprint {
            self.imprint = imprint.clone();
        }
        if let Some(status) = data.status {
            self.status = status;
        }
        if data.borrower_id.is_some() {
            self.borrower_id = data.borrower_id;
        }
        // Leaving the loan returns the copy: no borrower, no due date
        if !self.is_on_loan() {
            self.borrower_id = None;
            self.due_back = None;
        }
    }
}
