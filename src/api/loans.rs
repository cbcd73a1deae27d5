//! Loan listing and renewal endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{book_instance::BookInstanceView, Capabilities, Capability},
};

use super::AuthenticatedUser;

/// Renewal request
#[derive(Deserialize, ToSchema)]
pub struct RenewRequest {
    /// New due date (YYYY-MM-DD)
    pub due_back: NaiveDate,
}

/// Renewal form: the loan and the dates a renewal may use
#[derive(Serialize, ToSchema)]
pub struct RenewalFormResponse {
    pub instance: BookInstanceView,
    /// Proposed new due date
    pub suggested_due_back: NaiveDate,
    /// Latest accepted due date
    pub latest_due_back: NaiveDate,
    /// Longest renewal in weeks
    pub max_weeks: u32,
}

/// Copies on loan to the current user
#[utoipa::path(
    get,
    path = "/loans/mine",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Borrowed copies, soonest due first", body = Vec<BookInstanceView>),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_my_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BookInstanceView>>> {
    let today = state.services.clock.today();
    let loans = state
        .services
        .availability
        .list_loans_for_user(claims.user_id)
        .await?;
    Ok(Json(loans.into_iter().map(|l| l.view(today)).collect()))
}

/// All copies on loan (librarians)
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Copies on loan, soonest due first", body = Vec<BookInstanceView>),
        (status = 403, description = "Missing can_mark_returned", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_all_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BookInstanceView>>> {
    let today = state.services.clock.today();
    let loans = state.services.availability.list_all_loans(&claims).await?;
    Ok(Json(loans.into_iter().map(|l| l.view(today)).collect()))
}

/// Current loan and suggested renewal date
#[utoipa::path(
    get,
    path = "/instances/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    responses(
        (status = 200, description = "Renewal form", body = RenewalFormResponse),
        (status = 403, description = "Missing can_mark_returned", body = crate::error::ErrorResponse),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Copy is not on loan", body = crate::error::ErrorResponse)
    )
)]
pub async fn renewal_form(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<RenewalFormResponse>> {
    claims.require(Capability::CanMarkReturned)?;
    let Path(id) = path.map_err(|e| AppError::Validation(e.body_text()))?;

    let form = state.services.loans.renewal_form(id, &claims).await?;

    Ok(Json(RenewalFormResponse {
        instance: form.instance.view(form.today),
        suggested_due_back: form.suggested_due_back,
        latest_due_back: form.latest_due_back,
        max_weeks: state.services.loans.policy().max_weeks(),
    }))
}

/// Renew a loan
#[utoipa::path(
    post,
    path = "/instances/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    request_body = RenewRequest,
    responses(
        (status = 200, description = "Loan renewed", body = BookInstanceView),
        (status = 400, description = "Malformed request, date in the past or too far ahead", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing can_mark_returned", body = crate::error::ErrorResponse),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Copy is not on loan", body = crate::error::ErrorResponse)
    )
)]
pub async fn renew_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<RenewRequest>, JsonRejection>,
) -> AppResult<Json<BookInstanceView>> {
    // Capability is checked before the id and body are parsed
    claims.require(Capability::CanMarkReturned)?;
    let Path(id) = path.map_err(|e| AppError::Validation(e.body_text()))?;
    let Json(request) = body.map_err(|e| AppError::Validation(e.body_text()))?;

    let renewed = state
        .services
        .loans
        .renew_loan(id, request.due_back, &claims)
        .await?;

    tracing::info!(
        instance_id = %id,
        librarian_id = claims.user_id,
        due_back = %request.due_back,
        "Loan renewed"
    );

    Ok(Json(renewed.view(state.services.clock.today())))
}
