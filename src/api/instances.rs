//! Book instance (copy) API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::book_instance::{BookInstanceView, CreateBookInstance, UpdateBookInstance},
};

use super::AuthenticatedUser;

/// List all copies, soonest due first
#[utoipa::path(
    get,
    path = "/instances",
    tag = "instances",
    responses(
        (status = 200, description = "Copy list", body = Vec<BookInstanceView>)
    )
)]
pub async fn list_instances(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<BookInstanceView>>> {
    let today = state.services.clock.today();
    let copies = state.services.catalog.list_instances(None).await?;
    Ok(Json(copies.into_iter().map(|c| c.view(today)).collect()))
}

/// Get copy by ID
#[utoipa::path(
    get,
    path = "/instances/{id}",
    tag = "instances",
    params(("id" = Uuid, Path, description = "Book instance ID")),
    responses(
        (status = 200, description = "Copy details", body = BookInstanceView),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_instance(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookInstanceView>> {
    let copy = state.services.catalog.get_instance(id).await?;
    Ok(Json(copy.view(state.services.clock.today())))
}

/// Register a copy. Status defaults to maintenance.
#[utoipa::path(
    post,
    path = "/instances",
    tag = "instances",
    security(("bearer_auth" = [])),
    request_body = CreateBookInstance,
    responses(
        (status = 201, description = "Copy created", body = BookInstanceView),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateBookInstance>,
) -> AppResult<(StatusCode, Json<BookInstanceView>)> {
    let copy = state.services.catalog.create_instance(&claims, &data).await?;
    Ok((StatusCode::CREATED, Json(copy.view(state.services.clock.today()))))
}

/// Update copy
#[utoipa::path(
    put,
    path = "/instances/{id}",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    request_body = UpdateBookInstance,
    responses(
        (status = 200, description = "Copy updated", body = BookInstanceView),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateBookInstance>,
) -> AppResult<Json<BookInstanceView>> {
    let copy = state.services.catalog.update_instance(&claims, id, &data).await?;
    Ok(Json(copy.view(state.services.clock.today())))
}

/// Delete copy
#[utoipa::path(
    delete,
    path = "/instances/{id}",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    responses(
        (status = 204, description = "Copy deleted"),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete_instance(&claims, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
