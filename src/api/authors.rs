//! Author API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::author::{Author, CreateAuthor, UpdateAuthor},
};

use super::AuthenticatedUser;

/// List authors ordered by last name, then first name
#[utoipa::path(
    get,
    path = "/authors",
    tag = "authors",
    responses(
        (status = 200, description = "Author list", body = Vec<Author>)
    )
)]
pub async fn list_authors(State(state): State<crate::AppState>) -> AppResult<Json<Vec<Author>>> {
    let authors = state.services.catalog.list_authors().await?;
    Ok(Json(authors))
}

/// Get author by ID
#[utoipa::path(
    get,
    path = "/authors/{id}",
    tag = "authors",
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author details", body = Author),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_author(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Author>> {
    let author = state.services.catalog.get_author(id).await?;
    Ok(Json(author))
}

/// Create author
#[utoipa::path(
    post,
    path = "/authors",
    tag = "authors",
    security(("bearer_auth" = [])),
    request_body = CreateAuthor,
    responses(
        (status = 201, description = "Author created", body = Author),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 403, description = "Catalog management not allowed", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_author(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateAuthor>,
) -> AppResult<(StatusCode, Json<Author>)> {
    let author = state.services.catalog.create_author(&claims, &data).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

/// Update author
#[utoipa::path(
    put,
    path = "/authors/{id}",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    request_body = UpdateAuthor,
    responses(
        (status = 200, description = "Author updated", body = Author),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_author(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdateAuthor>,
) -> AppResult<Json<Author>> {
    let author = state.services.catalog.update_author(&claims, id, &data).await?;
    Ok(Json(author))
}

/// Delete author. Books keep existing without an author.
#[utoipa::path(
    delete,
    path = "/authors/{id}",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 204, description = "Author deleted"),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_author(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete_author(&claims, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
