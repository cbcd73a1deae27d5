//! Book API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookQuery, CreateBook, UpdateBook},
        book_instance::BookInstanceView,
    },
};

use super::AuthenticatedUser;

/// Search books by title
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(BookQuery),
    responses(
        (status = 200, description = "Books ordered by title", body = Vec<Book>)
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.list_books(&query).await?;
    Ok(Json(books))
}

/// Get book by ID, genres included
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Copies of a book
#[utoipa::path(
    get,
    path = "/books/{id}/instances",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Copies of the book", body = Vec<BookInstanceView>),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_book_instances(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<BookInstanceView>>> {
    let today = state.services.clock.today();
    let copies = state.services.catalog.list_instances(Some(id)).await?;
    Ok(Json(copies.into_iter().map(|c| c.view(today)).collect()))
}

/// Create book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "Referenced author, language or genre not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let book = state.services.catalog.create_book(&claims, &data).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Update book. A genre list, when given, replaces the current one.
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdateBook>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.update_book(&claims, id, &data).await?;
    Ok(Json(book))
}

/// Delete book. Its copies are kept, detached from any book.
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete_book(&claims, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
