//! Genre and language API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        genre::{Genre, GenreInput},
        language::{Language, LanguageInput},
    },
};

use super::AuthenticatedUser;

/// List genres by name
#[utoipa::path(
    get,
    path = "/genres",
    tag = "genres",
    responses(
        (status = 200, description = "Genre list", body = Vec<Genre>)
    )
)]
pub async fn list_genres(State(state): State<crate::AppState>) -> AppResult<Json<Vec<Genre>>> {
    let genres = state.services.catalog.list_genres().await?;
    Ok(Json(genres))
}

/// Get genre by ID
#[utoipa::path(
    get,
    path = "/genres/{id}",
    tag = "genres",
    params(("id" = i32, Path, description = "Genre ID")),
    responses(
        (status = 200, description = "Genre details", body = Genre),
        (status = 404, description = "Genre not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_genre(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Genre>> {
    let genre = state.services.catalog.get_genre(id).await?;
    Ok(Json(genre))
}

/// Create genre
#[utoipa::path(
    post,
    path = "/genres",
    tag = "genres",
    security(("bearer_auth" = [])),
    request_body = GenreInput,
    responses(
        (status = 201, description = "Genre created", body = Genre)
    )
)]
pub async fn create_genre(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<GenreInput>,
) -> AppResult<(StatusCode, Json<Genre>)> {
    let genre = state.services.catalog.create_genre(&claims, &data).await?;
    Ok((StatusCode::CREATED, Json(genre)))
}

/// Rename genre
#[utoipa::path(
    put,
    path = "/genres/{id}",
    tag = "genres",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Genre ID")),
    request_body = GenreInput,
    responses(
        (status = 200, description = "Genre renamed", body = Genre)
    )
)]
pub async fn rename_genre(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<GenreInput>,
) -> AppResult<Json<Genre>> {
    let genre = state.services.catalog.rename_genre(&claims, id, &data).await?;
    Ok(Json(genre))
}

/// Delete genre and unlink it from every book
#[utoipa::path(
    delete,
    path = "/genres/{id}",
    tag = "genres",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Genre ID")),
    responses(
        (status = 204, description = "Genre deleted")
    )
)]
pub async fn delete_genre(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete_genre(&claims, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List languages by name
#[utoipa::path(
    get,
    path = "/languages",
    tag = "languages",
    responses(
        (status = 200, description = "Language list", body = Vec<Language>)
    )
)]
pub async fn list_languages(State(state): State<crate::AppState>) -> AppResult<Json<Vec<Language>>> {
    let languages = state.services.catalog.list_languages().await?;
    Ok(Json(languages))
}

/// Get language by ID
#[utoipa::path(
    get,
    path = "/languages/{id}",
    tag = "languages",
    params(("id" = i32, Path, description = "Language ID")),
    responses(
        (status = 200, description = "Language details", body = Language),
        (status = 404, description = "Language not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_language(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Language>> {
    let language = state.services.catalog.get_language(id).await?;
    Ok(Json(language))
}

/// Create language
#[utoipa::path(
    post,
    path = "/languages",
    tag = "languages",
    security(("bearer_auth" = [])),
    request_body = LanguageInput,
    responses(
        (status = 201, description = "Language created", body = Language)
    )
)]
pub async fn create_language(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<LanguageInput>,
) -> AppResult<(StatusCode, Json<Language>)> {
    let language = state.services.catalog.create_language(&claims, &data).await?;
    Ok((StatusCode::CREATED, Json(language)))
}

/// Rename language
#[utoipa::path(
    put,
    path = "/languages/{id}",
    tag = "languages",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Language ID")),
    request_body = LanguageInput,
    responses(
        (status = 200, description = "Language renamed", body = Language)
    )
)]
pub async fn rename_language(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<LanguageInput>,
) -> AppResult<Json<Language>> {
    let language = state.services.catalog.rename_language(&claims, id, &data).await?;
    Ok(Json(language))
}

/// Delete language. Books keep existing without a language.
#[utoipa::path(
    delete,
    path = "/languages/{id}",
    tag = "languages",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Language ID")),
    responses(
        (status = 204, description = "Language deleted")
    )
)]
pub async fn delete_language(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete_language(&claims, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
