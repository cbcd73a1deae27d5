//! API handlers for the catalog REST endpoints

pub mod authors;
pub mod books;
pub mod health;
pub mod instances;
pub mod loans;
pub mod openapi;
pub mod stats;
pub mod taxonomy;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Home page figures
        .route("/stats", get(stats::get_stats))
        // Authors
        .route("/authors", get(authors::list_authors).post(authors::create_author))
        .route(
            "/authors/:id",
            get(authors::get_author)
                .put(authors::update_author)
                .delete(authors::delete_author),
        )
        // Genres and languages
        .route("/genres", get(taxonomy::list_genres).post(taxonomy::create_genre))
        .route(
            "/genres/:id",
            get(taxonomy::get_genre)
                .put(taxonomy::rename_genre)
                .delete(taxonomy::delete_genre),
        )
        .route("/languages", get(taxonomy::list_languages).post(taxonomy::create_language))
        .route(
            "/languages/:id",
            get(taxonomy::get_language)
                .put(taxonomy::rename_language)
                .delete(taxonomy::delete_language),
        )
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book).put(books::update_book).delete(books::delete_book),
        )
        .route("/books/:id/instances", get(books::list_book_instances))
        // Book instances
        .route("/instances", get(instances::list_instances).post(instances::create_instance))
        .route(
            "/instances/:id",
            get(instances::get_instance)
                .put(instances::update_instance)
                .delete(instances::delete_instance),
        )
        .route(
            "/instances/:id/renew",
            get(loans::renewal_form).post(loans::renew_loan),
        )
        // Loans
        .route("/loans", get(loans::list_all_loans))
        .route("/loans/mine", get(loans::list_my_loans))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
