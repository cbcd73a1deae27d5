//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{authors, books, health, instances, loans, stats, taxonomy};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Catalog API",
        version = "1.0.0",
        description = "Library catalog and loan renewal REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Stats
        stats::get_stats,
        // Authors
        authors::list_authors,
        authors::get_author,
        authors::create_author,
        authors::update_author,
        authors::delete_author,
        // Genres
        taxonomy::list_genres,
        taxonomy::get_genre,
        taxonomy::create_genre,
        taxonomy::rename_genre,
        taxonomy::delete_genre,
        // Languages
        taxonomy::list_languages,
        taxonomy::get_language,
        taxonomy::create_language,
        taxonomy::rename_language,
        taxonomy::delete_language,
        // Books
        books::list_books,
        books::get_book,
        books::list_book_instances,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Instances
        instances::list_instances,
        instances::get_instance,
        instances::create_instance,
        instances::update_instance,
        instances::delete_instance,
        // Loans
        loans::list_my_loans,
        loans::list_all_loans,
        loans::renewal_form,
        loans::renew_loan,
    ),
    components(
        schemas(
            // Catalog
            crate::models::author::Author,
            crate::models::author::CreateAuthor,
            crate::models::author::UpdateAuthor,
            crate::models::genre::Genre,
            crate::models::genre::GenreInput,
            crate::models::language::Language,
            crate::models::language::LanguageInput,
            crate::models::book::Book,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::book_instance::LoanStatus,
            crate::models::book_instance::BookInstanceView,
            crate::models::book_instance::CreateBookInstance,
            crate::models::book_instance::UpdateBookInstance,
            // Loans
            loans::RenewRequest,
            loans::RenewalFormResponse,
            // Stats
            crate::models::stats::CatalogSummary,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "stats", description = "Catalog figures"),
        (name = "authors", description = "Author management"),
        (name = "genres", description = "Genre management"),
        (name = "languages", description = "Language management"),
        (name = "books", description = "Book management"),
        (name = "instances", description = "Book copy management"),
        (name = "loans", description = "Loans and renewals")
    )
)]
pub struct ApiDoc;

/// Registers the JWT bearer scheme referenced by protected paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
