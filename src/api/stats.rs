//! Catalog home page figures

use axum::{extract::State, Json};

use crate::{error::AppResult, models::CatalogSummary};

/// Counts of books, copies, available copies and authors
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Catalog summary", body = CatalogSummary)
    )
)]
pub async fn get_stats(State(state): State<crate::AppState>) -> AppResult<Json<CatalogSummary>> {
    let summary = state.services.availability.summary().await?;
    Ok(Json(summary))
}
