//! Admin endpoints for static SmartLink pages.
//!
//! Called by the CRM whenever a SmartLink is created, edited, or removed.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use crate::error::{PageError, ValidationError};
use crate::record::SmartLinkRecord;
use crate::regen::{self, RegenerationSummary};
use crate::state::AppState;
use crate::store::StoredPage;

/// Response for a generated page.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    success: bool,
    #[serde(flatten)]
    page: StoredPage,
}

/// Response for a delete, whether or not a page existed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    success: bool,
    short_id: String,
    deleted: bool,
}

/// Cached page listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    count: usize,
    short_ids: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegenerateParams {
    /// Overrides `SMARTLINK_PRUNE_ORPHANS` for this run.
    prune: Option<bool>,
}

/// `POST /api/v1/static-pages/generate`
pub async fn generate_page(
    State(state): State<AppState>,
    body: Result<Json<SmartLinkRecord>, JsonRejection>,
) -> Result<Json<GenerateResponse>, PageError> {
    let Json(record) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected generate body");
        ValidationError {
            fields: vec!["body"],
        }
    })?;

    let page = regen::generate_one(&record, &state.config, &state.store).await?;

    Ok(Json(GenerateResponse {
        success: true,
        page,
    }))
}

/// `POST /api/v1/static-pages/regenerate-all[?prune=true]`
pub async fn regenerate_all(
    State(state): State<AppState>,
    Query(params): Query<RegenerateParams>,
) -> Result<Json<RegenerationSummary>, PageError> {
    let prune = params.prune.unwrap_or(state.config.prune_orphans);
    let summary =
        regen::regenerate_all(state.source.as_ref(), &state.store, &state.config, prune).await?;
    Ok(Json(summary))
}

/// `DELETE /api/v1/static-pages/{shortId}`
pub async fn delete_page(
    State(state): State<AppState>,
    Path(short_id): Path<String>,
) -> Result<Json<DeleteResponse>, PageError> {
    let deleted = state.store.delete(&short_id).await?;
    Ok(Json(DeleteResponse {
        success: true,
        short_id,
        deleted,
    }))
}

/// `GET /api/v1/static-pages`
pub async fn list_pages(State(state): State<AppState>) -> Result<Json<ListResponse>, PageError> {
    let short_ids = state.store.list().await?;
    Ok(Json(ListResponse {
        count: short_ids.len(),
        short_ids,
    }))
}
