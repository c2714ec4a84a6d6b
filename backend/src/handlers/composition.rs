//! HTTP handlers for composition draft endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{CompositionSummary, SaleType, StoredComposition};
use crate::services::{CompositionScope, CompositionService};
use crate::AppState;

fn scope(cycle_id: Uuid, market_id: Uuid, sale_type: &str) -> AppResult<CompositionScope> {
    let sale_type = SaleType::parse(sale_type)
        .ok_or_else(|| AppError::Validation {
            field: "sale_type".to_string(),
            message: format!("Unknown sale type '{}'", sale_type),
            message_pt: format!("Tipo de venda desconhecido '{}'", sale_type),
        })?;
    Ok(CompositionScope {
        cycle_id,
        market_id,
        sale_type,
    })
}

/// Get the stored draft of a composition
pub async fn get_draft(
    State(state): State<AppState>,
    Path((cycle_id, market_id, sale_type)): Path<(Uuid, Uuid, String)>,
) -> AppResult<Json<StoredComposition>> {
    let scope = scope(cycle_id, market_id, &sale_type)?;
    let service = CompositionService::new(state.db);
    let draft = service
        .load_draft(scope)
        .await?
        .ok_or_else(|| AppError::NotFound("Draft".to_string()))?;
    Ok(Json(draft))
}

/// Save a composition draft (last write wins)
pub async fn save_draft(
    State(state): State<AppState>,
    Path((cycle_id, market_id, sale_type)): Path<(Uuid, Uuid, String)>,
    Json(draft): Json<StoredComposition>,
) -> AppResult<Json<StoredComposition>> {
    let scope = scope(cycle_id, market_id, &sale_type)?;
    let service = CompositionService::new(state.db);
    let saved = service.save_draft(scope, draft).await?;
    Ok(Json(saved))
}

/// Discard a composition draft
pub async fn delete_draft(
    State(state): State<AppState>,
    Path((cycle_id, market_id, sale_type)): Path<(Uuid, Uuid, String)>,
) -> AppResult<Json<()>> {
    let scope = scope(cycle_id, market_id, &sale_type)?;
    let service = CompositionService::new(state.db);
    service.delete_draft(scope).await?;
    Ok(Json(()))
}

/// Get selected items, totals and cap check of a composition draft
pub async fn get_summary(
    State(state): State<AppState>,
    Path((cycle_id, market_id, sale_type)): Path<(Uuid, Uuid, String)>,
) -> AppResult<Json<CompositionSummary>> {
    let scope = scope(cycle_id, market_id, &sale_type)?;
    let service = CompositionService::new(state.db);
    let summary = service
        .summary(scope, state.config.composition.default_basket_cap)
        .await?;
    Ok(Json(summary))
}
