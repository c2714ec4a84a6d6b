//! HTTP handlers for cycle and offer endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppResult;
use crate::models::{Cycle, ProductGroup};
use crate::services::CatalogService;
use crate::AppState;

/// Query parameters for the offer listing
#[derive(Debug, Deserialize, Validate)]
pub struct OffersQuery {
    #[validate(length(max = 100))]
    pub search: Option<String>,
}

/// Get a cycle
pub async fn get_cycle(
    State(state): State<AppState>,
    Path(cycle_id): Path<Uuid>,
) -> AppResult<Json<Cycle>> {
    let service = CatalogService::new(state.db);
    let cycle = service.get_cycle(cycle_id).await?;
    Ok(Json(cycle))
}

/// List a cycle's offers grouped by product
pub async fn list_product_groups(
    State(state): State<AppState>,
    Path(cycle_id): Path<Uuid>,
    Query(query): Query<OffersQuery>,
) -> AppResult<Json<Vec<ProductGroup>>> {
    query.validate()?;
    let service = CatalogService::new(state.db);
    let groups = service
        .list_product_groups(cycle_id, query.search.as_deref())
        .await?;
    Ok(Json(groups))
}
