//! HTTP handlers for market stage endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{MarketStage, PublishCheck, StageView};
use crate::services::StageService;
use crate::AppState;

/// Query parameters for resolving the active stage
#[derive(Debug, Deserialize)]
pub struct ActiveStageQuery {
    /// Stage explicitly chosen by the user
    pub stage_id: Option<Uuid>,
}

/// List a cycle's stages with their lock state
pub async fn list_stages(
    State(state): State<AppState>,
    Path(cycle_id): Path<Uuid>,
) -> AppResult<Json<Vec<StageView>>> {
    let service = StageService::new(state.db);
    let stages = service.list_stage_views(cycle_id).await?;
    Ok(Json(stages))
}

/// Get the stage the composition screen should open on (`null` when all are done)
pub async fn get_active_stage(
    State(state): State<AppState>,
    Path(cycle_id): Path<Uuid>,
    Query(query): Query<ActiveStageQuery>,
) -> AppResult<Json<Option<MarketStage>>> {
    let service = StageService::new(state.db);
    let stage = service.active_stage(cycle_id, query.stage_id).await?;
    Ok(Json(stage))
}

/// Check whether a direct-sale stage can be published
pub async fn publish_check(
    State(state): State<AppState>,
    Path((cycle_id, stage_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<PublishCheck>> {
    let service = StageService::new(state.db);
    let check = service.publish_check(cycle_id, stage_id).await?;
    Ok(Json(check))
}

/// Publish a direct-sale catalog
pub async fn publish_direct_sale(
    State(state): State<AppState>,
    Path((cycle_id, stage_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<MarketStage>> {
    let service = StageService::new(state.db);
    let stage = service.publish_direct_sale(cycle_id, stage_id).await?;
    Ok(Json(stage))
}

/// Mark a stage's composition as done
pub async fn complete_stage(
    State(state): State<AppState>,
    Path((cycle_id, stage_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<MarketStage>> {
    let service = StageService::new(state.db);
    let stage = service.complete_stage(cycle_id, stage_id).await?;
    Ok(Json(stage))
}
