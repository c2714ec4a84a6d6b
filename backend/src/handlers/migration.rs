//! HTTP handlers for leftover migration endpoints

use axum::{extract::State, Json};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppResult;
use crate::models::LeftoverAggregate;
use crate::services::MigrationService;
use crate::AppState;

/// Input for aggregating leftovers
#[derive(Debug, Deserialize, Validate)]
pub struct AggregateLeftoversInput {
    /// Finished cycles to take leftovers from; an empty list is reported as such
    #[validate(length(max = 24))]
    pub source_cycle_ids: Vec<Uuid>,
}

/// Merge the leftovers of the selected source cycles
pub async fn aggregate_leftovers(
    State(state): State<AppState>,
    Json(input): Json<AggregateLeftoversInput>,
) -> AppResult<Json<Vec<LeftoverAggregate>>> {
    input.validate()?;
    let service = MigrationService::new(state.db, state.config.composition.order_ratio);
    let rows = service.aggregate(&input.source_cycle_ids).await?;
    Ok(Json(rows))
}
