//! Market stage service: unlock gate, active stage and publishing checks

use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    can_publish_direct_sale, ensure_stage_open, resolve_active_stage, stage_views,
    CompositionStatus, MarketStage, PublishCheck, SaleType, StageView,
};
use crate::services::CatalogService;

/// Stage service for the composition sequence of a cycle
#[derive(Clone)]
pub struct StageService {
    db: PgPool,
    catalog: CatalogService,
}

#[derive(Debug, FromRow)]
struct StageRow {
    id: Uuid,
    cycle_id: Uuid,
    market_id: Uuid,
    stage_order: i32,
    sale_type: String,
    composition_status: String,
}

impl TryFrom<StageRow> for MarketStage {
    type Error = AppError;

    fn try_from(row: StageRow) -> Result<Self, Self::Error> {
        let sale_type = SaleType::parse(&row.sale_type).ok_or_else(|| {
            AppError::Internal(format!("Unknown sale type '{}' on stage {}", row.sale_type, row.id))
        })?;
        let composition_status = CompositionStatus::parse(&row.composition_status).ok_or_else(|| {
            AppError::Internal(format!(
                "Unknown composition status '{}' on stage {}",
                row.composition_status, row.id
            ))
        })?;

        Ok(MarketStage {
            id: row.id.to_string(),
            cycle_id: row.cycle_id.to_string(),
            market_id: row.market_id.to_string(),
            order: u32::try_from(row.stage_order).unwrap_or(0),
            sale_type,
            composition_status,
        })
    }
}

impl StageService {
    /// Create a new StageService instance
    pub fn new(db: PgPool) -> Self {
        Self {
            catalog: CatalogService::new(db.clone()),
            db,
        }
    }

    /// List the stages of a cycle in order
    pub async fn list_stages(&self, cycle_id: Uuid) -> AppResult<Vec<MarketStage>> {
        let rows = sqlx::query_as::<_, StageRow>(
            r#"
            SELECT id, cycle_id, market_id, stage_order, sale_type, composition_status
            FROM cycle_markets
            WHERE cycle_id = $1
            ORDER BY stage_order
            "#,
        )
        .bind(cycle_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(MarketStage::try_from).collect()
    }

    /// Stages of a cycle with their lock state
    pub async fn list_stage_views(&self, cycle_id: Uuid) -> AppResult<Vec<StageView>> {
        let cycle = self.catalog.get_cycle(cycle_id).await?;
        let stages = self.list_stages(cycle_id).await?;
        Ok(stage_views(&cycle, &stages))
    }

    /// Stage the composition screen should open on
    pub async fn active_stage(
        &self,
        cycle_id: Uuid,
        override_stage_id: Option<Uuid>,
    ) -> AppResult<Option<MarketStage>> {
        self.catalog.get_cycle(cycle_id).await?;
        let stages = self.list_stages(cycle_id).await?;
        let override_id = override_stage_id.map(|id| id.to_string());

        Ok(resolve_active_stage(&stages, override_id.as_deref()).cloned())
    }

    /// Whether a direct-sale stage can be published
    pub async fn publish_check(&self, cycle_id: Uuid, stage_id: Uuid) -> AppResult<PublishCheck> {
        let cycle = self.catalog.get_cycle(cycle_id).await?;
        let stage = self.get_stage(cycle_id, stage_id).await?;

        let result = can_publish_direct_sale(&cycle, &stage);
        if let Err(blocked) = &result {
            tracing::debug!("Stage {} cannot be published: {}", stage_id, blocked);
        }
        Ok(result.into())
    }

    /// Publish a direct-sale catalog, failing with the blocking reason
    pub async fn publish_direct_sale(&self, cycle_id: Uuid, stage_id: Uuid) -> AppResult<MarketStage> {
        let cycle = self.catalog.get_cycle(cycle_id).await?;
        let stages = self.list_stages(cycle_id).await?;
        let stage = find_stage(&stages, stage_id)?;
        can_publish_direct_sale(&cycle, stage)?;
        ensure_stage_open(&cycle, stage, &stages)?;

        tracing::info!("Publishing direct-sale catalog for stage {}", stage_id);
        self.set_status(stage_id, CompositionStatus::Done).await?;
        Ok(MarketStage {
            composition_status: CompositionStatus::Done,
            ..stage.clone()
        })
    }

    /// Mark a stage's composition as done, unlocking the next stage
    pub async fn complete_stage(&self, cycle_id: Uuid, stage_id: Uuid) -> AppResult<MarketStage> {
        let cycle = self.catalog.get_cycle(cycle_id).await?;
        let stages = self.list_stages(cycle_id).await?;
        let stage = find_stage(&stages, stage_id)?;
        ensure_stage_open(&cycle, stage, &stages)?;

        tracing::info!("Completing stage {} of cycle {}", stage.order, cycle_id);
        self.set_status(stage_id, CompositionStatus::Done).await?;
        Ok(MarketStage {
            composition_status: CompositionStatus::Done,
            ..stage.clone()
        })
    }

    /// Stage a composition writes to, provided it is open for composing
    pub async fn open_stage_for(
        &self,
        cycle_id: Uuid,
        market_id: Uuid,
        sale_type: SaleType,
    ) -> AppResult<MarketStage> {
        let cycle = self.catalog.get_cycle(cycle_id).await?;
        let stages = self.list_stages(cycle_id).await?;
        let market = market_id.to_string();
        let stage = stages
            .iter()
            .find(|s| s.market_id == market && s.sale_type == sale_type)
            .ok_or_else(|| AppError::NotFound("Stage".to_string()))?;

        ensure_stage_open(&cycle, stage, &stages)?;
        Ok(stage.clone())
    }

    /// Move a pending stage to in progress (first draft saved)
    pub async fn mark_in_progress(&self, cycle_id: Uuid, market_id: Uuid, sale_type: SaleType) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE cycle_markets
            SET composition_status = 'in_progress'
            WHERE cycle_id = $1 AND market_id = $2 AND sale_type = $3
              AND composition_status = 'pending'
            "#,
        )
        .bind(cycle_id)
        .bind(market_id)
        .bind(sale_type.as_str())
        .execute(&self.db)
        .await?;

        if result.rows_affected() > 0 {
            tracing::info!("Market {} of cycle {} is now composing", market_id, cycle_id);
        }
        Ok(())
    }

    /// Get one stage of a cycle
    pub async fn get_stage(&self, cycle_id: Uuid, stage_id: Uuid) -> AppResult<MarketStage> {
        let row = sqlx::query_as::<_, StageRow>(
            r#"
            SELECT id, cycle_id, market_id, stage_order, sale_type, composition_status
            FROM cycle_markets
            WHERE id = $1 AND cycle_id = $2
            "#,
        )
        .bind(stage_id)
        .bind(cycle_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Stage".to_string()))?;

        MarketStage::try_from(row)
    }

    async fn set_status(&self, stage_id: Uuid, status: CompositionStatus) -> AppResult<()> {
        sqlx::query("UPDATE cycle_markets SET composition_status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(stage_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

fn find_stage(stages: &[MarketStage], stage_id: Uuid) -> AppResult<&MarketStage> {
    let id = stage_id.to_string();
    stages
        .iter()
        .find(|s| s.id == id)
        .ok_or_else(|| AppError::NotFound("Stage".to_string()))
}
