//! Composition service: server-side drafts and composition summaries
//!
//! Drafts use the same key and JSON shape the frontend keeps in browser
//! storage. Saving overwrites whatever is stored (last write wins).

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    composition_storage_key, summarize_composition, CompositionSummary, SaleType, SelectionState,
    StoredComposition,
};
use crate::services::{CatalogService, StageService};

/// Where a composition lives: one market, one cycle, one sale type
#[derive(Debug, Clone, Copy)]
pub struct CompositionScope {
    pub cycle_id: Uuid,
    pub market_id: Uuid,
    pub sale_type: SaleType,
}

impl CompositionScope {
    pub fn storage_key(&self) -> String {
        composition_storage_key(
            self.sale_type,
            &self.cycle_id.to_string(),
            &self.market_id.to_string(),
        )
    }
}

/// Composition service for drafts and totals
#[derive(Clone)]
pub struct CompositionService {
    db: PgPool,
    catalog: CatalogService,
    stages: StageService,
}

impl CompositionService {
    /// Create a new CompositionService instance
    pub fn new(db: PgPool) -> Self {
        Self {
            catalog: CatalogService::new(db.clone()),
            stages: StageService::new(db.clone()),
            db,
        }
    }

    /// Load the stored draft; unreadable payloads count as no draft
    pub async fn load_draft(&self, scope: CompositionScope) -> AppResult<Option<StoredComposition>> {
        let key = scope.storage_key();
        let payload = sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT payload FROM composition_drafts WHERE storage_key = $1",
        )
        .bind(&key)
        .fetch_optional(&self.db)
        .await?;

        Ok(payload.and_then(|value| match serde_json::from_value(value) {
            Ok(draft) => Some(draft),
            Err(e) => {
                tracing::warn!("Ignoring unreadable draft {}: {}", key, e);
                None
            }
        }))
    }

    /// Store a draft, replacing any previous one
    pub async fn save_draft(
        &self,
        scope: CompositionScope,
        draft: StoredComposition,
    ) -> AppResult<StoredComposition> {
        // finished cycles and locked stages are read-only
        self.stages
            .open_stage_for(scope.cycle_id, scope.market_id, scope.sale_type)
            .await?;

        // normalize through the selection state so stored drafts keep its invariants
        let state = draft.into_state();
        let draft = StoredComposition::from_state(&state, Utc::now());
        let payload = serde_json::to_value(&draft)
            .map_err(|e| AppError::Internal(format!("Failed to encode draft: {}", e)))?;

        let key = scope.storage_key();
        sqlx::query(
            r#"
            INSERT INTO composition_drafts (storage_key, payload, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (storage_key)
            DO UPDATE SET payload = EXCLUDED.payload, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&key)
        .bind(&payload)
        .execute(&self.db)
        .await?;

        tracing::info!(
            "Saved draft {} ({} lines)",
            key,
            state.quantities.len()
        );

        if !state.quantities.is_empty() {
            self.stages
                .mark_in_progress(scope.cycle_id, scope.market_id, scope.sale_type)
                .await?;
        }

        Ok(draft)
    }

    /// Discard a draft
    pub async fn delete_draft(&self, scope: CompositionScope) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM composition_drafts WHERE storage_key = $1")
            .bind(scope.storage_key())
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Draft".to_string()));
        }
        Ok(())
    }

    /// Selected items, totals and cap check of the stored draft
    pub async fn summary(
        &self,
        scope: CompositionScope,
        default_basket_cap: Option<Decimal>,
    ) -> AppResult<CompositionSummary> {
        let state: SelectionState = self
            .load_draft(scope)
            .await?
            .map(StoredComposition::into_state)
            .unwrap_or_default();
        let offers = self.catalog.list_offers(scope.cycle_id).await?;

        let cap = match scope.sale_type {
            SaleType::Basket => self
                .catalog
                .market_basket_cap(scope.market_id)
                .await?
                .or(default_basket_cap),
            SaleType::Lot | SaleType::DirectSale => None,
        };

        let summary = summarize_composition(&state, &offers, cap);
        if summary.exceeds_cap {
            tracing::debug!(
                "Draft {} exceeds basket cap: {} > {:?}",
                scope.storage_key(),
                summary.totals.total_value,
                cap
            );
        }
        Ok(summary)
    }
}
