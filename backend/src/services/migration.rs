//! Migration service: leftovers of finished cycles

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    aggregate_leftovers, ensure_sources_finished, CycleId, LeftoverAggregate, LeftoverRow,
};
use crate::services::CatalogService;

/// Migration service for carrying unsold stock into a new cycle
#[derive(Clone)]
pub struct MigrationService {
    db: PgPool,
    catalog: CatalogService,
    order_ratio: Decimal,
}

/// Row for leftover query
#[derive(Debug, FromRow)]
struct LeftoverQueryRow {
    cycle_id: Uuid,
    product_name: String,
    supplier_name: String,
    unit: String,
    offered: i32,
    /// NULL when the cycle has no order data at all
    ordered: Option<i64>,
}

impl From<LeftoverQueryRow> for LeftoverRow {
    fn from(row: LeftoverQueryRow) -> Self {
        LeftoverRow {
            product_name: row.product_name,
            supplier_name: row.supplier_name,
            unit: row.unit,
            offered: u32::try_from(row.offered).unwrap_or(0),
            ordered: row.ordered.map(|q| u32::try_from(q).unwrap_or(u32::MAX)),
        }
    }
}

impl MigrationService {
    /// Create a new MigrationService instance
    pub fn new(db: PgPool, order_ratio: Decimal) -> Self {
        Self {
            catalog: CatalogService::new(db.clone()),
            db,
            order_ratio,
        }
    }

    /// Offer lines of the given cycles, with ordered quantities when known
    pub async fn leftover_rows(
        &self,
        cycle_ids: &[Uuid],
    ) -> AppResult<HashMap<CycleId, Vec<LeftoverRow>>> {
        let rows = sqlx::query_as::<_, LeftoverQueryRow>(
            r#"
            SELECT o.cycle_id,
                   COALESCE(NULLIF(TRIM(o.base_product_name), ''), o.display_name) AS product_name,
                   o.supplier_name,
                   o.unit,
                   o.offered_quantity AS offered,
                   CASE WHEN EXISTS (
                            SELECT 1 FROM order_items oi2
                            JOIN offers o2 ON o2.id = oi2.offer_id
                            WHERE o2.cycle_id = o.cycle_id
                        )
                        THEN COALESCE(SUM(oi.quantity), 0)
                        ELSE NULL
                   END AS ordered
            FROM offers o
            LEFT JOIN order_items oi ON oi.offer_id = o.id
            WHERE o.cycle_id = ANY($1)
            GROUP BY o.id, o.cycle_id, o.base_product_name, o.display_name,
                     o.supplier_name, o.unit, o.offered_quantity
            "#,
        )
        .bind(cycle_ids)
        .fetch_all(&self.db)
        .await?;

        let mut by_cycle: HashMap<CycleId, Vec<LeftoverRow>> = HashMap::new();
        for row in rows {
            by_cycle
                .entry(row.cycle_id.to_string())
                .or_default()
                .push(row.into());
        }
        Ok(by_cycle)
    }

    /// Merge the leftovers of the selected source cycles
    pub async fn aggregate(&self, source_cycle_ids: &[Uuid]) -> AppResult<Vec<LeftoverAggregate>> {
        let rows_by_cycle = if source_cycle_ids.is_empty() {
            HashMap::new()
        } else {
            let cycles = self.catalog.list_cycles(source_cycle_ids).await?;
            ensure_sources_finished(&cycles)?;
            self.leftover_rows(source_cycle_ids).await?
        };
        let ids: Vec<CycleId> = source_cycle_ids.iter().map(Uuid::to_string).collect();

        let estimated = rows_by_cycle
            .iter()
            .filter(|(_, rows)| rows.iter().any(|r| r.ordered.is_none()))
            .count();
        if estimated > 0 {
            tracing::info!(
                "{} source cycles have no order data; assuming {} ordered",
                estimated,
                self.order_ratio
            );
        }

        let aggregates = aggregate_leftovers(&ids, &rows_by_cycle, self.order_ratio)?;
        tracing::debug!(
            "Aggregated {} leftover rows from {} cycles",
            aggregates.len(),
            ids.len()
        );
        Ok(aggregates)
    }
}
