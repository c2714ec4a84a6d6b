//! Catalog service: cycles, offers and market settings

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{filter_products, group_and_sort_products, Cycle, CycleStatus, Offer, ProductGroup};

/// Read access to cycles, their offers and market settings
#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct CycleRow {
    id: Uuid,
    name: String,
    offer_window_start: Option<DateTime<Utc>>,
    offer_window_end: Option<DateTime<Utc>>,
    active: bool,
}

impl From<CycleRow> for Cycle {
    fn from(row: CycleRow) -> Self {
        Cycle {
            id: row.id.to_string(),
            name: row.name,
            offer_window_start: row.offer_window_start,
            offer_window_end: row.offer_window_end,
            status: CycleStatus::from_active_flag(row.active),
        }
    }
}

#[derive(Debug, FromRow)]
struct OfferRow {
    id: Uuid,
    base_product_name: Option<String>,
    display_name: String,
    unit: String,
    unit_price: Decimal,
    supplier_name: String,
    offered_quantity: i32,
    certification_tag: Option<String>,
    farming_type_tag: Option<String>,
}

impl From<OfferRow> for Offer {
    fn from(row: OfferRow) -> Self {
        Offer {
            id: row.id.to_string(),
            base_product_name: row.base_product_name,
            display_name: row.display_name,
            unit: row.unit,
            unit_price: row.unit_price,
            supplier_name: row.supplier_name,
            offered_quantity: u32::try_from(row.offered_quantity).unwrap_or(0),
            certification_tag: row.certification_tag,
            farming_type_tag: row.farming_type_tag,
        }
    }
}

impl CatalogService {
    /// Create a new CatalogService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get a cycle by id
    pub async fn get_cycle(&self, cycle_id: Uuid) -> AppResult<Cycle> {
        let row = sqlx::query_as::<_, CycleRow>(
            r#"
            SELECT id, name, offer_window_start, offer_window_end, active
            FROM cycles
            WHERE id = $1
            "#,
        )
        .bind(cycle_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Cycle".to_string()))?;

        Ok(row.into())
    }

    /// Get the cycles among `cycle_ids` that exist
    pub async fn list_cycles(&self, cycle_ids: &[Uuid]) -> AppResult<Vec<Cycle>> {
        let rows = sqlx::query_as::<_, CycleRow>(
            r#"
            SELECT id, name, offer_window_start, offer_window_end, active
            FROM cycles
            WHERE id = ANY($1)
            "#,
        )
        .bind(cycle_ids)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Cycle::from).collect())
    }

    /// List the raw offers of a cycle
    pub async fn list_offers(&self, cycle_id: Uuid) -> AppResult<Vec<Offer>> {
        let rows = sqlx::query_as::<_, OfferRow>(
            r#"
            SELECT id, base_product_name, display_name, unit, unit_price, supplier_name,
                   offered_quantity, certification_tag, farming_type_tag
            FROM offers
            WHERE cycle_id = $1
            "#,
        )
        .bind(cycle_id)
        .fetch_all(&self.db)
        .await?;

        let offers: Vec<Offer> = rows.into_iter().map(Offer::from).collect();
        let malformed = offers.iter().filter(|o| o.group_key().is_none()).count();
        if malformed > 0 {
            tracing::warn!(
                "Cycle {} has {} offers without a base product name",
                cycle_id,
                malformed
            );
        }

        Ok(offers)
    }

    /// List the offers of a cycle grouped by product, optionally filtered
    pub async fn list_product_groups(
        &self,
        cycle_id: Uuid,
        search: Option<&str>,
    ) -> AppResult<Vec<ProductGroup>> {
        // 404 for unknown cycles rather than an empty catalog
        self.get_cycle(cycle_id).await?;

        let offers = self.list_offers(cycle_id).await?;
        let groups = group_and_sort_products(&offers);
        let groups = match search {
            Some(search) => filter_products(&groups, search),
            None => groups,
        };

        tracing::debug!(
            "Cycle {}: {} offers in {} product groups",
            cycle_id,
            offers.len(),
            groups.len()
        );
        Ok(groups)
    }

    /// Get a market's basket cap (valorMaximoCesta), if it has one
    pub async fn market_basket_cap(&self, market_id: Uuid) -> AppResult<Option<Decimal>> {
        let cap = sqlx::query_scalar::<_, Option<Decimal>>(
            "SELECT basket_cap FROM markets WHERE id = $1",
        )
        .bind(market_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Market".to_string()))?;

        Ok(cap)
    }
}
