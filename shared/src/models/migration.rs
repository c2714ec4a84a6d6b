//! Leftover migration between cycles
//!
//! Stock offered in finished cycles that was not ordered can be carried over
//! into an active cycle. Leftovers from several source cycles are merged into
//! one row per product, supplier and unit.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{clamp_quantity, Cycle};
use crate::types::{collate, CycleId};

/// Assumed share of an offer that gets ordered when no order data is known
pub const DEFAULT_ORDER_RATIO: Decimal = Decimal::from_parts(4, 0, 0, false, 1);

/// One offer line of a source cycle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeftoverRow {
    pub product_name: String,
    pub supplier_name: String,
    pub unit: String,
    pub offered: u32,
    /// Quantity actually ordered, when order data is available
    #[serde(default)]
    pub ordered: Option<u32>,
}

impl LeftoverRow {
    pub fn product_key(&self) -> String {
        product_key(&self.product_name, &self.supplier_name, &self.unit)
    }

    /// Ordered quantity, recorded or estimated from `order_ratio`, never above `offered`
    pub fn ordered_quantity(&self, order_ratio: Decimal) -> u32 {
        let ordered = self.ordered.unwrap_or_else(|| {
            let ratio = order_ratio.clamp(Decimal::ZERO, Decimal::ONE);
            (Decimal::from(self.offered) * ratio)
                .floor()
                .to_u32()
                .unwrap_or(0)
        });
        ordered.min(self.offered)
    }

    pub fn leftover(&self, order_ratio: Decimal) -> u32 {
        self.offered.saturating_sub(self.ordered_quantity(order_ratio))
    }
}

/// Key identifying the same product across cycles.
///
/// Parts are joined with `|`; a `|` or `\` inside a part is escaped with `\`
/// so distinct triples never share a key.
pub fn product_key(product_name: &str, supplier_name: &str, unit: &str) -> String {
    [product_name, supplier_name, unit]
        .iter()
        .map(|part| part.replace('\\', "\\\\").replace('|', "\\|"))
        .collect::<Vec<_>>()
        .join("|")
}

/// Leftovers of one product merged across source cycles
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeftoverAggregate {
    pub product_key: String,
    pub product_name: String,
    pub supplier_name: String,
    pub unit: String,
    pub offered_total: u64,
    pub ordered_total: u64,
    pub leftover_total: u64,
    pub source_cycle_ids: Vec<CycleId>,
    /// How much the user chose to carry over; starts at `leftover_total`
    pub quantity_to_migrate: u64,
}

impl LeftoverAggregate {
    /// Edit the quantity to carry over, clamped to `0..=leftover_total`
    pub fn with_quantity_to_migrate(mut self, requested: i64) -> Self {
        self.quantity_to_migrate = clamp_quantity(requested, self.leftover_total);
        self
    }
}

/// Why a migration has nothing to show
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MigrationError {
    #[error("no source cycles selected")]
    NoSourceCycles,

    #[error("cycle {0} is still active")]
    SourceCycleActive(CycleId),

    #[error("nothing available to migrate")]
    NothingToMigrate,
}

/// Every source cycle must be finished before its leftovers can be read
pub fn ensure_sources_finished(cycles: &[Cycle]) -> Result<(), MigrationError> {
    match cycles.iter().find(|c| c.is_active()) {
        Some(active) => Err(MigrationError::SourceCycleActive(active.id.clone())),
        None => Ok(()),
    }
}

/// Merge leftovers of the selected source cycles.
///
/// Cycles named more than once count once; cycles absent from
/// `rows_by_cycle` contribute nothing. Rows come out sorted by product,
/// supplier and unit.
pub fn aggregate_leftovers(
    source_cycle_ids: &[CycleId],
    rows_by_cycle: &HashMap<CycleId, Vec<LeftoverRow>>,
    order_ratio: Decimal,
) -> Result<Vec<LeftoverAggregate>, MigrationError> {
    if source_cycle_ids.is_empty() {
        return Err(MigrationError::NoSourceCycles);
    }

    let mut merged: BTreeMap<(String, String, String), LeftoverAggregate> = BTreeMap::new();
    let mut seen_cycles: Vec<&CycleId> = Vec::with_capacity(source_cycle_ids.len());

    for cycle_id in source_cycle_ids {
        if seen_cycles.contains(&cycle_id) {
            continue;
        }
        seen_cycles.push(cycle_id);

        let Some(rows) = rows_by_cycle.get(cycle_id) else {
            continue;
        };

        for row in rows {
            let ordered = u64::from(row.ordered_quantity(order_ratio));
            let offered = u64::from(row.offered);
            let leftover = offered.saturating_sub(ordered);

            let entry = merged
                .entry((
                    row.product_name.clone(),
                    row.supplier_name.clone(),
                    row.unit.clone(),
                ))
                .or_insert_with(|| LeftoverAggregate {
                    product_key: row.product_key(),
                    product_name: row.product_name.clone(),
                    supplier_name: row.supplier_name.clone(),
                    unit: row.unit.clone(),
                    offered_total: 0,
                    ordered_total: 0,
                    leftover_total: 0,
                    source_cycle_ids: Vec::new(),
                    quantity_to_migrate: 0,
                });

            entry.offered_total += offered;
            entry.ordered_total += ordered;
            entry.leftover_total += leftover;
            if !entry.source_cycle_ids.contains(cycle_id) {
                entry.source_cycle_ids.push(cycle_id.clone());
            }
        }
    }

    if merged.values().all(|row| row.leftover_total == 0) {
        return Err(MigrationError::NothingToMigrate);
    }

    let mut aggregates: Vec<LeftoverAggregate> = merged
        .into_values()
        .map(|mut row| {
            row.quantity_to_migrate = row.leftover_total;
            row
        })
        .collect();

    aggregates.sort_by(|a, b| {
        collate(&a.product_name, &b.product_name)
            .then_with(|| collate(&a.supplier_name, &b.supplier_name))
            .then_with(|| collate(&a.unit, &b.unit))
    });
    Ok(aggregates)
}

/// Total quantity the user chose to carry over
pub fn migration_totals(rows: &[LeftoverAggregate]) -> u64 {
    rows.iter().map(|row| row.quantity_to_migrate).sum()
}

/// Rows that will actually be migrated
pub fn rows_to_migrate(rows: &[LeftoverAggregate]) -> Vec<&LeftoverAggregate> {
    rows.iter().filter(|row| row.quantity_to_migrate > 0).collect()
}
