//! In-progress composition selection
//!
//! Checking a variant and giving it a quantity are separate steps. A checked
//! variant counts towards totals only once it has a positive quantity.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Offer;
use crate::types::OfferId;

/// Which variants are checked per product group, and how much of each
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectionState {
    /// Group key → checked variant ids; never holds an empty set
    #[serde(default)]
    pub selected_by_group: BTreeMap<String, BTreeSet<OfferId>>,
    /// Variant id → chosen quantity; never holds a zero
    #[serde(default)]
    pub quantities: BTreeMap<OfferId, u32>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check a variant, or uncheck it and forget its quantity
    pub fn toggle_variant(mut self, group_key: &str, variant_id: &str) -> Self {
        let selected = self
            .selected_by_group
            .entry(group_key.to_string())
            .or_default();

        if !selected.remove(variant_id) {
            selected.insert(variant_id.to_string());
        } else {
            self.quantities.remove(variant_id);
        }

        if selected.is_empty() {
            self.selected_by_group.remove(group_key);
        }
        self
    }

    /// Assign a quantity, clamped to `0..=offered`; zero removes the line
    pub fn set_quantity(mut self, variant_id: &str, requested: i64, offered: u32) -> Self {
        let quantity = clamp_quantity(requested, u64::from(offered)) as u32;
        if quantity == 0 {
            self.quantities.remove(variant_id);
        } else {
            self.quantities.insert(variant_id.to_string(), quantity);
        }
        self
    }

    /// Uncheck every variant of a group and drop their quantities
    pub fn clear_group(mut self, group_key: &str) -> Self {
        if let Some(selected) = self.selected_by_group.remove(group_key) {
            for variant_id in &selected {
                self.quantities.remove(variant_id);
            }
        }
        self
    }

    pub fn is_selected(&self, group_key: &str, variant_id: &str) -> bool {
        self.selected_by_group
            .get(group_key)
            .is_some_and(|set| set.contains(variant_id))
    }

    /// Quantity chosen for a variant (0 when it has none)
    pub fn quantity_of(&self, variant_id: &str) -> u32 {
        self.quantities.get(variant_id).copied().unwrap_or(0)
    }

    /// Checked variants that still have no quantity
    pub fn pending_variant_ids(&self) -> Vec<OfferId> {
        self.selected_by_group
            .values()
            .flatten()
            .filter(|id| !self.quantities.contains_key(*id))
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.selected_by_group.is_empty() && self.quantities.is_empty()
    }
}

/// A composition line that counts towards totals
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectedItem {
    pub id: OfferId,
    pub unit_price: Decimal,
    pub quantity: u32,
}

/// Lines with a positive quantity, joined with their offer's price.
///
/// Quantities for ids that are not among `offers` are skipped.
pub fn selected_items(state: &SelectionState, offers: &[Offer]) -> Vec<SelectedItem> {
    state
        .quantities
        .iter()
        .filter(|(_, quantity)| **quantity > 0)
        .filter_map(|(id, quantity)| {
            offers.iter().find(|o| &o.id == id).map(|offer| SelectedItem {
                id: id.clone(),
                unit_price: offer.unit_price,
                quantity: *quantity,
            })
        })
        .collect()
}

/// Clamp a requested quantity to `0..=max`
pub fn clamp_quantity(requested: i64, max: u64) -> u64 {
    if requested <= 0 {
        0
    } else {
        (requested as u64).min(max)
    }
}

/// Turn a quantity typed into a browser field into an integer request.
///
/// Fractions truncate towards zero, NaN becomes 0 and infinities saturate;
/// the result still goes through [`clamp_quantity`].
pub fn coerce_requested(raw: f64) -> i64 {
    if raw.is_nan() {
        0
    } else {
        raw.trunc() as i64
    }
}
