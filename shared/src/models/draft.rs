//! Persisted composition drafts
//!
//! The admin frontend mirrors the selection of every (sale type, cycle, market)
//! into browser storage so an unfinished composition survives a reload. The
//! backend keeps the same blob for cross-device drafts. Writes are last-write-wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{SaleType, SelectionState};
use crate::types::OfferId;

/// Storage key of a draft, e.g. `composicao-cesta-ciclo-12-mercado-3`
pub fn composition_storage_key(sale_type: SaleType, cycle_id: &str, market_id: &str) -> String {
    format!(
        "composicao-{}-ciclo-{}-mercado-{}",
        sale_type.storage_slug(),
        cycle_id,
        market_id
    )
}

/// Wire shape of a stored draft
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredComposition {
    #[serde(rename = "selectedByGroup")]
    pub selected_by_group: Vec<(String, Vec<OfferId>)>,
    #[serde(rename = "composicao")]
    pub quantities: Vec<(OfferId, i64)>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl StoredComposition {
    pub fn from_state(state: &SelectionState, timestamp: DateTime<Utc>) -> Self {
        Self {
            selected_by_group: state
                .selected_by_group
                .iter()
                .map(|(group, ids)| (group.clone(), ids.iter().cloned().collect()))
                .collect(),
            quantities: state
                .quantities
                .iter()
                .map(|(id, quantity)| (id.clone(), i64::from(*quantity)))
                .collect(),
            timestamp,
        }
    }

    /// Rebuild a selection, dropping empty groups and non-positive quantities
    pub fn into_state(self) -> SelectionState {
        let mut state = SelectionState::new();
        for (group, ids) in self.selected_by_group {
            if ids.is_empty() {
                continue;
            }
            state
                .selected_by_group
                .entry(group)
                .or_default()
                .extend(ids);
        }
        for (id, quantity) in self.quantities {
            if quantity > 0 {
                let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
                state.quantities.insert(id, quantity);
            }
        }
        state
    }

    pub fn to_json(&self) -> String {
        // serializing plain strings, integers and tuples cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parse a stored blob; anything unreadable counts as no draft
    pub fn from_json(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

/// Restore the selection stored under a key, or start empty
pub fn restore_selection(raw: Option<&str>) -> SelectionState {
    raw.and_then(StoredComposition::from_json)
        .map(StoredComposition::into_state)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_storage_key_format() {
        assert_eq!(
            composition_storage_key(SaleType::Basket, "12", "3"),
            "composicao-cesta-ciclo-12-mercado-3"
        );
        assert_eq!(
            composition_storage_key(SaleType::DirectSale, "7", "1"),
            "composicao-venda-direta-ciclo-7-mercado-1"
        );
    }

    #[test]
    fn test_wire_shape() {
        let state = SelectionState::new()
            .toggle_variant("Tomate", "v1")
            .set_quantity("v1", 4, 10);
        let at = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let json = StoredComposition::from_state(&state, at).to_json();

        assert_eq!(
            json,
            r#"{"selectedByGroup":[["Tomate",["v1"]]],"composicao":[["v1",4]],"timestamp":1700000000000}"#
        );
    }

    #[test]
    fn test_restore_from_frontend_blob() {
        let raw = r#"{"selectedByGroup":[["Tomate",["v1","v2"]],["Alface",[]]],"composicao":[["v1",3],["v2",0],["v3",-1]],"timestamp":1700000000000}"#;
        let state = restore_selection(Some(raw));

        assert_eq!(state.selected_by_group.len(), 1);
        assert!(state.is_selected("Tomate", "v2"));
        assert_eq!(state.quantity_of("v1"), 3);
        assert_eq!(state.quantities.len(), 1);
    }

    #[test]
    fn test_corrupt_blob_is_absent_state() {
        assert!(StoredComposition::from_json("{not json").is_none());
        assert!(restore_selection(Some("[]")).is_empty());
        assert!(restore_selection(None).is_empty());
    }
}
