//! WebAssembly module for the Divino Alimento admin frontend
//!
//! Provides client-side computation for:
//! - Product grouping and search
//! - Composition selection, totals and basket cap
//! - Stage unlock gating
//! - Leftover migration between cycles
//! - Draft persistence in browser storage
//!
//! Every function takes and returns JSON strings so the SPA can keep its own
//! state containers.

use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

fn parse<T: DeserializeOwned>(label: &str, json: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid {} JSON: {}", label, e))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization failed: {}", e))
}

fn decimal_from_f64(label: &str, value: f64) -> Result<Decimal, String> {
    Decimal::try_from(value).map_err(|_| format!("Invalid {}: {}", label, value))
}

fn js_err(message: String) -> JsValue {
    JsValue::from_str(&message)
}

// ============================================================================
// Grouping
// ============================================================================

fn group_products_json(offers_json: &str) -> Result<String, String> {
    let offers: Vec<Offer> = parse("offers", offers_json)?;
    to_json(&group_and_sort_products(&offers))
}

fn filter_products_json(groups_json: &str, search: &str) -> Result<String, String> {
    let groups: Vec<ProductGroup> = parse("product groups", groups_json)?;
    to_json(&filter_products(&groups, search))
}

/// Group offers into sorted product groups
#[wasm_bindgen]
pub fn group_products(offers_json: &str) -> Result<String, JsValue> {
    group_products_json(offers_json).map_err(js_err)
}

/// Filter product groups by a search string
#[wasm_bindgen]
pub fn search_products(groups_json: &str, search: &str) -> Result<String, JsValue> {
    filter_products_json(groups_json, search).map_err(js_err)
}

// ============================================================================
// Selection
// ============================================================================

fn toggle_variant_json(state_json: &str, group_key: &str, variant_id: &str) -> Result<String, String> {
    let state: SelectionState = parse("selection", state_json)?;
    to_json(&state.toggle_variant(group_key, variant_id))
}

fn set_quantity_json(
    state_json: &str,
    variant_id: &str,
    requested: f64,
    offered: u32,
) -> Result<String, String> {
    let state: SelectionState = parse("selection", state_json)?;
    to_json(&state.set_quantity(variant_id, coerce_requested(requested), offered))
}

fn clear_group_json(state_json: &str, group_key: &str) -> Result<String, String> {
    let state: SelectionState = parse("selection", state_json)?;
    to_json(&state.clear_group(group_key))
}

fn composition_summary_json(
    state_json: &str,
    offers_json: &str,
    cap: Option<f64>,
) -> Result<String, String> {
    let state: SelectionState = parse("selection", state_json)?;
    let offers: Vec<Offer> = parse("offers", offers_json)?;
    let cap = cap.map(|c| decimal_from_f64("cap", c)).transpose()?;
    to_json(&summarize_composition(&state, &offers, cap))
}

/// Check or uncheck a variant
#[wasm_bindgen]
pub fn toggle_variant(state_json: &str, group_key: &str, variant_id: &str) -> Result<String, JsValue> {
    toggle_variant_json(state_json, group_key, variant_id).map_err(js_err)
}

/// Set a variant's quantity (clamped to the offered stock)
#[wasm_bindgen]
pub fn set_variant_quantity(
    state_json: &str,
    variant_id: &str,
    requested: f64,
    offered: u32,
) -> Result<String, JsValue> {
    set_quantity_json(state_json, variant_id, requested, offered).map_err(js_err)
}

/// Uncheck every variant of a product group
#[wasm_bindgen]
pub fn clear_group(state_json: &str, group_key: &str) -> Result<String, JsValue> {
    clear_group_json(state_json, group_key).map_err(js_err)
}

/// Selected items, totals and cap check of a composition
#[wasm_bindgen]
pub fn composition_summary(
    state_json: &str,
    offers_json: &str,
    cap: Option<f64>,
) -> Result<String, JsValue> {
    composition_summary_json(state_json, offers_json, cap).map_err(js_err)
}

/// Format an amount as Brazilian Real
#[wasm_bindgen]
pub fn format_currency(amount: f64) -> String {
    format_brl(Decimal::try_from(amount).unwrap_or(Decimal::ZERO))
}

// ============================================================================
// Stages
// ============================================================================

fn is_stage_locked_json(cycle_json: &str, stage_json: &str, stages_json: &str) -> Result<bool, String> {
    let cycle: Cycle = parse("cycle", cycle_json)?;
    let stage: MarketStage = parse("stage", stage_json)?;
    let stages: Vec<MarketStage> = parse("stages", stages_json)?;
    Ok(is_stage_locked(&cycle, &stage, &stages))
}

fn resolve_active_stage_json(stages_json: &str, override_stage_id: Option<String>) -> Result<String, String> {
    let stages: Vec<MarketStage> = parse("stages", stages_json)?;
    to_json(&resolve_active_stage(&stages, override_stage_id.as_deref()))
}

fn publish_check_json(cycle_json: &str, stage_json: &str) -> Result<String, String> {
    let cycle: Cycle = parse("cycle", cycle_json)?;
    let stage: MarketStage = parse("stage", stage_json)?;
    to_json(&PublishCheck::from(can_publish_direct_sale(&cycle, &stage)))
}

/// Whether a market stage is closed for composition
#[wasm_bindgen]
pub fn stage_locked(cycle_json: &str, stage_json: &str, stages_json: &str) -> Result<bool, JsValue> {
    is_stage_locked_json(cycle_json, stage_json, stages_json).map_err(js_err)
}

/// Stage the composition screen should open on (`null` when all are done)
#[wasm_bindgen]
pub fn active_stage(stages_json: &str, override_stage_id: Option<String>) -> Result<String, JsValue> {
    resolve_active_stage_json(stages_json, override_stage_id).map_err(js_err)
}

/// `{can, reason?}` for publishing a direct-sale catalog
#[wasm_bindgen]
pub fn direct_sale_publish_check(cycle_json: &str, stage_json: &str) -> Result<String, JsValue> {
    publish_check_json(cycle_json, stage_json).map_err(js_err)
}

// ============================================================================
// Migration
// ============================================================================

fn aggregate_leftovers_json(
    source_ids_json: &str,
    rows_by_cycle_json: &str,
    order_ratio: Option<f64>,
) -> Result<String, String> {
    let source_ids: Vec<CycleId> = parse("source cycle ids", source_ids_json)?;
    let rows_by_cycle: HashMap<CycleId, Vec<LeftoverRow>> = parse("leftover rows", rows_by_cycle_json)?;
    let ratio = match order_ratio {
        Some(r) => decimal_from_f64("order ratio", r)?,
        None => DEFAULT_ORDER_RATIO,
    };
    validate_order_ratio(ratio).map_err(str::to_string)?;

    let rows = aggregate_leftovers(&source_ids, &rows_by_cycle, ratio).map_err(|e| e.to_string())?;
    to_json(&rows)
}

/// Merge leftovers of the selected source cycles.
///
/// Fails with "no source cycles selected" or "nothing available to migrate"
/// so the caller can show distinct messages.
#[wasm_bindgen]
pub fn aggregate_cycle_leftovers(
    source_ids_json: &str,
    rows_by_cycle_json: &str,
    order_ratio: Option<f64>,
) -> Result<String, JsValue> {
    aggregate_leftovers_json(source_ids_json, rows_by_cycle_json, order_ratio).map_err(js_err)
}

// ============================================================================
// Draft persistence
// ============================================================================

fn encode_draft_json(state_json: &str, timestamp_ms: i64) -> Result<String, String> {
    let state: SelectionState = parse("selection", state_json)?;
    let timestamp = Utc
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .ok_or_else(|| format!("Invalid timestamp: {}", timestamp_ms))?;
    Ok(StoredComposition::from_state(&state, timestamp).to_json())
}

fn decode_draft_json(raw: Option<String>) -> (String, bool) {
    let parsed = raw.as_deref().and_then(StoredComposition::from_json);
    let corrupt = raw.is_some() && parsed.is_none();
    let state = parsed.map(StoredComposition::into_state).unwrap_or_default();
    (serde_json::to_string(&state).unwrap_or_default(), corrupt)
}

/// Storage key for a composition draft
#[wasm_bindgen]
pub fn draft_storage_key(sale_type: &str, cycle_id: &str, market_id: &str) -> Result<String, JsValue> {
    let sale_type = SaleType::parse(sale_type)
        .ok_or_else(|| JsValue::from_str(&format!("Unknown sale type: {}", sale_type)))?;
    Ok(composition_storage_key(sale_type, cycle_id, market_id))
}

/// Serialize a selection into the stored draft blob, stamped with the current time
#[wasm_bindgen]
pub fn encode_draft(state_json: &str) -> Result<String, JsValue> {
    encode_draft_json(state_json, js_sys::Date::now() as i64).map_err(js_err)
}

/// Selection stored in a draft blob; unreadable blobs give an empty selection
#[wasm_bindgen]
pub fn decode_draft(raw: Option<String>) -> String {
    let (state, corrupt) = decode_draft_json(raw);
    if corrupt {
        web_sys::console::warn_1(&JsValue::from_str(
            "Ignoring unreadable composition draft",
        ));
    }
    state
}
