//! Composition totals and the basket value cap

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{selected_items, Offer, SelectedItem, SelectionState};
use crate::types::OfferId;

/// Sum of the counted composition lines
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompositionTotals {
    /// Σ unit price × quantity, in BRL
    pub total_value: Decimal,
    pub total_quantity: u64,
}

pub fn compute_totals(items: &[SelectedItem]) -> CompositionTotals {
    items
        .iter()
        .fold(CompositionTotals::default(), |acc, item| CompositionTotals {
            total_value: acc.total_value + item.unit_price * Decimal::from(item.quantity),
            total_quantity: acc.total_quantity + u64::from(item.quantity),
        })
}

/// Position of a total against a market's cap (valorMaximoCesta)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CapCheck {
    pub within_cap: bool,
    /// Cap minus total; negative once the cap is exceeded
    pub remaining: Decimal,
}

pub fn check_cap(total_value: Decimal, cap: Decimal) -> CapCheck {
    CapCheck {
        within_cap: total_value <= cap,
        remaining: cap - total_value,
    }
}

/// Everything a composition screen shows below the product list.
///
/// Exceeding the cap is only flagged here; saving is never blocked by it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompositionSummary {
    pub items: Vec<SelectedItem>,
    pub totals: CompositionTotals,
    pub cap: Option<Decimal>,
    pub cap_check: Option<CapCheck>,
    /// excedeuValor
    pub exceeds_cap: bool,
    /// Checked variants without a quantity yet
    pub pending_variant_ids: Vec<OfferId>,
}

pub fn summarize_composition(
    state: &SelectionState,
    offers: &[Offer],
    cap: Option<Decimal>,
) -> CompositionSummary {
    let items = selected_items(state, offers);
    let totals = compute_totals(&items);
    let cap_check = cap.map(|cap| check_cap(totals.total_value, cap));

    CompositionSummary {
        items,
        totals,
        cap,
        exceeds_cap: cap_check.is_some_and(|check| !check.within_cap),
        cap_check,
        pending_variant_ids: state.pending_variant_ids(),
    }
}
