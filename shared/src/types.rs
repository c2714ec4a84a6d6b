//! Common types used across the platform

use std::cmp::Ordering;

use rust_decimal::{Decimal, RoundingStrategy};

/// Identifier of a supplier offer (a product variant)
pub type OfferId = String;

/// Identifier of a sales cycle
pub type CycleId = String;

/// Identifier of a market
pub type MarketId = String;

/// Identifier of a market stage within a cycle
pub type StageId = String;

/// Fold a label into its collation form: ASCII transliteration, lowercase.
///
/// "Açaí" and "acai" collate together, which is what users of a Portuguese
/// catalog expect from an alphabetical listing or a search box.
pub fn collation_key(label: &str) -> String {
    deunicode::deunicode(label).to_lowercase()
}

/// Compare two labels alphabetically, ignoring case and accents.
///
/// Labels that fold to the same key fall back to a plain comparison so the
/// order stays total.
pub fn collate(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

/// Case- and accent-insensitive substring test
pub fn contains_folded(haystack: &str, needle: &str) -> bool {
    collation_key(haystack).contains(&collation_key(needle))
}

/// Format an amount as Brazilian Real (e.g. `R$ 1.234,50`)
pub fn format_brl(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    if negative {
        format!("-R$ {},{}", grouped, cents)
    } else {
        format!("R$ {},{}", grouped, cents)
    }
}
