//! Supplier offers and product grouping

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{collate, contains_folded, OfferId};

/// What a supplier is willing to sell in a cycle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Offer {
    pub id: OfferId,
    /// Product the offer is a variant of (e.g. "Tomate"); missing on malformed records
    #[serde(default)]
    pub base_product_name: Option<String>,
    /// Full label shown to the user (e.g. "Tomate italiano - caixa 20kg")
    pub display_name: String,
    pub unit: String,
    pub unit_price: Decimal,
    pub supplier_name: String,
    pub offered_quantity: u32,
    #[serde(default)]
    pub certification_tag: Option<String>,
    #[serde(default)]
    pub farming_type_tag: Option<String>,
}

impl Offer {
    /// Key of the product group this offer belongs to, if it has one
    pub fn group_key(&self) -> Option<&str> {
        self.base_product_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Offers of the same base product, cheapest first
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductGroup {
    pub base_product_name: String,
    pub variants: Vec<Offer>,
}

impl ProductGroup {
    pub fn variant(&self, variant_id: &str) -> Option<&Offer> {
        self.variants.iter().find(|v| v.id == variant_id)
    }
}

/// Group offers by base product name and sort groups and variants.
///
/// Groups come out in alphabetical order; variants by unit price, then
/// supplier, then id. Offers without a base product name are left out.
pub fn group_and_sort_products(offers: &[Offer]) -> Vec<ProductGroup> {
    let mut by_name: BTreeMap<&str, Vec<Offer>> = BTreeMap::new();
    for offer in offers {
        if let Some(key) = offer.group_key() {
            by_name.entry(key).or_default().push(offer.clone());
        }
    }

    let mut groups: Vec<ProductGroup> = by_name
        .into_iter()
        .map(|(name, mut variants)| {
            variants.sort_by(|a, b| {
                a.unit_price
                    .cmp(&b.unit_price)
                    .then_with(|| collate(&a.supplier_name, &b.supplier_name))
                    .then_with(|| a.id.cmp(&b.id))
            });
            ProductGroup {
                base_product_name: name.to_string(),
                variants,
            }
        })
        .collect();

    groups.sort_by(|a, b| collate(&a.base_product_name, &b.base_product_name));
    groups
}

/// Narrow groups down to what matches a search box.
///
/// A group whose name matches is kept whole; otherwise only the variants whose
/// display name matches survive. Groups left empty are dropped.
pub fn filter_products(groups: &[ProductGroup], search: &str) -> Vec<ProductGroup> {
    let needle = search.trim();
    if needle.is_empty() {
        return groups.to_vec();
    }

    groups
        .iter()
        .filter_map(|group| {
            if contains_folded(&group.base_product_name, needle) {
                return Some(group.clone());
            }
            let variants: Vec<Offer> = group
                .variants
                .iter()
                .filter(|v| contains_folded(&v.display_name, needle))
                .cloned()
                .collect();
            if variants.is_empty() {
                None
            } else {
                Some(ProductGroup {
                    base_product_name: group.base_product_name.clone(),
                    variants,
                })
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use std::str::FromStr;

    pub fn offer(id: &str, base: &str, unit: &str, price: &str, supplier: &str, offered: u32) -> Offer {
        Offer {
            id: id.to_string(),
            base_product_name: Some(base.to_string()),
            display_name: format!("{} ({})", base, unit),
            unit: unit.to_string(),
            unit_price: Decimal::from_str(price).unwrap(),
            supplier_name: supplier.to_string(),
            offered_quantity: offered,
            certification_tag: None,
            farming_type_tag: None,
        }
    }
}
