//! Marketplace price selection.

use log::debug;

use crate::models::{InventoryRow, ReferenceEntry};

/// Parses a price string, handling both comma and dot decimal separators
/// and a leading currency symbol. Blank or malformed values give `None`.
pub fn parse_price(price_str: &str) -> Option<f64> {
    let clean = price_str
        .trim()
        .trim_start_matches(&['$', '€'][..])
        .trim()
        .replace(',', ".");
    if clean.is_empty() {
        return None;
    }
    clean.parse::<f64>().ok().filter(|price| price.is_finite())
}

/// Picks the listing price: the first positive catalog price in priority
/// order, then the row's purchase price, then the floor.
pub fn resolve_price(entry: Option<&ReferenceEntry>, row: &InventoryRow, floor_price: f64) -> f64 {
    let catalog_price = entry.and_then(|entry| {
        entry
            .prices_by_priority()
            .into_iter()
            .flatten()
            .filter_map(parse_price)
            .find(|price| *price > 0.0)
    });

    if let Some(price) = catalog_price {
        return price;
    }

    match row.purchase_price().filter(|price| *price > 0.0) {
        Some(price) => {
            debug!("No catalog price for '{}', using purchase price {price:.2}", row.name);
            price
        }
        None => {
            debug!("No usable price for '{}', using floor {floor_price:.2}", row.name);
            floor_price
        }
    }
}
