use mtg_common::ConditionLabel;
use serde::{Deserialize, Serialize, Serializer};

use crate::pricing::{parse_price, resolve_price};

/// Identifier written for rows nobody could resolve
pub const UNRESOLVED_ID: &str = "Not Found";

/// Rarity given to unmatched token line items
pub const TOKEN_RARITY: &str = "Token";

/// Product line used when the catalog row leaves it blank
pub const DEFAULT_PRODUCT_LINE: &str = "Magic: The Gathering";

/// One scanned copy (or stack of copies) from a Manabox collection export
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InventoryRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Set code")]
    pub set_code: String,
    #[serde(rename = "Set name")]
    pub set_name: String,
    #[serde(rename = "Collector number")]
    pub collector_number: String,
    #[serde(rename = "Foil")]
    pub foil: String,
    #[serde(rename = "Rarity")]
    pub rarity: String,
    #[serde(rename = "Quantity")]
    pub quantity: String,
    #[serde(rename = "Condition")]
    pub condition: String,
    #[serde(rename = "Language")]
    pub language: String,
    #[serde(rename = "Purchase price")]
    pub purchase_price: String,
}

impl InventoryRow {
    /// Declared quantity; absent or non-numeric values count as one copy
    pub fn quantity(&self) -> u32 {
        self.quantity.trim().parse::<u32>().unwrap_or(1)
    }

    /// Marketplace condition, e.g. "Lightly Played Foil"
    pub fn condition_label(&self) -> ConditionLabel {
        ConditionLabel::from_manabox(&self.condition, &self.foil)
    }

    /// Purchase price if it parses
    pub fn purchase_price(&self) -> Option<f64> {
        parse_price(&self.purchase_price)
    }

    /// Name and set are required to say anything about identity
    pub fn has_identity(&self) -> bool {
        !self.name.trim().is_empty() && !self.set_name.trim().is_empty()
    }
}

/// One canonical row of the TCGplayer reference catalog
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ReferenceEntry {
    #[serde(rename = "TCGplayer Id")]
    pub tcgplayer_id: String,
    #[serde(rename = "Product Line")]
    pub product_line: String,
    #[serde(rename = "Set Name")]
    pub set_name: String,
    #[serde(rename = "Product Name")]
    pub product_name: String,
    #[serde(rename = "Number")]
    pub number: String,
    #[serde(rename = "Rarity")]
    pub rarity: String,
    #[serde(rename = "Condition")]
    pub condition: String,
    #[serde(rename = "TCG Market Price")]
    pub market_price: Option<String>,
    #[serde(rename = "TCG Direct Low")]
    pub direct_low: Option<String>,
    #[serde(rename = "TCG Low Price With Shipping")]
    pub low_price_with_shipping: Option<String>,
    #[serde(rename = "TCG Low Price")]
    pub low_price: Option<String>,
    #[serde(rename = "TCG Marketplace Price")]
    pub marketplace_price: Option<String>,
}

impl ReferenceEntry {
    /// Price fields in the order they are trusted
    pub fn prices_by_priority(&self) -> [Option<&str>; 5] {
        [
            self.marketplace_price.as_deref(),
            self.market_price.as_deref(),
            self.low_price.as_deref(),
            self.low_price_with_shipping.as_deref(),
            self.direct_low.as_deref(),
        ]
    }

    pub fn product_line_or_default(&self) -> &str {
        if self.product_line.trim().is_empty() {
            DEFAULT_PRODUCT_LINE
        } else {
            &self.product_line
        }
    }

    /// Returns true for prerelease promos, which are never offered as matches
    pub fn is_prerelease(&self) -> bool {
        self.product_name.to_lowercase().contains("prerelease")
            || self.set_name.to_lowercase().contains("prerelease")
    }
}

/// A resolved line of the staged marketplace inventory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRecord {
    /// `None` for token fallbacks that matched nothing in the catalog
    #[serde(rename = "TCGplayer Id")]
    pub tcgplayer_id: Option<String>,
    #[serde(rename = "Product Line")]
    pub product_line: String,
    #[serde(rename = "Set Name")]
    pub set_name: String,
    #[serde(rename = "Product Name")]
    pub product_name: String,
    #[serde(rename = "Number")]
    pub number: String,
    #[serde(rename = "Rarity")]
    pub rarity: String,
    #[serde(rename = "Condition")]
    pub condition: String,
    #[serde(rename = "Add to Quantity")]
    pub quantity: u32,
    #[serde(rename = "TCG Marketplace Price", serialize_with = "serialize_price")]
    pub marketplace_price: f64,
}

impl ResolvedRecord {
    /// Line item for a row matched to `entry`.
    ///
    /// The stripped `suffix` is reattached to the catalog product name, and
    /// condition and quantity come from the scanned row.
    pub fn from_entry(entry: &ReferenceEntry, suffix: &str, row: &InventoryRow, floor_price: f64) -> Self {
        let product_name = if suffix.is_empty() || entry.product_name.ends_with(suffix) {
            entry.product_name.clone()
        } else {
            format!("{}{}", entry.product_name, suffix)
        };

        Self {
            tcgplayer_id: Some(entry.tcgplayer_id.clone()),
            product_line: entry.product_line_or_default().to_string(),
            set_name: entry.set_name.clone(),
            product_name,
            number: entry.number.clone(),
            rarity: entry.rarity.clone(),
            condition: row.condition_label().to_string(),
            quantity: row.quantity(),
            marketplace_price: resolve_price(Some(entry), row, floor_price),
        }
    }

    /// Line item for a token nothing in the catalog matched
    pub fn token_fallback(row: &InventoryRow, product_name: &str, floor_price: f64) -> Self {
        Self {
            tcgplayer_id: None,
            product_line: DEFAULT_PRODUCT_LINE.to_string(),
            set_name: row.set_name.trim().to_string(),
            product_name: product_name.to_string(),
            number: row.collector_number.trim().to_string(),
            rarity: TOKEN_RARITY.to_string(),
            condition: row.condition_label().to_string(),
            quantity: row.quantity(),
            marketplace_price: resolve_price(None, row, floor_price),
        }
    }
}

fn serialize_price<S: Serializer>(price: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{price:.2}"))
}

/// Why a row ended up on the given-up list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GiveUpReason {
    /// Scoring produced no candidate at all
    NoCandidates,
    /// The operator chose to give up on the prompt
    OperatorGaveUp,
}

/// An input identity the run could not resolve, kept for manual follow-up
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GivenUpEntry {
    pub name: String,
    pub set_name: String,
    pub number: String,
    pub condition: String,
    pub quantity: u32,
    pub purchase_price: Option<f64>,
    pub reason: GiveUpReason,
}

impl GivenUpEntry {
    pub fn from_row(row: &InventoryRow, reason: GiveUpReason) -> Self {
        Self {
            name: row.name.trim().to_string(),
            set_name: row.set_name.trim().to_string(),
            number: row.collector_number.trim().to_string(),
            condition: row.condition_label().to_string(),
            quantity: row.quantity(),
            purchase_price: row.purchase_price(),
            reason,
        }
    }

    /// Same shape as the staged inventory, marked with the unresolved sentinel
    pub fn to_record(&self) -> ResolvedRecord {
        ResolvedRecord {
            tcgplayer_id: Some(UNRESOLVED_ID.to_string()),
            product_line: DEFAULT_PRODUCT_LINE.to_string(),
            set_name: self.set_name.clone(),
            product_name: self.name.clone(),
            number: self.number.clone(),
            rarity: String::new(),
            condition: self.condition.clone(),
            quantity: self.quantity,
            marketplace_price: self.purchase_price.unwrap_or(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(quantity: &str, condition: &str, foil: &str) -> InventoryRow {
        InventoryRow {
            name: "Sol Ring".to_string(),
            set_name: "Commander Masters".to_string(),
            quantity: quantity.to_string(),
            condition: condition.to_string(),
            foil: foil.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn quantity_defaults_to_one() {
        assert_eq!(row("3", "", "").quantity(), 3);
        assert_eq!(row("", "", "").quantity(), 1);
        assert_eq!(row("three", "", "").quantity(), 1);
        assert_eq!(row("0", "", "").quantity(), 0);
    }

    #[test]
    fn condition_label_maps_manabox_codes() {
        assert_eq!(row("1", "near_mint", "normal").condition_label().to_string(), "Near Mint");
        assert_eq!(
            row("1", "moderately_played", "foil").condition_label().to_string(),
            "Moderately Played Foil"
        );
        assert_eq!(row("1", "", "etched").condition_label().to_string(), "Near Mint Foil");
    }

    #[test]
    fn missing_set_means_no_identity() {
        let mut r = row("1", "", "");
        assert!(r.has_identity());
        r.set_name = "  ".to_string();
        assert!(!r.has_identity());
    }

    #[test]
    fn reference_entry_detects_prerelease() {
        let entry = ReferenceEntry {
            product_name: "Sheoldred (Prerelease)".to_string(),
            ..Default::default()
        };
        assert!(entry.is_prerelease());
        assert!(!ReferenceEntry::default().is_prerelease());
    }

    #[test]
    fn resolved_record_reattaches_suffix_once() {
        let entry = ReferenceEntry {
            tcgplayer_id: "12345".to_string(),
            product_name: "Lightning Bolt".to_string(),
            set_name: "Commander Masters".to_string(),
            market_price: Some("1.50".to_string()),
            ..Default::default()
        };
        let mut r = row("2", "near_mint", "foil");
        r.purchase_price = "0.10".to_string();

        let record = ResolvedRecord::from_entry(&entry, " (Showcase)", &r, 0.25);
        assert_eq!(record.product_name, "Lightning Bolt (Showcase)");
        assert_eq!(record.tcgplayer_id.as_deref(), Some("12345"));
        assert_eq!(record.product_line, DEFAULT_PRODUCT_LINE);
        assert_eq!(record.condition, "Near Mint Foil");
        assert_eq!(record.quantity, 2);
        assert_eq!(record.marketplace_price, 1.5);

        let already = ReferenceEntry {
            product_name: "Lightning Bolt (Showcase)".to_string(),
            ..entry
        };
        let record = ResolvedRecord::from_entry(&already, " (Showcase)", &r, 0.25);
        assert_eq!(record.product_name, "Lightning Bolt (Showcase)");
    }

    #[test]
    fn token_fallback_has_no_identifier() {
        let r = row("1", "lightly_played", "");
        let record = ResolvedRecord::token_fallback(&r, "Angel // Demon", 0.25);
        assert_eq!(record.tcgplayer_id, None);
        assert_eq!(record.rarity, TOKEN_RARITY);
        assert_eq!(record.product_name, "Angel // Demon");
        assert_eq!(record.condition, "Lightly Played");
        assert_eq!(record.marketplace_price, 0.25);
    }

    #[test]
    fn given_up_entry_uses_sentinel_identifier() {
        let entry = GivenUpEntry::from_row(&row("2", "near_mint", ""), GiveUpReason::NoCandidates);
        let record = entry.to_record();
        assert_eq!(record.tcgplayer_id.as_deref(), Some(UNRESOLVED_ID));
        assert_eq!(record.quantity, 2);
        assert_eq!(record.product_name, "Sol Ring");
    }
}
