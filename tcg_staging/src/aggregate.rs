//! Line item merging.

use crate::models::ResolvedRecord;
use indexmap::IndexMap;

/// Grouping key for a staged line item
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum MergeKey {
    /// Catalog identifier and resolved condition
    Catalog { id: String, condition: String },
    /// Records without identifier (token fallbacks) group by what they describe
    Unlisted {
        product_name: String,
        set_name: String,
        condition: String,
    },
}

impl MergeKey {
    fn of(record: &ResolvedRecord) -> Self {
        match &record.tcgplayer_id {
            Some(id) => MergeKey::Catalog {
                id: id.clone(),
                condition: record.condition.clone(),
            },
            None => MergeKey::Unlisted {
                product_name: record.product_name.clone(),
                set_name: record.set_name.clone(),
                condition: record.condition.clone(),
            },
        }
    }
}

/// Merge records that share identity and condition, summing quantities.
///
/// Every other field comes from the first record of a group, and groups keep
/// the order of their first appearance.
pub fn merge<I: IntoIterator<Item = ResolvedRecord>>(records: I) -> Vec<ResolvedRecord> {
    let mut merged: IndexMap<MergeKey, ResolvedRecord> = IndexMap::new();

    for record in records {
        let key = MergeKey::of(&record);
        match merged.get_mut(&key) {
            Some(existing) => {
                existing.quantity = match existing.quantity.checked_add(record.quantity) {
                    Some(total) => total,
                    None => {
                        log::warn!(
                            "Quantity of {} ({}) exceeds {}, capping",
                            existing.product_name,
                            existing.condition,
                            u32::MAX
                        );
                        u32::MAX
                    }
                };
            }
            None => {
                merged.insert(key, record);
            }
        }
    }

    merged.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: Option<&str>, name: &str, condition: &str, quantity: u32) -> ResolvedRecord {
        ResolvedRecord {
            tcgplayer_id: id.map(str::to_string),
            product_line: "Magic: The Gathering".to_string(),
            set_name: "Commander Masters".to_string(),
            product_name: name.to_string(),
            number: "410".to_string(),
            rarity: "U".to_string(),
            condition: condition.to_string(),
            quantity,
            marketplace_price: 1.0,
        }
    }

    #[test]
    fn sums_quantities_of_same_identity_and_condition() {
        let merged = merge(vec![
            record(Some("12345"), "Sol Ring", "Near Mint", 2),
            record(Some("12345"), "Sol Ring", "Near Mint", 3),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].quantity, 5);
    }

    #[test]
    fn keeps_conditions_apart_and_first_fields() {
        let mut later = record(Some("12345"), "Sol Ring (Showcase)", "Near Mint", 1);
        later.marketplace_price = 9.0;

        let merged = merge(vec![
            record(Some("12345"), "Sol Ring", "Near Mint", 1),
            record(Some("12345"), "Sol Ring", "Lightly Played", 1),
            later,
        ]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].condition, "Near Mint");
        assert_eq!(merged[0].product_name, "Sol Ring");
        assert_eq!(merged[0].marketplace_price, 1.0);
        assert_eq!(merged[0].quantity, 2);
        assert_eq!(merged[1].condition, "Lightly Played");
    }

    #[test]
    fn distinct_fallback_tokens_are_not_merged() {
        let merged = merge(vec![
            record(None, "Angel", "Near Mint", 1),
            record(None, "Demon", "Near Mint", 1),
            record(None, "Angel", "Near Mint", 2),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].product_name, "Angel");
        assert_eq!(merged[0].quantity, 3);
    }

    #[test]
    fn merging_twice_changes_nothing() {
        let once = merge(vec![
            record(Some("1"), "Sol Ring", "Near Mint", 2),
            record(Some("2"), "Counterspell", "Near Mint", 1),
            record(Some("1"), "Sol Ring", "Near Mint", 4),
        ]);
        let twice = merge(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(merge(Vec::new()).is_empty());
    }

    #[test]
    fn quantities_saturate_instead_of_overflowing() {
        let merged = merge(vec![
            record(Some("12345"), "Sol Ring", "Near Mint", 3_000_000_000),
            record(Some("12345"), "Sol Ring", "Near Mint", 3_000_000_000),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].quantity, u32::MAX);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        const IDS: [Option<&str>; 3] = [Some("1"), Some("2"), None];
        const NAMES: [&str; 2] = ["Sol Ring", "Zombie Army"];
        const CONDITIONS: [&str; 3] = ["Near Mint", "Near Mint Foil", "Lightly Played"];

        fn arb_records() -> impl Strategy<Value = Vec<ResolvedRecord>> {
            proptest::collection::vec((0..IDS.len(), 0..NAMES.len(), 0..CONDITIONS.len(), 1u32..1000), 0..20)
                .prop_map(|picks| {
                    picks
                        .into_iter()
                        .map(|(id, name, condition, quantity)| {
                            record(IDS[id], NAMES[name], CONDITIONS[condition], quantity)
                        })
                        .collect()
                })
        }

        proptest! {
            /// Merged output is already fully merged.
            #[test]
            fn prop_merge_is_idempotent(records in arb_records()) {
                let once = merge(records);
                let twice = merge(once.clone());
                prop_assert_eq!(once, twice);
            }

            /// Merging never loses or invents quantity.
            #[test]
            fn prop_merge_keeps_total_quantity(records in arb_records()) {
                let before: u64 = records.iter().map(|r| u64::from(r.quantity)).sum();
                let after: u64 = merge(records).iter().map(|r| u64::from(r.quantity)).sum();
                prop_assert_eq!(before, after);
            }
        }
    }
}
