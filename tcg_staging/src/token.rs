//! Token resolution.
//!
//! Tokens are matched against the token sub-catalog only, by comparing
//! printed faces rather than full keys. Double-sided tokens list both faces
//! in one product name, so the question "does the card in hand have a back
//! face" decides which half of the sub-catalog is searched.

use crate::catalog::Catalog;
use crate::error::Result;
use crate::models::{InventoryRow, ReferenceEntry};
use crate::prompt::{Prompter, QueryIdentity};
use crate::resolver::{MatchResolver, MatchSource};
use crate::scoring::{name_similarity, names_contain, ScoredCandidate};
use lazy_static::lazy_static;
use log::{debug, info};
use mtg_common::normalize::{
    clean_collector_number, has_multiple_faces, normalize_condition, normalize_name, normalize_set,
    split_faces, split_suffix,
};
use mtg_common::NormalizedKey;
use regex::Regex;

const TOKEN_WORD: &str = "token";
const TOKEN_SET_SUFFIX: &str = " tokens";

lazy_static! {
    /// Token set codes are a "T" in front of the parent set code, e.g. TMOM
    static ref TOKEN_SET_CODE: Regex =
        Regex::new(r"(?i)^T([A-Z0-9]{3})$").expect("token set code pattern is valid");
    static ref TOKEN_BOILERPLATE: Regex =
        Regex::new(r"(?i)\b(?:double[- ]sided\s+)?tokens?\b").expect("token boilerplate pattern is valid");
    static ref DOUBLE_SIDED: Regex =
        Regex::new(r"(?i)\bdouble[- ]sided\b").expect("double-sided pattern is valid");
}

/// Returns true if the row describes a token rather than a card
pub fn is_token(row: &InventoryRow) -> bool {
    row.name.to_lowercase().contains(TOKEN_WORD)
        || row.set_name.to_lowercase().contains(TOKEN_WORD)
        || TOKEN_SET_CODE.is_match(row.set_code.trim())
}

/// Token set name derived from a token set code: `TMOM` gives `mom tokens`
pub fn token_set_from_code(code: &str) -> Option<String> {
    TOKEN_SET_CODE
        .captures(code.trim())
        .map(|caps| format!("{}{}", caps[1].to_lowercase(), TOKEN_SET_SUFFIX))
}

/// Normalized token set name derived from a set name
pub fn token_set_from_name(set_name: &str) -> Option<String> {
    let normalized = normalize_set(set_name);
    if normalized.is_empty() {
        None
    } else if normalized.ends_with(TOKEN_SET_SUFFIX) {
        Some(normalized)
    } else {
        Some(format!("{}{}", normalized, TOKEN_SET_SUFFIX))
    }
}

/// Remove "token" and "double-sided token" wording from a face
pub fn strip_token_boilerplate(face: &str) -> String {
    TOKEN_BOILERPLATE
        .replace_all(face, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized face text used for comparison
pub fn clean_face(face: &str) -> String {
    let (stripped, _) = split_suffix(face);
    normalize_name(&strip_token_boilerplate(&stripped))
}

/// Cleaned faces of a token name, without empty ones
pub fn token_faces(name: &str) -> Vec<String> {
    let (stripped, _) = split_suffix(name);
    split_faces(&stripped)
        .into_iter()
        .map(clean_face)
        .filter(|face| !face.is_empty())
        .collect()
}

/// Product name for a token line item: faces joined by " // " with the
/// token wording removed. Falls back to the raw name if nothing is left.
pub fn merged_product_name(name: &str) -> String {
    let faces: Vec<String> = split_faces(name)
        .into_iter()
        .map(strip_token_boilerplate)
        .filter(|face| !face.is_empty())
        .collect();

    if faces.is_empty() {
        name.trim().to_string()
    } else {
        faces.join(" // ")
    }
}

/// Returns true if a catalog product lists two printed faces
pub fn is_two_faced_entry(entry: &ReferenceEntry) -> bool {
    has_multiple_faces(&entry.product_name) || DOUBLE_SIDED.is_match(&entry.product_name)
}

/// A token row prepared for matching
#[derive(Debug, Clone)]
pub struct TokenQuery {
    pub faces: Vec<String>,
    /// Candidate token set names, code-derived first
    pub set_names: Vec<String>,
    pub product_name: String,
    /// Cache key for this token identity
    pub key: NormalizedKey,
    pub identity: QueryIdentity,
}

impl TokenQuery {
    pub fn from_row(row: &InventoryRow) -> Self {
        let mut set_names = Vec::new();
        for derived in [token_set_from_code(&row.set_code), token_set_from_name(&row.set_name)]
            .into_iter()
            .flatten()
        {
            if !set_names.contains(&derived) {
                set_names.push(derived);
            }
        }

        let faces = token_faces(&row.name);
        let condition = row.condition_label().to_string();
        let primary_set = set_names.first().cloned().unwrap_or_default();
        let number = clean_collector_number(&row.collector_number);

        let key = NormalizedKey {
            name: faces.join(" // "),
            set: primary_set.clone(),
            number: number.clone(),
            condition: normalize_condition(&condition),
            suffix: String::new(),
        };
        let identity = QueryIdentity {
            name: row.name.trim().to_string(),
            set: primary_set,
            number,
            condition,
        };

        Self {
            faces,
            set_names,
            product_name: merged_product_name(&row.name),
            key,
            identity,
        }
    }

    /// Returns true if the scanned name already shows two faces
    pub fn has_two_faces(&self) -> bool {
        self.faces.len() > 1
    }

    /// Entry belongs to the token sub-catalog of this query's set
    pub fn in_subcatalog(&self, key: &NormalizedKey, entry: &ReferenceEntry) -> bool {
        let mentions_token =
            key.set.contains(TOKEN_WORD) || entry.product_name.to_lowercase().contains(TOKEN_WORD);
        if !mentions_token {
            return false;
        }

        self.set_names.iter().any(|derived| {
            let base = derived.trim_end_matches(TOKEN_SET_SUFFIX);
            key.set == *derived || (!base.is_empty() && key.set.contains(base))
        })
    }

    /// Best face similarity if any face pair matches by containment or by
    /// a similarity above `threshold`
    pub fn face_score(&self, entry: &ReferenceEntry, threshold: f64) -> Option<f64> {
        let entry_faces = token_faces(&entry.product_name);
        let mut best: Option<f64> = None;

        for query_face in &self.faces {
            for entry_face in &entry_faces {
                let similarity = name_similarity(query_face, entry_face);
                if names_contain(query_face, entry_face) || similarity > threshold {
                    best = Some(best.map_or(similarity, |b| b.max(similarity)));
                }
            }
        }

        best
    }

    /// Sub-catalog candidates with the requested sidedness, best face first
    pub fn candidates<'c>(&self, catalog: &'c Catalog, two_faced: bool, threshold: f64) -> Vec<ScoredCandidate<'c>> {
        let mut candidates: Vec<ScoredCandidate<'c>> = catalog
            .iter()
            .filter(|(key, entry)| {
                !entry.is_prerelease()
                    && self.in_subcatalog(key, entry)
                    && is_two_faced_entry(entry) == two_faced
            })
            .filter_map(|(key, entry)| {
                self.face_score(entry, threshold)
                    .map(|score| ScoredCandidate { key, entry, score })
            })
            .collect();

        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates
    }
}

/// Outcome of resolving a token row
#[derive(Debug, Clone)]
pub enum TokenResolution<'c> {
    Matched {
        key: &'c NormalizedKey,
        entry: &'c ReferenceEntry,
        source: MatchSource,
    },
    /// Nothing confirmed; the row becomes a line item of its own
    Fallback { product_name: String },
}

/// Resolve a token row against the token sub-catalog.
///
/// Candidates are always confirmed by the operator. A token is never
/// dropped: when nothing is confirmed the caller gets a fallback.
pub fn resolve_token<'c>(
    resolver: &mut MatchResolver<'c>,
    row: &InventoryRow,
    prompter: &mut dyn Prompter,
) -> Result<TokenResolution<'c>> {
    let query = TokenQuery::from_row(row);

    if let Some((key, entry)) = resolver.cached(&query.key) {
        debug!("Using confirmed token match for {}: {}", query.identity, entry.product_name);
        return Ok(TokenResolution::Matched {
            key,
            entry,
            source: MatchSource::Cached,
        });
    }

    let two_faced = if query.has_two_faces() {
        true
    } else {
        prompter.is_double_sided(&query.identity)?
    };

    let catalog = resolver.catalog();
    let threshold = resolver.config().token_face_similarity;
    let candidates = query.candidates(catalog, two_faced, threshold);
    debug!(
        "{} token candidates for {} (double-sided: {})",
        candidates.len(),
        query.identity,
        two_faced
    );

    if let Some(chosen) = resolver.ask_operator(&query.identity, &candidates, prompter)? {
        info!(
            "Operator confirmed token: {} | Set: {} | Card Number: {}",
            chosen.entry.product_name, chosen.entry.set_name, chosen.entry.number
        );
        resolver.confirm(&query.key, chosen.key);
        return Ok(TokenResolution::Matched {
            key: chosen.key,
            entry: chosen.entry,
            source: MatchSource::Operator,
        });
    }

    info!(
        "No catalog match for token {}, staging it as '{}'",
        query.identity, query.product_name
    );
    Ok(TokenResolution::Fallback {
        product_name: query.product_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::make_entry;
    use crate::config::ResolverConfig;
    use crate::prompt::{Choice, ScriptedPrompter};

    const MOM_TOKENS: &str = "March of the Machine Tokens";

    fn token_row(name: &str) -> InventoryRow {
        InventoryRow {
            name: name.to_string(),
            set_code: "TMOM".to_string(),
            set_name: MOM_TOKENS.to_string(),
            collector_number: "1".to_string(),
            condition: "near_mint".to_string(),
            quantity: "1".to_string(),
            ..Default::default()
        }
    }

    fn token_catalog() -> Catalog {
        Catalog::from_entries(vec![
            make_entry("t1", "Angel // Demon Double-Sided Token", MOM_TOKENS, "1", "Near Mint"),
            make_entry("t2", "Angel Token", MOM_TOKENS, "2", "Near Mint"),
            make_entry("t3", "Angel // Demon Double-Sided Token", "Wilds of Eldraine Tokens", "1", "Near Mint"),
            make_entry("c1", "Serra Angel", "Dominaria United", "33", "Near Mint"),
        ])
    }

    #[test]
    fn detects_tokens_by_name_set_or_code() {
        assert!(is_token(&token_row("Angel")));

        let mut by_name = token_row("Soldier Token");
        by_name.set_code = "MOM".to_string();
        by_name.set_name = "March of the Machine".to_string();
        assert!(is_token(&by_name));

        let card = InventoryRow {
            name: "Sol Ring".to_string(),
            set_code: "CMM".to_string(),
            set_name: "Commander Masters".to_string(),
            ..Default::default()
        };
        assert!(!is_token(&card));
    }

    #[test]
    fn derives_token_set_names() {
        assert_eq!(token_set_from_code("TMOM").as_deref(), Some("mom tokens"));
        assert_eq!(token_set_from_code("MOM"), None);
        assert_eq!(token_set_from_code("TSR"), None);
        assert_eq!(
            token_set_from_name("March of the Machine").as_deref(),
            Some("march of the machine tokens")
        );
        assert_eq!(
            token_set_from_name(MOM_TOKENS).as_deref(),
            Some("march of the machine tokens")
        );
    }

    #[test]
    fn double_sided_boilerplate_is_removed_from_faces() {
        let query = TokenQuery::from_row(&token_row("Angel // Demon Double-Sided Token"));
        assert_eq!(query.faces, vec!["angel", "demon"]);
        assert_eq!(query.set_names[0], "mom tokens");
        assert!(query.has_two_faces());
        assert_eq!(query.product_name, "Angel // Demon");
    }

    #[test]
    fn merged_name_falls_back_to_raw_name() {
        assert_eq!(merged_product_name("Token"), "Token");
        assert_eq!(merged_product_name("Treasure Token"), "Treasure");
    }

    #[test]
    fn two_faced_entries_are_recognized() {
        assert!(is_two_faced_entry(&make_entry("1", "Angel // Demon", "x", "1", "")));
        assert!(is_two_faced_entry(&make_entry("1", "Angel Double-Sided Token", "x", "1", "")));
        assert!(!is_two_faced_entry(&make_entry("1", "Angel Token", "x", "1", "")));
    }

    #[test]
    fn subcatalog_is_restricted_to_the_token_set() {
        let catalog = token_catalog();
        let query = TokenQuery::from_row(&token_row("Angel // Demon Double-Sided Token"));
        let ids: Vec<&str> = query
            .candidates(&catalog, true, 70.0)
            .iter()
            .map(|c| c.entry.tcgplayer_id.as_str())
            .collect();
        assert_eq!(ids, vec!["t1"]);
    }

    #[test]
    fn misspelled_face_still_matches_above_cut_off() {
        let query = TokenQuery::from_row(&token_row("Angle"));
        let entry = make_entry("t2", "Angel Token", MOM_TOKENS, "2", "Near Mint");
        let score = query.face_score(&entry, 70.0).unwrap();
        assert!((score - 80.0).abs() < 1e-9);
        assert_eq!(query.face_score(&entry, 80.0), None);
    }

    #[test]
    fn two_faced_scan_is_matched_without_asking_sidedness() {
        let catalog = token_catalog();
        let mut resolver = MatchResolver::new(&catalog, ResolverConfig::default());
        // A queued "false" would hide t1 if the question were asked
        let mut prompter = ScriptedPrompter::new([Choice::Select(0)]).with_double_sided([false]);
        let row = token_row("Angel // Demon Double-Sided Token");

        match resolve_token(&mut resolver, &row, &mut prompter).unwrap() {
            TokenResolution::Matched { entry, source, .. } => {
                assert_eq!(entry.tcgplayer_id, "t1");
                assert_eq!(source, MatchSource::Operator);
            }
            other => panic!("expected a match, got {other:?}"),
        }

        match resolve_token(&mut resolver, &row, &mut prompter).unwrap() {
            TokenResolution::Matched { source, .. } => assert_eq!(source, MatchSource::Cached),
            other => panic!("expected a cached match, got {other:?}"),
        }
        assert_eq!(prompter.asked.len(), 1);
    }

    #[test]
    fn single_faced_answer_searches_single_faced_tokens() {
        let catalog = token_catalog();
        let mut resolver = MatchResolver::new(&catalog, ResolverConfig::default());
        let mut prompter = ScriptedPrompter::new([Choice::Select(0)]).with_double_sided([false]);

        match resolve_token(&mut resolver, &token_row("Angel"), &mut prompter).unwrap() {
            TokenResolution::Matched { entry, .. } => assert_eq!(entry.tcgplayer_id, "t2"),
            other => panic!("expected a match, got {other:?}"),
        }
        let offered = &prompter.asked[0].1;
        assert_eq!(offered.len(), 1);
        assert_eq!(offered[0].name, "Angel Token");
    }

    #[test]
    fn double_sided_answer_searches_two_faced_tokens() {
        let catalog = token_catalog();
        let mut resolver = MatchResolver::new(&catalog, ResolverConfig::default());
        let mut prompter = ScriptedPrompter::new([Choice::Select(0)]).with_double_sided([true]);

        match resolve_token(&mut resolver, &token_row("Angel"), &mut prompter).unwrap() {
            TokenResolution::Matched { entry, .. } => assert_eq!(entry.tcgplayer_id, "t1"),
            other => panic!("expected a match, got {other:?}"),
        }
    }

    #[test]
    fn giving_up_yields_fallback() {
        let catalog = token_catalog();
        let mut resolver = MatchResolver::new(&catalog, ResolverConfig::default());
        let mut prompter = ScriptedPrompter::new([Choice::GiveUp]);
        let row = token_row("Angel // Demon Double-Sided Token");

        match resolve_token(&mut resolver, &row, &mut prompter).unwrap() {
            TokenResolution::Fallback { product_name } => assert_eq!(product_name, "Angel // Demon"),
            other => panic!("expected a fallback, got {other:?}"),
        }
        assert!(resolver.cache().is_empty());
    }

    #[test]
    fn unknown_token_falls_back_without_prompting() {
        let catalog = token_catalog();
        let mut resolver = MatchResolver::new(&catalog, ResolverConfig::default());
        let mut prompter = ScriptedPrompter::default();

        let resolution = resolve_token(&mut resolver, &token_row("Zombie Army Token"), &mut prompter).unwrap();
        assert!(matches!(resolution, TokenResolution::Fallback { .. }));
        assert!(prompter.asked.is_empty());
    }
}
