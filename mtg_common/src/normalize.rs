//! Card identity normalization.
//!
//! Turns the loosely formatted (name, set, condition, number) of an inventory
//! scan or a marketplace catalog row into a [`NormalizedKey`] so that both
//! sides can be compared for identity.

use crate::condition::Condition;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Separator between the faces of a multi-faced card name
pub const FACE_SEPARATOR: &str = "//";

/// Canonical set string for the "The List" reprint sheet
pub const LIST_SET: &str = "the list reprints";

/// Marker appended to the normalized name of foil copies
pub const FOIL_MARKER: &str = "foil";

lazy_static! {
    static ref PARENTHETICAL: Regex =
        Regex::new(r"\s*\([^()]*\)").expect("parenthetical pattern is valid");
}

/// Set aliases, keyed by normalized set string
const SET_ALIASES: &[(&str, &str)] = &[
    ("plst", LIST_SET),
    ("the list", LIST_SET),
    (
        "universes beyond the lord of the rings tales of middleearth",
        "the lord of the rings tales of middleearth",
    ),
    ("ltr", "the lord of the rings tales of middleearth"),
    (
        "universes beyond commander the lord of the rings tales of middleearth",
        "commander the lord of the rings tales of middleearth",
    ),
    (
        "tales of middleearth commander",
        "commander the lord of the rings tales of middleearth",
    ),
    ("ltc", "commander the lord of the rings tales of middleearth"),
];

/// Canonical lookup key for a card.
///
/// Equality and hashing only consider `name`, `set`, `number` and
/// `condition`. The `suffix` is the parenthetical text removed from the
/// name; it is carried along so it can be reattached to the product name
/// of the final record.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedKey {
    pub name: String,
    pub set: String,
    pub number: String,
    pub condition: String,
    pub suffix: String,
}

impl NormalizedKey {
    /// The four fields that make up card identity
    pub fn identity(&self) -> (&str, &str, &str, &str) {
        (&self.name, &self.set, &self.number, &self.condition)
    }

    /// Returns true if the key describes a foil copy
    pub fn is_foil(&self) -> bool {
        self.condition
            .split_whitespace()
            .any(|word| word == FOIL_MARKER)
    }

    /// Condition grade, ignoring the foil marker
    pub fn grade(&self) -> Option<Condition> {
        Condition::parse(&self.condition)
    }
}

impl PartialEq for NormalizedKey {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for NormalizedKey {}

impl Hash for NormalizedKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | #{} | {}",
            self.name, self.set, self.number, self.condition
        )
    }
}

/// Normalize a raw card identity into a lookup key.
///
/// Returns `None` when the set is a prerelease product; those are never
/// matched.
pub fn normalize(name: &str, set: &str, condition: &str, number: &str) -> Option<NormalizedKey> {
    let (stripped_name, suffix) = split_suffix(name);
    let normalized_set = normalize_set(set);

    if is_prerelease(&normalized_set) {
        log::debug!("Excluding prerelease set '{}' for '{}'", set, name);
        return None;
    }

    let mut normalized_name = normalize_name(front_face(&stripped_name));
    let normalized_condition = normalize_condition(condition);
    if is_foil_text(condition) && !ends_with_foil_marker(&normalized_name) {
        if !normalized_name.is_empty() {
            normalized_name.push(' ');
        }
        normalized_name.push_str(FOIL_MARKER);
    }

    let number = if normalized_set == LIST_SET {
        // List numbers look like "MH2-123"; only the trailing segment identifies the card
        number.rsplit('-').next().unwrap_or(number)
    } else {
        number
    };

    Some(NormalizedKey {
        name: normalized_name,
        set: normalized_set,
        number: clean_collector_number(number),
        condition: normalized_condition,
        suffix,
    })
}

/// Remove every `(...)` group from a name.
///
/// Returns the trimmed name and the removed text (with its leading space),
/// e.g. `"Lightning Bolt (Showcase)"` gives `("Lightning Bolt", " (Showcase)")`.
pub fn split_suffix(name: &str) -> (String, String) {
    let suffix: String = PARENTHETICAL
        .find_iter(name)
        .map(|m| m.as_str())
        .collect();
    let stripped = PARENTHETICAL.replace_all(name, " ");
    (collapse_whitespace(&stripped), suffix)
}

/// Text before the face separator, or the whole name for single-faced cards
pub fn front_face(name: &str) -> &str {
    name.split(FACE_SEPARATOR).next().unwrap_or(name).trim()
}

/// All faces of a name, trimmed, without empty parts
pub fn split_faces(name: &str) -> Vec<&str> {
    name.split(FACE_SEPARATOR)
        .map(str::trim)
        .filter(|face| !face.is_empty())
        .collect()
}

/// Returns true if the name carries more than one face
pub fn has_multiple_faces(name: &str) -> bool {
    split_faces(name).len() > 1
}

/// Lowercase, fold diacritics, keep letters, digits, space, comma, apostrophe and hyphen
pub fn normalize_name(name: &str) -> String {
    let folded = strip_diacritics(name).replace(&['\u{2018}', '\u{2019}'][..], "'");
    let kept: String = folded
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | ',' | '\'' | '-'))
        .collect();
    collapse_whitespace(&kept).to_lowercase()
}

/// Lowercase, fold diacritics, keep letters, digits and space, then resolve aliases
pub fn normalize_set(set: &str) -> String {
    let folded = strip_diacritics(set);
    let kept: String = folded
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect();
    let normalized = collapse_whitespace(&kept).to_lowercase();
    resolve_set_alias(&normalized).to_string()
}

fn resolve_set_alias(set: &str) -> &str {
    SET_ALIASES
        .iter()
        .find(|(alias, _)| *alias == set)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(set)
}

/// Canonical condition string: ladder label lowercased, plus "foil" for foil copies.
/// Conditions not on the ladder are kept lowercased with underscores as spaces.
pub fn normalize_condition(condition: &str) -> String {
    let foil = is_foil_text(condition);
    match Condition::parse(condition) {
        Some(grade) if foil => format!("{} {}", grade.as_str().to_lowercase(), FOIL_MARKER),
        Some(grade) => grade.as_str().to_lowercase(),
        None => collapse_whitespace(&condition.replace('_', " ")).to_lowercase(),
    }
}

/// Drop leading non-digit characters, then keep only digits and hyphens
pub fn clean_collector_number(number: &str) -> String {
    number
        .trim()
        .trim_start_matches(|c: char| !c.is_ascii_digit())
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .collect()
}

/// Fold accented characters to their base letter ("Lim-Dûl" becomes "Lim-Dul").
/// Ligatures that have no decomposition are expanded.
pub fn strip_diacritics(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.nfd() {
        if is_combining_mark(c) {
            continue;
        }
        match c {
            'æ' => out.push_str("ae"),
            'Æ' => out.push_str("Ae"),
            'œ' => out.push_str("oe"),
            'Œ' => out.push_str("Oe"),
            'ß' => out.push_str("ss"),
            _ => out.push(c),
        }
    }
    out
}

/// Returns true if a normalized set names a prerelease product
pub fn is_prerelease(normalized_set: &str) -> bool {
    normalized_set.contains("prerelease")
}

fn is_foil_text(text: &str) -> bool {
    text.to_lowercase().contains(FOIL_MARKER)
}

fn ends_with_foil_marker(name: &str) -> bool {
    name == FOIL_MARKER || name.ends_with(&format!(" {}", FOIL_MARKER))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
