//! Candidate scoring.
//!
//! A [`Scorer`] rates how likely a catalog key is to be the card described by
//! a query key. [`rank_candidates`] applies a scorer to a set of catalog
//! entries and returns them best first.

use crate::config::ScoreWeights;
use crate::models::ReferenceEntry;
use mtg_common::normalize::is_prerelease;
use mtg_common::NormalizedKey;
use std::collections::HashSet;

/// Print treatments that distinguish otherwise identical printings
const SPECIAL_PRINT_KEYWORDS: &[&str] = &["foil", "showcase", "etched", "borderless", "extended", "gilded"];

/// Scoring strategy; higher means more likely the same card
pub trait Scorer {
    fn score(&self, query: &NormalizedKey, candidate: &NormalizedKey) -> f64;
}

/// A catalog entry together with its score against the query
#[derive(Debug, Clone, Copy)]
pub struct ScoredCandidate<'a> {
    pub key: &'a NormalizedKey,
    pub entry: &'a ReferenceEntry,
    pub score: f64,
}

/// Name similarity plus additive adjustments for set, number, condition and
/// print treatment agreement
#[derive(Debug, Clone, Default)]
pub struct WeightedScorer {
    weights: ScoreWeights,
}

impl WeightedScorer {
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    fn number_adjustment(&self, query: &str, candidate: &str) -> f64 {
        if query.is_empty() || candidate.is_empty() || query == candidate {
            self.weights.number_match
        } else {
            self.weights.number_mismatch
        }
    }

    fn grade_adjustment(&self, query: &NormalizedKey, candidate: &NormalizedKey) -> f64 {
        match (query.grade(), candidate.grade()) {
            (Some(q), Some(c)) => match q.distance(c) {
                0 => self.weights.grade_same,
                1 => self.weights.grade_adjacent,
                _ => self.weights.grade_distant,
            },
            _ => 0.0,
        }
    }

    fn keyword_adjustment(&self, query: &NormalizedKey, candidate: &NormalizedKey) -> f64 {
        let query_words = print_words(query);
        let candidate_words = print_words(candidate);

        SPECIAL_PRINT_KEYWORDS
            .iter()
            .filter(|keyword| query_words.contains(*keyword) != candidate_words.contains(*keyword))
            .map(|keyword| {
                if *keyword == "foil" {
                    self.weights.foil_keyword_mismatch
                } else {
                    self.weights.print_keyword_mismatch
                }
            })
            .sum()
    }
}

impl Scorer for WeightedScorer {
    fn score(&self, query: &NormalizedKey, candidate: &NormalizedKey) -> f64 {
        let w = &self.weights;
        let mut score = name_similarity(&query.name, &candidate.name);

        if query.set == candidate.set {
            score += w.set_match;
        }

        score += self.number_adjustment(&query.number, &candidate.number);

        score += if query.condition == candidate.condition {
            w.condition_match
        } else {
            w.condition_mismatch
        };

        if names_contain(&query.name, &candidate.name) {
            score += w.name_containment;
        }

        score += self.grade_adjustment(query, candidate);
        score += self.keyword_adjustment(query, candidate);

        score
    }
}

/// Indel similarity ratio of two names on a 0-100 scale
///
/// `2 * LCS / (len(a) + len(b))`, so a single transposition costs two edits.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    rapidfuzz::fuzz::ratio(a.chars(), b.chars()) * 100.0
}

/// Returns true if either non-empty name contains the other
pub(crate) fn names_contain(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

fn print_words(key: &NormalizedKey) -> HashSet<&str> {
    key.name
        .split_whitespace()
        .chain(key.condition.split_whitespace())
        .collect()
}

/// Cheap rejection of candidates that cannot be the same card: the names
/// start with different characters and share no word
fn plausible_name(query: &str, candidate: &str) -> bool {
    if query.is_empty() || candidate.is_empty() {
        return true;
    }
    if query.chars().next() == candidate.chars().next() {
        return true;
    }
    let query_words: HashSet<&str> = query.split_whitespace().collect();
    candidate
        .split_whitespace()
        .any(|word| query_words.contains(word))
}

/// Score every candidate against the query and return them best first.
///
/// Prerelease entries are never returned. Candidates with equal scores keep
/// the order they were supplied in.
pub fn rank_candidates<'a, S, I>(
    scorer: &S,
    query: &NormalizedKey,
    candidates: I,
    prefilter: bool,
) -> Vec<ScoredCandidate<'a>>
where
    S: Scorer + ?Sized,
    I: IntoIterator<Item = (&'a NormalizedKey, &'a ReferenceEntry)>,
{
    let mut ranked: Vec<ScoredCandidate<'a>> = candidates
        .into_iter()
        .filter(|(key, entry)| !entry.is_prerelease() && !is_prerelease(&key.set))
        .filter(|(key, _)| !prefilter || plausible_name(&query.name, &key.name))
        .map(|(key, entry)| ScoredCandidate {
            key,
            entry,
            score: scorer.score(query, key),
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

#[cfg(test)]
#[path = "scoring_tests.rs"]
mod tests;
