//! Match resolution.
//!
//! For each query key the resolver walks cached → exact → scored, then either
//! auto-confirms the top candidate or asks the operator. Every confirmation
//! is remembered for the rest of the run so identical keys are resolved once.

use crate::catalog::Catalog;
use crate::config::ResolverConfig;
use crate::error::{Result, StagingError};
use crate::models::{GiveUpReason, ReferenceEntry};
use crate::prompt::{CandidateSummary, Choice, Prompter, QueryIdentity};
use crate::scoring::{rank_candidates, ScoredCandidate, Scorer, WeightedScorer};
use log::{debug, info, warn};
use mtg_common::NormalizedKey;
use std::collections::HashMap;

/// What to do with a ranked candidate list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    NoCandidates,
    AutoConfirm,
    NeedsInput,
}

/// Pure threshold check on a best-first candidate list.
///
/// The top candidate is accepted when it reaches `auto_confirm_score`, or when
/// it reaches `secondary_score` and leads the runner-up by `lead_margin`. A
/// lone candidate has no runner-up and always leads.
pub fn decide(candidates: &[ScoredCandidate<'_>], config: &ResolverConfig) -> Decision {
    let Some((top, rest)) = candidates.split_first() else {
        return Decision::NoCandidates;
    };

    if top.score >= config.auto_confirm_score {
        return Decision::AutoConfirm;
    }

    let leads = rest
        .first()
        .map_or(true, |runner_up| top.score - runner_up.score >= config.lead_margin);
    if top.score >= config.secondary_score && leads {
        Decision::AutoConfirm
    } else {
        Decision::NeedsInput
    }
}

/// How a match was confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    Cached,
    Exact,
    AutoConfirmed,
    Operator,
}

/// Result of resolving one key
#[derive(Debug, Clone, Copy)]
pub enum Resolution<'c> {
    Matched {
        key: &'c NormalizedKey,
        entry: &'c ReferenceEntry,
        source: MatchSource,
    },
    Abandoned(GiveUpReason),
}

/// Query keys already resolved in this run, mapped to the chosen catalog key
#[derive(Debug, Default)]
pub struct ConfirmedMatchCache {
    matches: HashMap<NormalizedKey, NormalizedKey>,
}

impl ConfirmedMatchCache {
    pub fn get(&self, query: &NormalizedKey) -> Option<&NormalizedKey> {
        self.matches.get(query)
    }

    pub fn insert(&mut self, query: NormalizedKey, catalog_key: NormalizedKey) {
        self.matches.insert(query, catalog_key);
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Resolves query keys against one catalog, owning the run's confirmation cache
pub struct MatchResolver<'c> {
    catalog: &'c Catalog,
    scorer: Box<dyn Scorer>,
    config: ResolverConfig,
    confirmed: ConfirmedMatchCache,
}

impl<'c> MatchResolver<'c> {
    /// Resolver using the weighted scorer configured by `config.weights`
    pub fn new(catalog: &'c Catalog, config: ResolverConfig) -> Self {
        let scorer = WeightedScorer::new(config.weights.clone());
        Self::with_scorer(catalog, config, Box::new(scorer))
    }

    /// Resolver with a custom scoring strategy
    pub fn with_scorer(catalog: &'c Catalog, config: ResolverConfig, scorer: Box<dyn Scorer>) -> Self {
        Self {
            catalog,
            scorer,
            config,
            confirmed: ConfirmedMatchCache::default(),
        }
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn cache(&self) -> &ConfirmedMatchCache {
        &self.confirmed
    }

    /// Resolve a key, asking `prompter` when the scores are not conclusive.
    ///
    /// Only cancellation or a failing prompt surface produce `Err`.
    pub fn resolve(&mut self, key: &NormalizedKey, prompter: &mut dyn Prompter) -> Result<Resolution<'c>> {
        let catalog = self.catalog;

        if let Some((catalog_key, entry)) = self.cached(key) {
            debug!("Using confirmed match for {}: {}", key, entry.product_name);
            return Ok(Resolution::Matched {
                key: catalog_key,
                entry,
                source: MatchSource::Cached,
            });
        }

        if let Some((catalog_key, entry)) = catalog.lookup_key_value(key) {
            debug!("Exact match for {}: {}", key, entry.product_name);
            self.confirm(key, catalog_key);
            return Ok(Resolution::Matched {
                key: catalog_key,
                entry,
                source: MatchSource::Exact,
            });
        }

        let candidates = rank_candidates(
            self.scorer.as_ref(),
            key,
            catalog.iter(),
            self.config.prefilter,
        );

        match decide(&candidates, &self.config) {
            Decision::NoCandidates => {
                warn!(
                    "No match found for card: {} from set {} with number {}",
                    key.name, key.set, key.number
                );
                Ok(Resolution::Abandoned(GiveUpReason::NoCandidates))
            }
            Decision::AutoConfirm => {
                let top = candidates[0];
                info!(
                    "Automatically confirming: {} | Set: {} | Card Number: {} | Score: {:.0}",
                    top.entry.product_name, top.entry.set_name, top.entry.number, top.score
                );
                self.confirm(key, top.key);
                Ok(Resolution::Matched {
                    key: top.key,
                    entry: top.entry,
                    source: MatchSource::AutoConfirmed,
                })
            }
            Decision::NeedsInput => {
                let query = QueryIdentity::from_key(key);
                match self.ask_operator(&query, &candidates, prompter)? {
                    Some(chosen) => {
                        info!(
                            "Operator confirmed: {} | Set: {} | Card Number: {}",
                            chosen.entry.product_name, chosen.entry.set_name, chosen.entry.number
                        );
                        self.confirm(key, chosen.key);
                        Ok(Resolution::Matched {
                            key: chosen.key,
                            entry: chosen.entry,
                            source: MatchSource::Operator,
                        })
                    }
                    None => {
                        info!("Operator gave up on {}", query);
                        Ok(Resolution::Abandoned(GiveUpReason::OperatorGaveUp))
                    }
                }
            }
        }
    }

    /// Previously confirmed catalog entry for a key
    pub fn cached(&self, key: &NormalizedKey) -> Option<(&'c NormalizedKey, &'c ReferenceEntry)> {
        let catalog: &'c Catalog = self.catalog;
        self.confirmed
            .get(key)
            .and_then(|catalog_key| catalog.lookup_key_value(catalog_key))
    }

    /// Remember that `query` resolves to `catalog_key` for the rest of the run
    pub fn confirm(&mut self, query: &NormalizedKey, catalog_key: &NormalizedKey) {
        self.confirmed.insert(query.clone(), catalog_key.clone());
    }

    /// Offer the best candidates to the operator.
    ///
    /// Returns the chosen candidate, or `None` when the operator gives up.
    pub fn ask_operator<'a>(
        &self,
        query: &QueryIdentity,
        candidates: &[ScoredCandidate<'a>],
        prompter: &mut dyn Prompter,
    ) -> Result<Option<ScoredCandidate<'a>>> {
        let offered = &candidates[..candidates.len().min(self.config.max_prompt_candidates)];
        if offered.is_empty() {
            return Ok(None);
        }

        let summaries: Vec<CandidateSummary> = offered.iter().map(summarize).collect();
        match prompter.choose(query, &summaries)? {
            Choice::Select(index) => match offered.get(index) {
                Some(candidate) => Ok(Some(*candidate)),
                None => {
                    warn!("Selection {} is out of range, treating as give up", index);
                    Ok(None)
                }
            },
            Choice::GiveUp => Ok(None),
            Choice::Abort => Err(StagingError::Cancelled),
        }
    }
}

fn summarize(candidate: &ScoredCandidate<'_>) -> CandidateSummary {
    CandidateSummary {
        name: candidate.entry.product_name.clone(),
        set: candidate.entry.set_name.clone(),
        number: candidate.entry.number.clone(),
        condition: candidate.entry.condition.clone(),
        score: candidate.score,
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
