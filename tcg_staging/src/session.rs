//! One staging run: inventory rows in, merged line items and a given-up list out.

use crate::aggregate::merge;
use crate::catalog::Catalog;
use crate::config::ResolverConfig;
use crate::error::Result;
use crate::models::{GiveUpReason, GivenUpEntry, InventoryRow, ResolvedRecord};
use crate::prompt::Prompter;
use crate::resolver::{MatchResolver, MatchSource, Resolution};
use crate::token::{is_token, resolve_token, TokenResolution};
use log::{debug, info, warn};
use mtg_common::normalize::{is_prerelease, normalize, normalize_set};
use serde::Serialize;

/// Why a row was left out without asking anyone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No name or no set
    MissingIdentity,
    Prerelease,
}

/// What happened to one inventory row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Resolved(MatchSource),
    /// Unmatched token staged from its own row
    TokenFallback,
    Skipped(SkipReason),
    Abandoned(GiveUpReason),
}

/// Counters for a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub rows_read: usize,
    pub exact: usize,
    pub cached: usize,
    pub auto_confirmed: usize,
    pub operator_confirmed: usize,
    pub token_fallbacks: usize,
    pub skipped_missing_identity: usize,
    pub skipped_prerelease: usize,
    pub given_up: usize,
    /// Line items after merging
    pub staged_lines: usize,
    /// Copies across all staged line items
    pub staged_quantity: u64,
}

impl RunSummary {
    fn record(&mut self, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Resolved(MatchSource::Exact) => self.exact += 1,
            RowOutcome::Resolved(MatchSource::Cached) => self.cached += 1,
            RowOutcome::Resolved(MatchSource::AutoConfirmed) => self.auto_confirmed += 1,
            RowOutcome::Resolved(MatchSource::Operator) => self.operator_confirmed += 1,
            RowOutcome::TokenFallback => self.token_fallbacks += 1,
            RowOutcome::Skipped(SkipReason::MissingIdentity) => self.skipped_missing_identity += 1,
            RowOutcome::Skipped(SkipReason::Prerelease) => self.skipped_prerelease += 1,
            RowOutcome::Abandoned(_) => self.given_up += 1,
        }
    }

    pub fn resolved(&self) -> usize {
        self.exact + self.cached + self.auto_confirmed + self.operator_confirmed
    }
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct StagingOutput {
    /// Merged line items, in order of first appearance
    pub records: Vec<ResolvedRecord>,
    pub given_up: Vec<GivenUpEntry>,
    pub summary: RunSummary,
}

/// Drives rows through resolution one at a time, in input order
pub struct StagingSession<'c, P: Prompter> {
    resolver: MatchResolver<'c>,
    prompter: P,
    records: Vec<ResolvedRecord>,
    given_up: Vec<GivenUpEntry>,
    summary: RunSummary,
}

impl<'c, P: Prompter> StagingSession<'c, P> {
    pub fn new(catalog: &'c Catalog, config: ResolverConfig, prompter: P) -> Self {
        Self::with_resolver(MatchResolver::new(catalog, config), prompter)
    }

    pub fn with_resolver(resolver: MatchResolver<'c>, prompter: P) -> Self {
        Self {
            resolver,
            prompter,
            records: Vec::new(),
            given_up: Vec::new(),
            summary: RunSummary::default(),
        }
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn given_up(&self) -> &[GivenUpEntry] {
        &self.given_up
    }

    /// Resolve every row. Stops at the first error, which is only ever a
    /// cancellation or a failing prompt.
    pub fn process_rows<I: IntoIterator<Item = InventoryRow>>(&mut self, rows: I) -> Result<()> {
        for row in rows {
            self.process_row(&row)?;
        }
        Ok(())
    }

    /// Resolve one row and stage its line item
    pub fn process_row(&mut self, row: &InventoryRow) -> Result<RowOutcome> {
        self.summary.rows_read += 1;
        let outcome = self.resolve_row(row)?;
        self.summary.record(outcome);
        Ok(outcome)
    }

    fn resolve_row(&mut self, row: &InventoryRow) -> Result<RowOutcome> {
        if !row.has_identity() {
            warn!(
                "Skipping row without name or set: '{}' / '{}'",
                row.name.trim(),
                row.set_name.trim()
            );
            return Ok(RowOutcome::Skipped(SkipReason::MissingIdentity));
        }

        if is_prerelease(&normalize_set(&row.set_name)) {
            info!("Skipping prerelease card: {} from set {}", row.name, row.set_name);
            return Ok(RowOutcome::Skipped(SkipReason::Prerelease));
        }

        if is_token(row) {
            return self.resolve_token_row(row);
        }

        let condition = row.condition_label().to_string();
        let Some(key) = normalize(&row.name, &row.set_name, &condition, &row.collector_number) else {
            info!("Skipping invalid or prerelease card: {} from set {}", row.name, row.set_name);
            return Ok(RowOutcome::Skipped(SkipReason::Prerelease));
        };
        debug!("Resolving {}", key);

        let floor_price = self.resolver.config().floor_price;
        match self.resolver.resolve(&key, &mut self.prompter)? {
            Resolution::Matched { entry, source, .. } => {
                self.records
                    .push(ResolvedRecord::from_entry(entry, &key.suffix, row, floor_price));
                Ok(RowOutcome::Resolved(source))
            }
            Resolution::Abandoned(reason) => {
                warn!(
                    "Giving up on {} from set {} with number {} ({:?})",
                    row.name, row.set_name, row.collector_number, reason
                );
                self.given_up.push(GivenUpEntry::from_row(row, reason));
                Ok(RowOutcome::Abandoned(reason))
            }
        }
    }

    fn resolve_token_row(&mut self, row: &InventoryRow) -> Result<RowOutcome> {
        let floor_price = self.resolver.config().floor_price;
        match resolve_token(&mut self.resolver, row, &mut self.prompter)? {
            TokenResolution::Matched { entry, source, .. } => {
                self.records
                    .push(ResolvedRecord::from_entry(entry, "", row, floor_price));
                Ok(RowOutcome::Resolved(source))
            }
            TokenResolution::Fallback { product_name } => {
                self.records
                    .push(ResolvedRecord::token_fallback(row, &product_name, floor_price));
                Ok(RowOutcome::TokenFallback)
            }
        }
    }

    /// Merge the staged line items and hand everything back
    pub fn finish(self) -> StagingOutput {
        let records = merge(self.records);
        let mut summary = self.summary;
        summary.staged_lines = records.len();
        summary.staged_quantity = records.iter().map(|r| u64::from(r.quantity)).sum();

        info!(
            "Processed {} rows: {} resolved ({} exact, {} cached, {} auto, {} operator), {} token fallbacks, {} skipped, {} given up",
            summary.rows_read,
            summary.resolved(),
            summary.exact,
            summary.cached,
            summary.auto_confirmed,
            summary.operator_confirmed,
            summary.token_fallbacks,
            summary.skipped_missing_identity + summary.skipped_prerelease,
            summary.given_up
        );
        info!(
            "Staged {} line items ({} copies)",
            summary.staged_lines, summary.staged_quantity
        );

        if !self.given_up.is_empty() {
            warn!("{} cards need manual follow-up:", self.given_up.len());
            for entry in &self.given_up {
                warn!(
                    "  {} | Set: {} | Card Number: {} | {} | x{}",
                    entry.name, entry.set_name, entry.number, entry.condition, entry.quantity
                );
            }
        }

        StagingOutput {
            records,
            given_up: self.given_up,
            summary,
        }
    }
}
