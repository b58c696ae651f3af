//! TCG Staging - Manabox inventory to TCGplayer staging upload
//!
//! Resolves scanned inventory rows against a TCGplayer reference catalog,
//! asking the operator only when the match scores are not conclusive, and
//! merges the results into one line item per product and condition.

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod pricing;
pub mod prompt;
pub mod resolver;
pub mod scoring;
pub mod session;
pub mod token;

pub use aggregate::merge;
pub use catalog::{Catalog, CatalogStats};
pub use config::{ResolverConfig, ScoreWeights};
pub use error::{Result, StagingError};
pub use models::{GiveUpReason, GivenUpEntry, InventoryRow, ReferenceEntry, ResolvedRecord};
pub use prompt::{Choice, GiveUpPrompter, Prompter, ScriptedPrompter, TerminalPrompter};
pub use resolver::{MatchResolver, MatchSource, Resolution};
pub use session::{RowOutcome, RunSummary, StagingOutput, StagingSession};
