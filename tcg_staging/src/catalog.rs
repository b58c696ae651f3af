//! TCGplayer reference catalog loading and lookup

use crate::error::{Result, StagingError};
use crate::models::ReferenceEntry;
use indexmap::IndexMap;
use mtg_common::{normalize, Condition, NormalizedKey};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Counters collected while building the catalog index
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct CatalogStats {
    pub rows_read: usize,
    pub missing_set: usize,
    pub prerelease_excluded: usize,
    pub dropped_by_normalization: usize,
    /// Rows whose key was already indexed; the later row replaced the earlier one
    pub duplicates_overwritten: usize,
}

/// Reference entries indexed by normalized key.
///
/// Rows that normalize to the same key overwrite each other, last row wins.
/// Iteration follows the order keys were first seen in the source.
#[derive(Debug, Default)]
pub struct Catalog {
    entries: IndexMap<NormalizedKey, ReferenceEntry>,
    stats: CatalogStats,
}

impl Catalog {
    /// Load the catalog from a CSV file.
    ///
    /// A missing or unreadable file is fatal for the run and reported as
    /// [`StagingError::ReferenceUnavailable`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading reference catalog from {}", path.display());

        let file = File::open(path).map_err(|source| StagingError::ReferenceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file).map_err(|err| match err {
            StagingError::Csv(e) if e.is_io_error() => StagingError::ReferenceUnavailable {
                path: path.to_path_buf(),
                source: std::io::Error::from(e),
            },
            other => other,
        })
    }

    /// Load the catalog from any CSV source with TCGplayer headers
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for result in rdr.deserialize() {
            let entry: ReferenceEntry = result?;
            rows.push(entry);
        }

        Ok(Self::from_entries(rows))
    }

    /// Build the index from already parsed rows
    pub fn from_entries<I: IntoIterator<Item = ReferenceEntry>>(rows: I) -> Self {
        let mut catalog = Self::default();

        for entry in rows {
            catalog.stats.rows_read += 1;

            if entry.set_name.trim().is_empty() {
                catalog.stats.missing_set += 1;
                continue;
            }

            if entry.product_name.to_lowercase().contains("prerelease") {
                log::debug!("Excluding prerelease entry: {}", entry.product_name);
                catalog.stats.prerelease_excluded += 1;
                continue;
            }

            let Some(key) = Self::key_for(&entry) else {
                catalog.stats.dropped_by_normalization += 1;
                continue;
            };

            if let Some(previous) = catalog.entries.insert(key, entry) {
                log::debug!(
                    "Duplicate catalog key, replacing TCGplayer Id {} ({})",
                    previous.tcgplayer_id,
                    previous.product_name
                );
                catalog.stats.duplicates_overwritten += 1;
            }
        }

        let stats = &catalog.stats;
        log::info!(
            "Indexed {} catalog entries from {} rows ({} without set, {} prerelease, {} unmatched, {} duplicates overwritten)",
            catalog.entries.len(),
            stats.rows_read,
            stats.missing_set,
            stats.prerelease_excluded,
            stats.dropped_by_normalization,
            stats.duplicates_overwritten
        );

        catalog
    }

    /// Normalized key of a catalog row; rows without a condition are Near Mint
    pub fn key_for(entry: &ReferenceEntry) -> Option<NormalizedKey> {
        let condition = if entry.condition.trim().is_empty() {
            Condition::NearMint.as_str()
        } else {
            entry.condition.as_str()
        };
        normalize(&entry.product_name, &entry.set_name, condition, &entry.number)
    }

    /// Exact lookup by normalized key
    pub fn lookup(&self, key: &NormalizedKey) -> Option<&ReferenceEntry> {
        self.entries.get(key)
    }

    /// Exact lookup returning the stored key as well
    pub fn lookup_key_value(&self, key: &NormalizedKey) -> Option<(&NormalizedKey, &ReferenceEntry)> {
        self.entries.get_key_value(key)
    }

    /// All indexed keys in load order
    pub fn all_keys(&self) -> impl Iterator<Item = &NormalizedKey> {
        self.entries.keys()
    }

    /// Iterate over keys and entries in load order
    pub fn iter(&self) -> impl Iterator<Item = (&NormalizedKey, &ReferenceEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> &CatalogStats {
        &self.stats
    }
}

#[cfg(test)]
pub use tests::make_entry;

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
