//! Reading inventory exports and writing staged output

use crate::catalog::CatalogStats;
use crate::error::{Result, StagingError};
use crate::models::{GivenUpEntry, InventoryRow, ResolvedRecord};
use crate::session::{RunSummary, StagingOutput};
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Column order of the TCGplayer staging upload
pub const OUTPUT_HEADERS: [&str; 9] = [
    "TCGplayer Id",
    "Product Line",
    "Set Name",
    "Product Name",
    "Number",
    "Rarity",
    "Condition",
    "Add to Quantity",
    "TCG Marketplace Price",
];

/// Read a Manabox collection export
pub fn read_inventory<P: AsRef<Path>>(path: P) -> Result<Vec<InventoryRow>> {
    let path = path.as_ref();
    log::info!("Reading inventory from {}", path.display());
    let file = File::open(path)?;
    inventory_from_reader(file)
}

/// Parse inventory rows from any CSV source with Manabox headers
pub fn inventory_from_reader<R: Read>(reader: R) -> Result<Vec<InventoryRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: InventoryRow = result?;
        rows.push(row);
    }

    log::info!("Read {} inventory rows", rows.len());
    Ok(rows)
}

/// Write `contents` next to `path` first and move it into place when done,
/// so a failed write leaves any previous file untouched
fn write_atomically<P, F>(path: P, contents: F) -> Result<()>
where
    P: AsRef<Path>,
    F: FnOnce(&mut File) -> Result<()>,
{
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    contents(tmp.as_file_mut())?;
    tmp.as_file_mut().flush()?;
    tmp.persist(path).map_err(|e| StagingError::Io(e.error))?;
    Ok(())
}

/// Write line items in the staging upload format.
///
/// The header row is written even when there are no records.
pub fn write_records<P: AsRef<Path>>(path: P, records: &[ResolvedRecord]) -> Result<()> {
    let path = path.as_ref();
    write_atomically(path, |file| {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        wtr.write_record(OUTPUT_HEADERS)?;
        for record in records {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        Ok(())
    })?;

    log::info!("Wrote {} line items to {}", records.len(), path.display());
    Ok(())
}

/// Write the given-up list in the upload format, marked as unresolved
pub fn write_given_up<P: AsRef<Path>>(path: P, entries: &[GivenUpEntry]) -> Result<()> {
    let records: Vec<ResolvedRecord> = entries.iter().map(GivenUpEntry::to_record).collect();
    write_records(path, &records)
}

/// JSON summary of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// RFC 3339 timestamp
    pub generated_at: String,
    pub input: String,
    pub reference: String,
    pub catalog: CatalogStats,
    pub summary: RunSummary,
    pub given_up: Vec<GivenUpEntry>,
}

impl RunReport {
    pub fn new(input: &Path, reference: &Path, catalog: &CatalogStats, output: &StagingOutput) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            input: input.display().to_string(),
            reference: reference.display().to_string(),
            catalog: catalog.clone(),
            summary: output.summary.clone(),
            given_up: output.given_up.clone(),
        }
    }
}

pub fn write_report<P: AsRef<Path>>(path: P, report: &RunReport) -> Result<()> {
    let path = path.as_ref();
    write_atomically(path, |file| {
        serde_json::to_writer_pretty(&mut *file, report)?;
        file.write_all(b"\n")?;
        Ok(())
    })?;
    log::info!("Wrote run report to {}", path.display());
    Ok(())
}
