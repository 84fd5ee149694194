//! CSV and JSON import/export.
//!
//! Exports write every entry in listing order. CSV imports go through
//! [`AllergyStore::add`] row by row, so each accepted row obeys the same
//! validation and uniqueness rules as an interactive add. A failing row is
//! reported in the summary and does not stop the import; a storage failure
//! does, leaving the rows already imported in place.

use std::collections::HashMap;
use std::io::{Read, Write};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::DuplicatePolicy;
use crate::error::{Error, Result};
use crate::record::{DangerScale, NewAllergy};
use crate::storage::AllergyStore;

/// Column headers written by [`export_csv`].
pub const CSV_HEADERS: [&str; 8] = [
    "id",
    "allergen_name",
    "danger_level",
    "symptoms",
    "ingredients",
    "source",
    "notes",
    "created_date",
];

/// Outcome of a CSV import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Rows inserted as new entries.
    pub imported: usize,
    /// Rows that overwrote an existing entry.
    pub updated: usize,
    /// Rows left out because the allergen already existed.
    pub skipped: usize,
    /// One message per rejected row.
    pub errors: Vec<String>,
}

impl ImportSummary {
    /// Total rows that changed the store.
    #[must_use]
    pub fn written(&self) -> usize {
        self.imported + self.updated
    }
}

/// Write every entry as CSV. Returns the number of entries written.
///
/// # Errors
///
/// Returns an error if reading the store or writing the output fails.
pub fn export_csv<W: Write>(store: &AllergyStore, writer: W) -> Result<usize> {
    let records = store.list_all()?;
    let mut out = csv::Writer::from_writer(writer);

    out.write_record(CSV_HEADERS)?;
    for record in &records {
        out.write_record([
            record.id.to_string(),
            record.allergen_name.clone(),
            record.danger_level.to_string(),
            record.symptoms.clone().unwrap_or_default(),
            record.ingredients.clone().unwrap_or_default(),
            record.source.clone().unwrap_or_default(),
            record.notes.clone().unwrap_or_default(),
            record
                .created_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
        ])?;
    }
    out.flush()?;

    info!("Exported {} entries as CSV", records.len());
    Ok(records.len())
}

/// Write every entry as a pretty-printed JSON array. Returns the number of
/// entries written.
///
/// # Errors
///
/// Returns an error if reading the store or writing the output fails.
pub fn export_json<W: Write>(store: &AllergyStore, writer: W) -> Result<usize> {
    let records = store.list_all()?;
    serde_json::to_writer_pretty(writer, &records)?;

    info!("Exported {} entries as JSON", records.len());
    Ok(records.len())
}

/// Import entries from CSV.
///
/// The first row must be a header. Header names are matched
/// case-insensitively and unknown columns are ignored. A blank danger level
/// falls back to the scale's minimum.
///
/// # Errors
///
/// Returns an error only for storage failures; bad rows are recorded in
/// [`ImportSummary::errors`].
pub fn import_csv<R: Read>(
    store: &AllergyStore,
    reader: R,
    policy: DuplicatePolicy,
) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    let mut rows = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = match rows.headers() {
        Ok(headers) => headers.clone(),
        Err(e) => {
            summary.errors.push(format!("Unreadable header row: {e}"));
            return Ok(summary);
        }
    };
    if headers.iter().all(str::is_empty) {
        summary.errors.push("CSV file has no header row".to_string());
        return Ok(summary);
    }

    let columns = ColumnMap::from_headers(&headers);
    if !columns.has("allergen_name") {
        summary
            .errors
            .push("CSV header has no allergen_name column".to_string());
        return Ok(summary);
    }

    for (index, row) in rows.records().enumerate() {
        let row_number = index + 2;
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                summary.errors.push(format!("Row {row_number}: {e}"));
                continue;
            }
        };

        let input = match columns.to_input(&row, store.scale()) {
            Ok(input) => input,
            Err(message) => {
                summary.errors.push(format!("Row {row_number}: {message}"));
                continue;
            }
        };

        match store.add(&input) {
            Ok(record) => {
                debug!("Row {}: imported '{}'", row_number, record.allergen_name);
                summary.imported += 1;
            }
            Err(Error::DuplicateEntry { allergen_name }) => match policy {
                DuplicatePolicy::Skip => {
                    debug!("Row {}: skipped existing '{}'", row_number, allergen_name);
                    summary.skipped += 1;
                }
                DuplicatePolicy::Update => {
                    if let Some(existing) = store.find_by_name(&allergen_name)? {
                        store.update(existing.id, &input)?;
                        summary.updated += 1;
                    } else {
                        summary.skipped += 1;
                    }
                }
            },
            Err(e @ Error::Validation { .. }) => {
                summary.errors.push(format!("Row {row_number}: {e}"));
            }
            Err(e) => return Err(e),
        }
    }

    if !summary.errors.is_empty() {
        warn!("CSV import rejected {} rows", summary.errors.len());
    }
    info!(
        "CSV import: {} imported, {} updated, {} skipped",
        summary.imported, summary.updated, summary.skipped
    );
    Ok(summary)
}

/// Position of each known column in the header row.
struct ColumnMap {
    positions: HashMap<String, usize>,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut positions = HashMap::new();
        for (index, name) in headers.iter().enumerate() {
            // First occurrence wins when a header repeats.
            positions.entry(name.to_lowercase()).or_insert(index);
        }
        Self { positions }
    }

    fn has(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }

    fn field<'r>(&self, row: &'r csv::StringRecord, column: &str) -> Option<&'r str> {
        self.positions
            .get(column)
            .and_then(|&index| row.get(index))
            .filter(|value| !value.is_empty())
    }

    fn to_input(
        &self,
        row: &csv::StringRecord,
        scale: DangerScale,
    ) -> std::result::Result<NewAllergy, String> {
        let allergen_name = self
            .field(row, "allergen_name")
            .ok_or_else(|| "missing allergen_name".to_string())?;

        let danger_level = match self.field(row, "danger_level") {
            None => scale.min,
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| format!("danger_level '{raw}' is not a whole number"))?,
        };

        Ok(NewAllergy {
            allergen_name: allergen_name.to_string(),
            danger_level,
            symptoms: self.field(row, "symptoms").map(ToString::to_string),
            ingredients: self.field(row, "ingredients").map(ToString::to_string),
            source: self.field(row, "source").map(ToString::to_string),
            notes: self.field(row, "notes").map(ToString::to_string),
        })
    }
}
