//! `SQLite` schema definitions for allergyshield.
//!
//! The `allergies` table starts from the column set older databases were
//! created with; later columns and indexes arrive through migrations.

/// Name of the allergy table.
pub const ALLERGIES_TABLE: &str = "allergies";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// SQL statement to create the base allergies table.
pub const CREATE_ALLERGIES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS allergies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    allergen_name TEXT NOT NULL UNIQUE,
    danger_level INTEGER NOT NULL,
    symptoms TEXT,
    ingredients TEXT,
    notes TEXT,
    created_date TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)
";

/// SQL statement to enforce one row per allergen name.
pub const CREATE_NAME_INDEX: &str = r"
CREATE UNIQUE INDEX IF NOT EXISTS idx_allergies_name ON allergies(allergen_name)
";

/// SQL statement to create an index supporting the danger-level ordering.
pub const CREATE_DANGER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_allergies_danger ON allergies(danger_level DESC, allergen_name)
";

/// Columns added after the base table, in the order they are applied.
///
/// `created_date` is listed for databases that predate it; `SQLite` cannot
/// add it with its `CURRENT_TIMESTAMP` default, so such rows read back
/// without a creation time.
pub const ADDITIVE_COLUMNS: &[(&str, &str)] = &[("source", "TEXT"), ("created_date", "TIMESTAMP")];

/// Column list used by every record query, in `row_to_record` order.
pub const RECORD_COLUMNS: &str =
    "id, allergen_name, danger_level, symptoms, ingredients, source, notes, created_date";

/// Ordering shared by listing and search.
pub const RECORD_ORDER: &str = "ORDER BY danger_level DESC, allergen_name ASC, id ASC";
