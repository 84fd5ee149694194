//! Storage layer for allergyshield.
//!
//! This module provides `SQLite`-based persistent storage for allergy
//! entries, including uniqueness enforcement, ordered listing, search and
//! additive schema migration.

pub mod migrations;
pub mod schema;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::record::{AllergyRecord, DangerScale, NewAllergy};

use schema::{RECORD_COLUMNS, RECORD_ORDER};

/// Format `SQLite` uses for `CURRENT_TIMESTAMP`.
const SQLITE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Storage engine for allergy entries.
///
/// Provides persistent storage using `SQLite` with support for:
/// - Entry insertion with one row per allergen name
/// - Listing ordered by danger level
/// - Case-insensitive search over names and ingredients
/// - Replacement and deletion by id
#[derive(Debug)]
pub struct AllergyStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
    /// Valid danger levels for new and replaced entries.
    scale: DangerScale,
}

impl AllergyStore {
    /// Open or create a store at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist,
    /// then brings the schema up to date. Safe to call on every startup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] if the file cannot be opened or
    /// created, or a migration error if the schema cannot be upgraded.
    pub fn open(path: impl AsRef<Path>, scale: DangerScale) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                std::fs::create_dir_all(parent)
                    .map_err(|source| Error::storage_unavailable(path.clone(), source))?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path)
            .map_err(|source| Error::storage_unavailable(path.clone(), source))?;

        // The first statement touches the file, so an unusable path fails here.
        let journal_mode: String = conn
            .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
            .map_err(|source| Error::storage_unavailable(path.clone(), source))?;
        debug!("Journal mode: {}", journal_mode);
        conn.execute_batch("PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn, scale })
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory(scale: DangerScale) -> Result<Self> {
        let path = PathBuf::from(":memory:");
        let conn = Connection::open_in_memory()
            .map_err(|source| Error::storage_unavailable(path.clone(), source))?;

        migrations::initialize_schema(&conn)?;

        Ok(Self { path, conn, scale })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the danger scale new entries are validated against.
    #[must_use]
    pub fn scale(&self) -> DangerScale {
        self.scale
    }

    /// Add a new allergy entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty name or out-of-range level,
    /// and [`Error::DuplicateEntry`] if the name is already stored. Nothing
    /// is written in either case.
    pub fn add(&self, input: &NewAllergy) -> Result<AllergyRecord> {
        let input = input.normalized(self.scale)?;
        let created_at = Utc::now();

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            r"
            INSERT INTO allergies
                (allergen_name, danger_level, symptoms, ingredients, source, notes, created_date)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
            params![
                input.allergen_name,
                input.danger_level,
                input.symptoms,
                input.ingredients,
                input.source,
                input.notes,
                created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| duplicate_or(e, &input.allergen_name))?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        debug!("Inserted allergy '{}' with id {}", input.allergen_name, id);
        Ok(AllergyRecord {
            id,
            allergen_name: input.allergen_name,
            danger_level: input.danger_level,
            symptoms: input.symptoms,
            ingredients: input.ingredients,
            source: input.source,
            notes: input.notes,
            created_at: Some(created_at),
        })
    }

    /// Get an entry by its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get(&self, id: i64) -> Result<Option<AllergyRecord>> {
        let result = self
            .conn
            .query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM allergies WHERE id = ?1"),
                [id],
                Self::row_to_record,
            )
            .optional()?;
        Ok(result)
    }

    /// Get an entry by its exact (case-sensitive) allergen name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_by_name(&self, allergen_name: &str) -> Result<Option<AllergyRecord>> {
        let result = self
            .conn
            .query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM allergies WHERE allergen_name = ?1"),
                [allergen_name.trim()],
                Self::row_to_record,
            )
            .optional()?;
        Ok(result)
    }

    /// Replace every editable field of an existing entry.
    ///
    /// Validation is identical to [`AllergyStore::add`]. The id and creation
    /// time are kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for bad input, [`Error::NotFound`] if no
    /// entry has this id, and [`Error::DuplicateEntry`] if another entry
    /// already uses the new name.
    pub fn update(&self, id: i64, input: &NewAllergy) -> Result<AllergyRecord> {
        let input = input.normalized(self.scale)?;

        let tx = self.conn.unchecked_transaction()?;
        let affected = tx
            .execute(
                r"
                UPDATE allergies
                SET allergen_name = ?1, danger_level = ?2, symptoms = ?3,
                    ingredients = ?4, source = ?5, notes = ?6
                WHERE id = ?7
                ",
                params![
                    input.allergen_name,
                    input.danger_level,
                    input.symptoms,
                    input.ingredients,
                    input.source,
                    input.notes,
                    id,
                ],
            )
            .map_err(|e| duplicate_or(e, &input.allergen_name))?;
        if affected == 0 {
            return Err(Error::NotFound { id });
        }

        let record = tx.query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM allergies WHERE id = ?1"),
            [id],
            Self::row_to_record,
        )?;
        tx.commit()?;

        debug!("Updated allergy {} ('{}')", id, record.allergen_name);
        Ok(record)
    }

    /// List every entry, most dangerous first.
    ///
    /// Ties on danger level are broken by allergen name ascending.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_all(&self) -> Result<Vec<AllergyRecord>> {
        self.list(None)
    }

    /// List the entries with exactly the given danger level.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_by_level(&self, danger_level: i64) -> Result<Vec<AllergyRecord>> {
        self.list(Some(danger_level))
    }

    fn list(&self, danger_level: Option<i64>) -> Result<Vec<AllergyRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM allergies WHERE (?1 IS NULL OR danger_level = ?1) {RECORD_ORDER}"
        ))?;

        let records = stmt
            .query_map([danger_level], Self::row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Search entries by allergen name or ingredients.
    ///
    /// Performs a case-insensitive substring match. An empty (or
    /// whitespace-only) query matches every entry. Results use the same
    /// ordering as [`AllergyStore::list_all`].
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn search(&self, query: &str) -> Result<Vec<AllergyRecord>> {
        self.search_at_level(query, None)
    }

    /// Search entries, optionally restricted to one danger level.
    ///
    /// Case folding is Unicode-aware, so `SÉSAME` finds `Sésame`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn search_at_level(
        &self,
        query: &str,
        danger_level: Option<i64>,
    ) -> Result<Vec<AllergyRecord>> {
        let needle = query.trim().to_lowercase();
        let records: Vec<AllergyRecord> = self
            .list(danger_level)?
            .into_iter()
            .filter(|record| {
                needle.is_empty()
                    || contains_folded(&record.allergen_name, &needle)
                    || record
                        .ingredients
                        .as_deref()
                        .is_some_and(|ingredients| contains_folded(ingredients, &needle))
            })
            .collect();

        debug!("Search '{}' matched {} entries", query, records.len());
        Ok(records)
    }

    /// Delete an entry by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no entry has this id.
    pub fn delete(&self, id: i64) -> Result<()> {
        let affected = self
            .conn
            .execute("DELETE FROM allergies WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(Error::NotFound { id });
        }
        debug!("Deleted allergy {}", id);
        Ok(())
    }

    /// Count stored entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM allergies", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Get store statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StoreStats> {
        let total_entries = self.count()?;

        let mut stmt = self.conn.prepare(
            "SELECT danger_level, COUNT(*) FROM allergies GROUP BY danger_level",
        )?;
        let by_level = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<BTreeMap<i64, i64>, _>>()?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path)?.len() + file_len_if_exists(&self.wal_path())?
        };

        Ok(StoreStats {
            total_entries,
            by_level,
            db_size_bytes,
        })
    }

    /// Path of the write-ahead log that sits next to the database file.
    fn wal_path(&self) -> PathBuf {
        let mut wal = self.path.as_os_str().to_owned();
        wal.push("-wal");
        PathBuf::from(wal)
    }

    /// Convert a database row to an `AllergyRecord`.
    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<AllergyRecord> {
        let id: i64 = row.get(0)?;
        let created_raw = match row.get::<_, Option<String>>(7) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Unreadable created_date on allergy {}: {}", id, e);
                None
            }
        };

        let created_at = created_raw.as_deref().and_then(|raw| {
            let parsed = parse_timestamp(raw);
            if parsed.is_none() {
                warn!("Unreadable created_date '{}' on allergy {}", raw, id);
            }
            parsed
        });

        Ok(AllergyRecord {
            id,
            allergen_name: row.get(1)?,
            danger_level: row.get(2)?,
            symptoms: row.get(3)?,
            ingredients: row.get(4)?,
            source: row.get(5)?,
            notes: row.get(6)?,
            created_at,
        })
    }
}

/// Map a unique-constraint failure to [`Error::DuplicateEntry`].
fn duplicate_or(err: rusqlite::Error, allergen_name: &str) -> Error {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Error::DuplicateEntry {
                allergen_name: allergen_name.to_string(),
            }
        }
        _ => err.into(),
    }
}

/// Size of `path` in bytes, or zero if it does not exist.
fn file_len_if_exists(path: &Path) -> Result<u64> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e.into()),
    }
}

/// Substring match after lowercasing `haystack`; `needle` is already lowercase.
fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Parse a stored timestamp written either by this crate (RFC 3339) or by
/// `SQLite`'s `CURRENT_TIMESTAMP` default.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, SQLITE_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Statistics about the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Total number of entries stored.
    pub total_entries: i64,
    /// Entry count per danger level.
    pub by_level: BTreeMap<i64, i64>,
    /// Size of the database file plus its write-ahead log, in bytes.
    pub db_size_bytes: u64,
}
