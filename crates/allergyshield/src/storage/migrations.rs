//! Database migration system for allergyshield.
//!
//! The schema version lives in the `metadata` table. Databases written by
//! older builds carry no version at all and start at 0; every pending step
//! is applied in order inside a single transaction, so an interrupted
//! upgrade leaves the previous schema untouched.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::schema::{
    ADDITIVE_COLUMNS, ALLERGIES_TABLE, CREATE_ALLERGIES_TABLE, CREATE_DANGER_INDEX,
    CREATE_METADATA_TABLE, CREATE_NAME_INDEX,
};

/// The current schema version.
pub const CURRENT_VERSION: i32 = 3;

/// Key used to store the schema version in the metadata table.
const VERSION_KEY: &str = "schema_version";

/// Initialize the database schema.
///
/// Creates the metadata table if needed, then runs any pending migrations
/// to bring the schema up to the current version. Safe to call on every
/// startup.
///
/// # Errors
///
/// Returns an error if schema creation or migration fails.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_METADATA_TABLE, [])?;

    let version = get_schema_version(conn)?;
    if version > CURRENT_VERSION {
        return Err(Error::DatabaseMigration {
            message: format!(
                "database schema version {version} is newer than supported version {CURRENT_VERSION}"
            ),
        });
    }
    if version < CURRENT_VERSION {
        let tx = conn.unchecked_transaction()?;
        run_migrations(&tx, version)?;
        tx.commit()?;
        info!(
            "Migrated database schema from version {} to {}",
            version, CURRENT_VERSION
        );
    }

    Ok(())
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (fresh or legacy database).
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let result: std::result::Result<String, rusqlite::Error> = conn.query_row(
        "SELECT value FROM metadata WHERE key = ?1",
        [VERSION_KEY],
        |row| row.get(0),
    );

    match result {
        Ok(value) => value.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {value}"),
        }),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e.into()),
    }
}

/// Set the schema version in the database.
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}

/// Run migrations from the given version to the current version.
fn run_migrations(conn: &Connection, from_version: i32) -> Result<()> {
    let mut current = from_version;

    while current < CURRENT_VERSION {
        current += 1;
        debug!("Applying schema migration {}", current);
        run_migration(conn, current)?;
    }

    set_schema_version(conn, CURRENT_VERSION)?;
    Ok(())
}

/// Run a specific migration version.
fn run_migration(conn: &Connection, version: i32) -> Result<()> {
    match version {
        1 => migrate_v1(conn),
        2 => migrate_v2(conn),
        3 => migrate_v3(conn),
        _ => Err(Error::DatabaseMigration {
            message: format!("unknown migration version: {version}"),
        }),
    }
}

/// Migration to version 1: the base table.
///
/// Legacy databases already have it, so creation is conditional.
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_ALLERGIES_TABLE, [])?;
    Ok(())
}

/// Migration to version 2: additive columns.
///
/// Some legacy databases were created with `source` already present;
/// only columns that are actually missing get added.
fn migrate_v2(conn: &Connection) -> Result<()> {
    let existing = table_columns(conn, ALLERGIES_TABLE)?;
    for (column, column_type) in ADDITIVE_COLUMNS {
        if existing.iter().any(|c| c == column) {
            debug!("Column {} already present", column);
            continue;
        }
        conn.execute(
            &format!("ALTER TABLE {ALLERGIES_TABLE} ADD COLUMN {column} {column_type}"),
            [],
        )?;
        info!("Added column {} to {}", column, ALLERGIES_TABLE);
    }
    Ok(())
}

/// Migration to version 3: uniqueness and ordering indexes.
fn migrate_v3(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_NAME_INDEX, [])
        .map_err(|e| Error::DatabaseMigration {
            message: format!("cannot enforce unique allergen names: {e}"),
        })?;
    conn.execute(CREATE_DANGER_INDEX, [])?;
    Ok(())
}

/// List the column names of `table`.
///
/// # Errors
///
/// Returns an error if the table cannot be inspected.
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
    let columns = stmt
        .query_map([table], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(columns)
}
