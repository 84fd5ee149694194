//! Error types for allergyshield.
//!
//! Every fallible store operation reports one of these variants to the caller.
//! The front end decides how to phrase them for the user.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for allergyshield operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Input Errors ===
    /// A field of an allergy entry failed validation.
    #[error("invalid {field}: {message}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// Description of the validation failure.
        message: String,
    },

    /// An entry with the same allergen name already exists.
    #[error("allergen '{allergen_name}' already exists")]
    DuplicateEntry {
        /// The name that collided.
        allergen_name: String,
    },

    /// No entry exists with the given id.
    #[error("no allergy entry with id {id}")]
    NotFound {
        /// The id that was looked up.
        id: i64,
    },

    // === Storage Errors ===
    /// The backing store could not be opened or created.
    #[error("storage unavailable at {path}: {source}")]
    StorageUnavailable {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV reading or writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// A specialized Result type for allergyshield operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a validation error for the named field.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Create a storage-unavailable error.
    #[must_use]
    pub fn storage_unavailable(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::StorageUnavailable {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Check if this error is an input validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this error is a uniqueness violation.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateEntry { .. })
    }

    /// Check if this error is a missing-entry lookup.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error means the backing store could not be reached.
    #[must_use]
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, Self::StorageUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_names_field() {
        let err = Error::validation("danger_level", "must be between 1 and 10, got 11");
        let msg = err.to_string();
        assert!(msg.contains("danger_level"));
        assert!(msg.contains("got 11"));
        assert!(err.is_validation());
    }

    #[test]
    fn test_duplicate_display() {
        let err = Error::DuplicateEntry {
            allergen_name: "Peanuts".to_string(),
        };
        assert_eq!(err.to_string(), "allergen 'Peanuts' already exists");
        assert!(err.is_duplicate());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_display() {
        let err = Error::NotFound { id: 42 };
        assert_eq!(err.to_string(), "no allergy entry with id 42");
        assert!(err.is_not_found());
        assert!(!err.is_duplicate());
    }

    #[test]
    fn test_storage_unavailable_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::storage_unavailable("/root/forbidden/allergies.db", io_err);
        let msg = err.to_string();
        assert!(msg.contains("/root/forbidden/allergies.db"));
        assert!(msg.contains("access denied"));
        assert!(err.is_storage_unavailable());
    }

    #[test]
    fn test_storage_unavailable_keeps_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::storage_unavailable("/tmp/x.db", io_err);
        let source = std::error::Error::source(&err);
        assert!(source.is_some());
        assert_eq!(source.unwrap().to_string(), "gone");
    }

    #[test]
    fn test_from_csv_error() {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader("a,b\nc\n".as_bytes());
        let csv_err = reader
            .records()
            .find_map(std::result::Result::err)
            .expect("ragged rows should fail");
        let err: Error = csv_err.into();
        assert!(matches!(err, Error::Csv(_)));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let err: Error = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, Error::DatabaseQuery(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_database_migration_error_display() {
        let err = Error::DatabaseMigration {
            message: "unknown migration version: 9".to_string(),
        };
        assert!(err.to_string().contains("unknown migration version"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "min_level exceeds max_level".to_string(),
        };
        assert!(err.to_string().contains("min_level"));
    }
}
