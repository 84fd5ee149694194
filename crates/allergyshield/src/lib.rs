//! `allergyshield` - A local record store for food allergies
//!
//! This library keeps allergy entries (allergen, danger level, symptoms,
//! ingredients to avoid) in a `SQLite` database, with ordered listing,
//! case-insensitive search, and CSV/JSON transfer.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod record;
pub mod sample;
pub mod storage;
pub mod transfer;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use record::{AllergyRecord, DangerLabel, DangerScale, NewAllergy};
pub use storage::{AllergyStore, StoreStats};
