//! Core record types for allergyshield.
//!
//! This module defines the allergy entry as stored, the input accepted by
//! the store, and the configurable danger-level scale used to validate and
//! label entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A stored allergy entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllergyRecord {
    /// Identifier assigned by the store. Never reused.
    pub id: i64,

    /// Name of the allergen. Unique across the store (case-sensitive).
    pub allergen_name: String,

    /// Severity rating within the configured [`DangerScale`].
    pub danger_level: i64,

    /// Reactions the allergen causes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<String>,

    /// Ingredients or product names that contain the allergen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<String>,

    /// Where the information came from (label, website, doctor).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Free-form notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// When the entry was created. Absent on rows written without a timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Input for creating or replacing an allergy entry.
///
/// Text fields are trimmed before storage; optional fields that are empty
/// after trimming are stored as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewAllergy {
    /// Name of the allergen. Required.
    pub allergen_name: String,
    /// Severity rating. Required.
    pub danger_level: i64,
    /// Reactions the allergen causes.
    pub symptoms: Option<String>,
    /// Ingredients or product names that contain the allergen.
    pub ingredients: Option<String>,
    /// Where the information came from.
    pub source: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
}

impl NewAllergy {
    /// Create an input with only the required fields set.
    #[must_use]
    pub fn new(allergen_name: impl Into<String>, danger_level: i64) -> Self {
        Self {
            allergen_name: allergen_name.into(),
            danger_level,
            ..Self::default()
        }
    }

    /// Set the symptoms.
    #[must_use]
    pub fn with_symptoms(mut self, symptoms: impl Into<String>) -> Self {
        self.symptoms = Some(symptoms.into());
        self
    }

    /// Set the ingredients.
    #[must_use]
    pub fn with_ingredients(mut self, ingredients: impl Into<String>) -> Self {
        self.ingredients = Some(ingredients.into());
        self
    }

    /// Set the source.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Trim every field and validate the result against `scale`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming `allergen_name` if the name is
    /// empty after trimming, or `danger_level` if the level is outside the scale.
    pub fn normalized(&self, scale: DangerScale) -> Result<Self> {
        let allergen_name = self.allergen_name.trim().to_string();
        if allergen_name.is_empty() {
            return Err(Error::validation("allergen_name", "must not be empty"));
        }
        scale.check(self.danger_level)?;

        Ok(Self {
            allergen_name,
            danger_level: self.danger_level,
            symptoms: clean_optional(self.symptoms.as_deref()),
            ingredients: clean_optional(self.ingredients.as_deref()),
            source: clean_optional(self.source.as_deref()),
            notes: clean_optional(self.notes.as_deref()),
        })
    }
}

fn clean_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

/// The inclusive range of valid danger levels.
///
/// Different deployments use different scales (1–4 or 1–10), so the range
/// comes from configuration rather than being fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DangerScale {
    /// Lowest valid level.
    pub min: i64,
    /// Highest valid level.
    pub max: i64,
}

impl Default for DangerScale {
    fn default() -> Self {
        Self { min: 1, max: 10 }
    }
}

impl DangerScale {
    /// Create a scale covering `min..=max`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] if `min > max` or `min` is negative.
    pub fn new(min: i64, max: i64) -> Result<Self> {
        if min < 0 {
            return Err(Error::ConfigValidation {
                message: format!("danger min_level ({min}) must not be negative"),
            });
        }
        if min > max {
            return Err(Error::ConfigValidation {
                message: format!(
                    "danger min_level ({min}) cannot be greater than max_level ({max})"
                ),
            });
        }
        Ok(Self { min, max })
    }

    /// Check whether `level` is inside the scale.
    #[must_use]
    pub fn contains(&self, level: i64) -> bool {
        (self.min..=self.max).contains(&level)
    }

    /// Reject levels outside the scale.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for `danger_level` when out of range.
    pub fn check(&self, level: i64) -> Result<()> {
        if self.contains(level) {
            Ok(())
        } else {
            Err(Error::validation(
                "danger_level",
                format!(
                    "must be between {} and {}, got {level}",
                    self.min, self.max
                ),
            ))
        }
    }

    /// Map a level onto one of four severity bands.
    ///
    /// The scale is split into four equal bands; levels outside the scale
    /// land in the nearest band.
    #[must_use]
    pub fn label(&self, level: i64) -> DangerLabel {
        // Widened so scales reaching the i64 limits cannot overflow.
        let min = i128::from(self.min);
        let span = i128::from(self.max) - min + 1;
        let offset = (i128::from(level) - min).clamp(0, span - 1);
        match offset * 4 / span {
            0 => DangerLabel::Mild,
            1 => DangerLabel::Moderate,
            2 => DangerLabel::Severe,
            _ => DangerLabel::LifeThreatening,
        }
    }
}

/// Human-readable severity band for a danger level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DangerLabel {
    /// Lowest band.
    Mild,
    /// Second band.
    Moderate,
    /// Third band.
    Severe,
    /// Highest band.
    LifeThreatening,
}

impl std::fmt::Display for DangerLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mild => write!(f, "MILD"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::Severe => write!(f, "SEVERE"),
            Self::LifeThreatening => write!(f, "LIFE-THREATENING"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_trims_fields() {
        let input = NewAllergy::new("  Peanuts ", 4)
            .with_symptoms(" hives ")
            .with_ingredients("peanut oil\n")
            .with_source("   ")
            .with_notes("");

        let clean = input.normalized(DangerScale::default()).unwrap();
        assert_eq!(clean.allergen_name, "Peanuts");
        assert_eq!(clean.symptoms.as_deref(), Some("hives"));
        assert_eq!(clean.ingredients.as_deref(), Some("peanut oil"));
        assert_eq!(clean.source, None);
        assert_eq!(clean.notes, None);
    }

    #[test]
    fn test_normalized_rejects_blank_name() {
        let err = NewAllergy::new("   ", 3)
            .normalized(DangerScale::default())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation {
                field: "allergen_name",
                ..
            }
        ));
    }

    #[test]
    fn test_normalized_rejects_out_of_range_level() {
        let err = NewAllergy::new("Milk", 11)
            .normalized(DangerScale::default())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation {
                field: "danger_level",
                ..
            }
        ));

        let err = NewAllergy::new("Milk", 0)
            .normalized(DangerScale::default())
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_legacy_scale_rejects_five() {
        let scale = DangerScale::new(1, 4).unwrap();
        assert!(scale.check(4).is_ok());
        assert!(scale.check(5).is_err());
    }

    #[test]
    fn test_scale_new_rejects_inverted_range() {
        assert!(DangerScale::new(5, 1).is_err());
        assert!(DangerScale::new(-1, 4).is_err());
        assert!(DangerScale::new(3, 3).is_ok());
    }

    #[test]
    fn test_default_scale() {
        let scale = DangerScale::default();
        assert_eq!(scale.min, 1);
        assert_eq!(scale.max, 10);
        assert!(scale.contains(1));
        assert!(scale.contains(10));
        assert!(!scale.contains(11));
    }

    #[test]
    fn test_labels_on_legacy_scale() {
        let scale = DangerScale::new(1, 4).unwrap();
        assert_eq!(scale.label(1), DangerLabel::Mild);
        assert_eq!(scale.label(2), DangerLabel::Moderate);
        assert_eq!(scale.label(3), DangerLabel::Severe);
        assert_eq!(scale.label(4), DangerLabel::LifeThreatening);
    }

    #[test]
    fn test_labels_on_ten_point_scale() {
        let scale = DangerScale::default();
        assert_eq!(scale.label(1), DangerLabel::Mild);
        assert_eq!(scale.label(3), DangerLabel::Mild);
        assert_eq!(scale.label(4), DangerLabel::Moderate);
        assert_eq!(scale.label(6), DangerLabel::Severe);
        assert_eq!(scale.label(9), DangerLabel::LifeThreatening);
        assert_eq!(scale.label(10), DangerLabel::LifeThreatening);
    }

    #[test]
    fn test_label_clamps_out_of_scale_levels() {
        let scale = DangerScale::new(1, 4).unwrap();
        assert_eq!(scale.label(-3), DangerLabel::Mild);
        assert_eq!(scale.label(9), DangerLabel::LifeThreatening);
    }

    #[test]
    fn test_label_on_widest_scale() {
        let scale = DangerScale::new(0, i64::MAX).unwrap();
        assert!(scale.check(5).is_ok());
        assert_eq!(scale.label(5), DangerLabel::Mild);
        assert_eq!(scale.label(i64::MAX / 2), DangerLabel::Moderate);
        assert_eq!(scale.label(i64::MAX), DangerLabel::LifeThreatening);
        assert_eq!(scale.label(i64::MIN), DangerLabel::Mild);
    }

    #[test]
    fn test_label_on_single_level_scale() {
        let scale = DangerScale::new(i64::MAX, i64::MAX).unwrap();
        assert_eq!(scale.label(i64::MAX), DangerLabel::Mild);
        assert_eq!(scale.label(0), DangerLabel::Mild);
    }

    #[test]
    fn test_label_display() {
        assert_eq!(DangerLabel::LifeThreatening.to_string(), "LIFE-THREATENING");
        assert_eq!(DangerLabel::Mild.to_string(), "MILD");
    }

    #[test]
    fn test_record_serializes_without_empty_optionals() {
        let record = AllergyRecord {
            id: 1,
            allergen_name: "Soy".to_string(),
            danger_level: 1,
            symptoms: None,
            ingredients: Some("tofu".to_string()),
            source: None,
            notes: None,
            created_at: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"ingredients\":\"tofu\""));
        assert!(!json.contains("symptoms"));
        assert!(!json.contains("created_at"));
    }
}
