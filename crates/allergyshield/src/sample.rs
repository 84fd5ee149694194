//! Bundled sample entries for trying the tool out.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::record::NewAllergy;
use crate::storage::AllergyStore;

/// Outcome of [`seed_sample_data`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    /// Names inserted.
    pub added: Vec<String>,
    /// Names left out, already stored or outside the configured scale.
    pub skipped: Vec<String>,
}

/// Ten common food allergens on a 1 to 4 scale.
#[must_use]
pub fn sample_allergies() -> Vec<NewAllergy> {
    vec![
        NewAllergy::new("Peanuts", 4)
            .with_symptoms("Anaphylaxis, difficulty breathing, swelling of face and throat, hives, rapid pulse")
            .with_ingredients("Peanut oil, peanut flour, peanut butter, groundnuts, arachis oil, mixed nuts")
            .with_notes("Carry EpiPen at all times. Avoid all products processed in facilities that handle peanuts."),
        NewAllergy::new("Milk", 2)
            .with_symptoms("Stomach pain, bloating, diarrhea, nausea, gas")
            .with_ingredients("Lactose, casein, whey, butter, cream, cheese, yogurt, milk powder")
            .with_notes("Lactose-free alternatives available. Severity varies with amount consumed."),
        NewAllergy::new("Shellfish", 3)
            .with_symptoms("Hives, vomiting, difficulty swallowing, abdominal pain, dizziness")
            .with_ingredients("Shrimp, crab, lobster, crawfish, mollusks, oysters, clams, mussels")
            .with_notes("Cross-contamination risk high in seafood restaurants. Often develops in adulthood."),
        NewAllergy::new("Tree Nuts", 4)
            .with_symptoms("Anaphylaxis, swelling, difficulty breathing, skin reactions")
            .with_ingredients("Almonds, walnuts, pecans, cashews, pistachios, brazil nuts, hazelnuts, macadamia nuts")
            .with_notes("Different tree nuts may cause different severities. Some people allergic to only specific nuts."),
        NewAllergy::new("Eggs", 2)
            .with_symptoms("Skin rash, stomach upset, respiratory problems, runny nose")
            .with_ingredients("Albumin, egg whites, egg yolks, mayonnaise, meringue, custard, lecithin")
            .with_notes("Often outgrown by adolescence. Some people can tolerate baked eggs but not raw."),
        NewAllergy::new("Soy", 1)
            .with_symptoms("Mild stomach upset, skin irritation, runny nose")
            .with_ingredients("Soy sauce, tofu, tempeh, soy milk, soy protein, edamame, miso")
            .with_notes("Common in processed foods. Often mild reactions. Check labels carefully."),
        NewAllergy::new("Wheat", 2)
            .with_symptoms("Digestive issues, skin problems, respiratory symptoms, headache")
            .with_ingredients("Wheat flour, gluten, bread, pasta, cereals, crackers, beer")
            .with_notes("Different from celiac disease. May be able to tolerate other grains like rice and corn."),
        NewAllergy::new("Fish", 3)
            .with_symptoms("Hives, swelling, gastrointestinal problems, respiratory issues")
            .with_ingredients("Salmon, tuna, cod, halibut, anchovies, fish sauce, worcestershire sauce")
            .with_notes("May be allergic to specific types of fish only. Cross-contamination risk in restaurants."),
        NewAllergy::new("Sesame", 3)
            .with_symptoms("Anaphylaxis, hives, difficulty breathing, gastrointestinal symptoms")
            .with_ingredients("Sesame seeds, tahini, sesame oil, hummus, halva, some bread toppings")
            .with_notes("Increasingly recognized allergen. Now required to be labeled in many countries."),
        NewAllergy::new("Strawberries", 1)
            .with_symptoms("Oral allergy syndrome, mild hives, itchy mouth and throat")
            .with_ingredients("Fresh strawberries, strawberry flavoring, strawberry jam, smoothies")
            .with_notes("Often part of oral allergy syndrome. May be related to birch pollen allergy."),
    ]
}

/// Insert the sample entries that are not stored yet.
///
/// Existing names are left untouched. Entries whose level falls outside the
/// store's scale are skipped with a warning.
///
/// # Errors
///
/// Returns an error if a storage operation fails.
pub fn seed_sample_data(store: &AllergyStore) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    for sample in sample_allergies() {
        match store.add(&sample) {
            Ok(record) => {
                debug!("Seeded '{}'", record.allergen_name);
                summary.added.push(record.allergen_name);
            }
            Err(Error::DuplicateEntry { allergen_name }) => {
                debug!("Sample '{}' already stored", allergen_name);
                summary.skipped.push(allergen_name);
            }
            Err(e @ Error::Validation { .. }) => {
                warn!("Sample '{}' skipped: {}", sample.allergen_name, e);
                summary.skipped.push(sample.allergen_name);
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "Seeded {} sample entries ({} skipped)",
        summary.added.len(),
        summary.skipped.len()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DangerScale;

    #[test]
    fn test_sample_allergies_are_valid() {
        let samples = sample_allergies();
        assert_eq!(samples.len(), 10);

        let scale = DangerScale::new(1, 4).unwrap();
        for sample in &samples {
            assert!(sample.normalized(scale).is_ok(), "{}", sample.allergen_name);
            assert!(sample.symptoms.is_some());
            assert!(sample.ingredients.is_some());
            assert!(sample.notes.is_some());
        }
    }

    #[test]
    fn test_sample_names_are_unique() {
        let mut names: Vec<_> = sample_allergies()
            .into_iter()
            .map(|s| s.allergen_name)
            .collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 10);
    }

    #[test]
    fn test_seed_empty_store() {
        let store = AllergyStore::open_in_memory(DangerScale::default()).unwrap();
        let summary = seed_sample_data(&store).unwrap();

        assert_eq!(summary.added.len(), 10);
        assert!(summary.skipped.is_empty());
        assert_eq!(store.count().unwrap(), 10);

        let listed = store.list_all().unwrap();
        assert_eq!(listed[0].allergen_name, "Peanuts");
        assert_eq!(listed[1].allergen_name, "Tree Nuts");
    }

    #[test]
    fn test_seed_twice_skips_existing() {
        let store = AllergyStore::open_in_memory(DangerScale::default()).unwrap();
        seed_sample_data(&store).unwrap();

        let summary = seed_sample_data(&store).unwrap();
        assert!(summary.added.is_empty());
        assert_eq!(summary.skipped.len(), 10);
        assert_eq!(store.count().unwrap(), 10);
    }

    #[test]
    fn test_seed_keeps_user_entry() {
        let store = AllergyStore::open_in_memory(DangerScale::default()).unwrap();
        store
            .add(&NewAllergy::new("Milk", 9).with_notes("mine"))
            .unwrap();

        let summary = seed_sample_data(&store).unwrap();
        assert_eq!(summary.added.len(), 9);
        assert_eq!(summary.skipped, vec!["Milk".to_string()]);

        let milk = store.find_by_name("Milk").unwrap().unwrap();
        assert_eq!(milk.danger_level, 9);
        assert_eq!(milk.notes.as_deref(), Some("mine"));
    }

    #[test]
    fn test_seed_narrow_scale_skips_out_of_range() {
        let store = AllergyStore::open_in_memory(DangerScale::new(1, 2).unwrap()).unwrap();
        let summary = seed_sample_data(&store).unwrap();

        // Peanuts, Shellfish, Tree Nuts, Fish and Sesame sit above level 2.
        assert_eq!(summary.added.len(), 5);
        assert_eq!(summary.skipped.len(), 5);
        assert!(summary.skipped.contains(&"Peanuts".to_string()));
    }
}
