//! Text rendering for CLI output.
//!
//! Renderers return strings so the binary decides where they go.

use std::fmt::Write as _;

use tabled::{settings::Style, Table, Tabled};

use crate::config::LayoutMode;
use crate::error::Result;
use crate::record::{AllergyRecord, DangerScale};
use crate::storage::StoreStats;

use super::OutputFormat;

/// Widest ingredient cell in table output, in characters.
const MAX_INGREDIENTS_WIDTH: usize = 40;

/// Render a list of entries.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_records(
    records: &[AllergyRecord],
    format: OutputFormat,
    layout: LayoutMode,
    scale: DangerScale,
) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(records)?,
        OutputFormat::Table => render_table(records, scale),
        OutputFormat::Plain => match layout.resolve() {
            LayoutMode::Touch => render_cards(records, scale),
            _ => render_lines(records, scale),
        },
    })
}

/// Render one entry with every field.
#[must_use]
pub fn render_detail(record: &AllergyRecord, scale: DangerScale) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", record.allergen_name);
    let _ = writeln!(out, "  Id:           {}", record.id);
    let _ = writeln!(
        out,
        "  Danger level: {} ({})",
        record.danger_level,
        scale.label(record.danger_level)
    );
    for (label, value) in [
        ("Symptoms:    ", &record.symptoms),
        ("Ingredients: ", &record.ingredients),
        ("Source:      ", &record.source),
        ("Notes:       ", &record.notes),
    ] {
        let _ = writeln!(out, "  {label} {}", value.as_deref().unwrap_or("-"));
    }
    if let Some(created_at) = record.created_at {
        let _ = writeln!(
            out,
            "  Added:        {}",
            created_at.format("%Y-%m-%d %H:%M UTC")
        );
    }
    out
}

/// Render store statistics.
#[must_use]
pub fn render_stats(stats: &StoreStats, database: &str, scale: DangerScale) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "allergyshield status");
    let _ = writeln!(out, "--------------------");
    let _ = writeln!(out, "Database:      {database}");
    let _ = writeln!(out, "Size:          {} bytes", stats.db_size_bytes);
    let _ = writeln!(out, "Danger scale:  {} to {}", scale.min, scale.max);
    let _ = writeln!(out, "Entries:       {}", stats.total_entries);
    for (level, count) in stats.by_level.iter().rev() {
        let _ = writeln!(
            out,
            "  Level {level:>3} ({}): {count}",
            scale.label(*level)
        );
    }
    out
}

/// One line per entry.
fn render_lines(records: &[AllergyRecord], scale: DangerScale) -> String {
    let mut out = String::new();
    for record in records {
        let _ = write!(
            out,
            "[{}] {} - level {} ({})",
            record.id,
            record.allergen_name,
            record.danger_level,
            scale.label(record.danger_level)
        );
        if let Some(ingredients) = &record.ingredients {
            let _ = write!(out, " - avoid: {ingredients}");
        }
        out.push('\n');
    }
    out
}

/// Stacked cards, one field per line, for narrow screens.
fn render_cards(records: &[AllergyRecord], scale: DangerScale) -> String {
    let mut out = String::new();
    for (index, record) in records.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "{} (#{})", record.allergen_name, record.id);
        let _ = writeln!(
            out,
            "  Level {}: {}",
            record.danger_level,
            scale.label(record.danger_level)
        );
        if let Some(symptoms) = &record.symptoms {
            let _ = writeln!(out, "  Symptoms: {symptoms}");
        }
        if let Some(ingredients) = &record.ingredients {
            let _ = writeln!(out, "  Avoid: {ingredients}");
        }
    }
    out
}

/// Row shape for table output.
#[derive(Tabled)]
struct TableRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "ALLERGEN")]
    allergen: String,
    #[tabled(rename = "LEVEL")]
    level: i64,
    #[tabled(rename = "SEVERITY")]
    severity: String,
    #[tabled(rename = "INGREDIENTS")]
    ingredients: String,
}

fn render_table(records: &[AllergyRecord], scale: DangerScale) -> String {
    if records.is_empty() {
        return String::new();
    }

    let rows = records.iter().map(|r| TableRow {
        id: r.id,
        allergen: r.allergen_name.clone(),
        level: r.danger_level,
        severity: scale.label(r.danger_level).to_string(),
        ingredients: truncate(r.ingredients.as_deref().unwrap_or(""), MAX_INGREDIENTS_WIDTH),
    });

    let mut table = Table::new(rows).with(Style::psql()).to_string();
    table.push('\n');
    table
}

/// Shorten to at most `max` characters, marking the cut with `...`.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn record(id: i64, name: &str, level: i64, ingredients: Option<&str>) -> AllergyRecord {
        AllergyRecord {
            id,
            allergen_name: name.to_string(),
            danger_level: level,
            symptoms: Some("Hives".to_string()),
            ingredients: ingredients.map(ToString::to_string),
            source: None,
            notes: None,
            created_at: None,
        }
    }

    fn scale() -> DangerScale {
        DangerScale::new(1, 4).unwrap()
    }

    #[test]
    fn test_render_lines() {
        let records = vec![
            record(1, "Peanuts", 4, Some("Peanut oil")),
            record(2, "Soy", 1, None),
        ];
        let out =
            render_records(&records, OutputFormat::Plain, LayoutMode::Desktop, scale()).unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[0],
            "[1] Peanuts - level 4 (LIFE-THREATENING) - avoid: Peanut oil"
        );
        assert_eq!(lines[1], "[2] Soy - level 1 (MILD)");
    }

    #[test]
    fn test_render_cards() {
        let records = vec![
            record(1, "Peanuts", 4, Some("Peanut oil")),
            record(2, "Soy", 1, None),
        ];
        let out =
            render_records(&records, OutputFormat::Plain, LayoutMode::Touch, scale()).unwrap();

        assert!(out.starts_with("Peanuts (#1)\n  Level 4: LIFE-THREATENING\n"));
        assert!(out.contains("  Avoid: Peanut oil\n"));
        assert!(out.contains("\nSoy (#2)\n"));
    }

    #[test]
    fn test_render_table() {
        let records = vec![
            record(1, "Tree Nuts", 4, Some("Almonds")),
            record(12, "Soy", 1, None),
        ];
        let out =
            render_records(&records, OutputFormat::Table, LayoutMode::Desktop, scale()).unwrap();
        let lines: Vec<&str> = out.lines().collect();

        // Header, rule, then one line per entry.
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("ALLERGEN"));
        assert!(lines[0].contains("SEVERITY"));
        assert!(lines[2].contains("Tree Nuts"));
        assert!(lines[2].contains("LIFE-THREATENING"));
        assert!(lines[2].contains("Almonds"));
        assert!(lines[3].contains("Soy"));
        assert!(lines[3].contains("MILD"));
    }

    #[test]
    fn test_render_table_truncates_ingredients() {
        let long = "a".repeat(60);
        let records = vec![record(1, "Corn", 2, Some(&long))];
        let out =
            render_records(&records, OutputFormat::Table, LayoutMode::Desktop, scale()).unwrap();

        assert!(out.contains(&format!("{}...", "a".repeat(37))));
        assert!(!out.contains(&long));
    }

    #[test]
    fn test_render_json() {
        let records = vec![record(3, "Milk", 2, None)];
        let out =
            render_records(&records, OutputFormat::Json, LayoutMode::Desktop, scale()).unwrap();

        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["id"], 3);
        assert_eq!(value[0]["allergen_name"], "Milk");
    }

    #[test]
    fn test_render_empty() {
        let out = render_records(&[], OutputFormat::Plain, LayoutMode::Desktop, scale()).unwrap();
        assert!(out.is_empty());

        let out = render_records(&[], OutputFormat::Json, LayoutMode::Desktop, scale()).unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn test_render_detail() {
        let out = render_detail(&record(5, "Sesame", 3, Some("Tahini")), scale());

        assert!(out.starts_with("Sesame\n"));
        assert!(out.contains("Danger level: 3 (SEVERE)"));
        assert!(out.contains("Ingredients:  Tahini"));
        assert!(out.contains("Source:       -"));
    }

    #[test]
    fn test_render_stats() {
        let stats = StoreStats {
            total_entries: 3,
            by_level: BTreeMap::from([(1, 1), (4, 2)]),
            db_size_bytes: 4096,
        };
        let out = render_stats(&stats, "/tmp/allergies.db", scale());

        assert!(out.contains("Database:      /tmp/allergies.db"));
        assert!(out.contains("Entries:       3"));
        let level4 = out.find("Level   4").unwrap();
        let level1 = out.find("Level   1").unwrap();
        assert!(level4 < level1);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
        assert_eq!(truncate("ééééééé", 5), "éé...");
    }
}
