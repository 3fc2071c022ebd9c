//! Migration run configuration.
//!
//! Business constants that drive classification and materialization live
//! here rather than in code: the payout cutoff, the one exempt bag code,
//! the hard fallback date for paid rows without any usable date, and the
//! legacy category mapping table. Defaults match the production migration;
//! a JSON config file can override any subset.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One entry of the legacy-type → webshop-category mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryMapping {
    /// Category label as it appears in the legacy export.
    pub legacy_label: String,
    /// Target path on the webshop, `"Parent / Child"`.
    pub path: String,
    /// Matching `Type` attribute value for faceted filtering.
    pub type_value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Sold-but-unpaid rows with a sale date after this cutoff still get an
    /// unpaid order; older ones are withdrawn as inconsistent.
    pub cutoff_date: NaiveDate,
    /// The one bag code whose sold-before-cutoff rows still get an order.
    pub exempt_legacy_code: String,
    /// Hard fallback order date for paid rows without any usable date.
    /// When unset such rows are withdrawn instead.
    pub fallback_paid_date: Option<NaiveDate>,
    /// Durable commit cadence, in rows.
    pub checkpoint_rows: usize,
    /// Suffix appended to the internal code of a duplicated
    /// still-available copy.
    pub copy_code_suffix: String,
    pub migration_customer_name: String,
    pub migration_customer_email: String,
    pub migration_submission_name: String,
    /// Base URL of the retired webshop, for image downloads.
    pub site_url: String,
    /// Local image cache directory, `<base>/<legacy_id>/<filename>`.
    pub image_base_path: Option<PathBuf>,
    pub category_mappings: Vec<CategoryMapping>,
    /// Legacy condition rating → display value on the `Conditie` attribute.
    pub condition_display: Vec<(String, String)>,
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid constant date")
}

fn mapping(legacy_label: &str, path: &str, type_value: &str) -> CategoryMapping {
    CategoryMapping {
        legacy_label: legacy_label.to_string(),
        path: path.to_string(),
        type_value: type_value.to_string(),
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            cutoff_date: ymd(2025, 9, 30),
            exempt_legacy_code: "20250012".to_string(),
            fallback_paid_date: Some(ymd(2022, 8, 31)),
            checkpoint_rows: 100,
            copy_code_suffix: "-C".to_string(),
            migration_customer_name: "Legacy migration customer".to_string(),
            migration_customer_email: "migration@localhost".to_string(),
            migration_submission_name: "MIGRATION - Stock copies".to_string(),
            site_url: String::new(),
            image_base_path: None,
            category_mappings: default_category_mappings(),
            condition_display: vec![
                ("5".to_string(), "\u{2764}\u{fe0f}".repeat(5)),
                (
                    "4".to_string(),
                    format!("{}\u{1f90d}", "\u{2764}\u{fe0f}".repeat(4)),
                ),
                (
                    "3".to_string(),
                    format!("{}{}", "\u{2764}\u{fe0f}".repeat(3), "\u{1f90d}".repeat(2)),
                ),
            ],
        }
    }
}

impl MigrationConfig {
    /// Load configuration overrides from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parse config {}", path.display()))?;
        Ok(config)
    }

    /// Mapping entry for a legacy category label, if any.
    pub fn category_for(&self, legacy_label: &str) -> Option<&CategoryMapping> {
        let label = legacy_label.trim();
        self.category_mappings
            .iter()
            .find(|entry| entry.legacy_label == label)
    }

    /// Display value for a legacy condition rating.
    pub fn condition_label(&self, raw: &str) -> Option<&str> {
        let raw = raw.trim();
        self.condition_display
            .iter()
            .find(|(rating, _)| rating == raw)
            .map(|(_, label)| label.as_str())
    }
}

/// The legacy webshop's category labels and where they land on the new
/// shop. Kept as data so a later batch can extend it without a release.
fn default_category_mappings() -> Vec<CategoryMapping> {
    vec![
        mapping("Zalig zotte deals", "Kleding / Zalig zotte deals", "Zalig zotte deals"),
        mapping("Feest!", "Kleding / Feest!", "Feest!"),
        mapping("Tutjes", "Accessoires / Tutjes", "Tutjes"),
        mapping("kousen", "Schoenen en Kousen / Kousen", "Kousen"),
        mapping("Speelgoed", "Accessoires / Speelgoed", "Speelgoed"),
        mapping("Setje", "Kleding / Setje", "Setje"),
        mapping("Skiwear", "Kleding / Skiwear", "Skiwear"),
        mapping("Accessoires", "Accessoires / Accessoires", "Accessoires"),
        mapping("Body", "Kleding / Body", "Body"),
        mapping("Schoenen", "Schoenen en Kousen / Schoenen", "Schoenen"),
        mapping("Jumpsuit/Salopet", "Kleding / Jumpsuit/Salopet", "Jumpsuit/Salopet"),
        mapping("Boxpak", "Kleding / Boxpak", "Boxpak"),
        mapping("Hoedjes & Petjes", "Kleding / Hoedjes & Petjes", "Hoedjes & Petjes"),
        mapping("Muts & Sjaal", "Kleding / Muts & Sjaal", "Muts & Sjaal"),
        mapping("Swim & Beachwear", "Kleding / Swim & Beachwear", "Swim & Beachwear"),
        mapping("Blousje", "Kleding / Blousje", "Blousje"),
        mapping("Hemd", "Kleding / Hemd", "Hemd"),
        mapping("Pyjama & Pantoffels", "Kleding / Pyjama & Pantoffels", "Pyjama & Pantoffels"),
        mapping("Jas", "Kleding / Jas", "Jas"),
        mapping("Rokje", "Kleding / Rokje", "Rokje"),
        mapping("Kleedje", "Kleding / Kleedje", "Kleedje"),
        mapping("Short", "Kleding / Short", "Short"),
        mapping("Trui & Cardigan", "Kleding / Trui & Cardigan", "Trui & Cardigan"),
        mapping("T - Shirt", "Kleding / T-Shirt", "T-Shirt"),
        mapping("Broek", "Kleding / Broek", "Broek"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_hold_business_constants() {
        let config = MigrationConfig::default();
        assert_eq!(config.cutoff_date, ymd(2025, 9, 30));
        assert_eq!(config.exempt_legacy_code, "20250012");
        assert_eq!(config.fallback_paid_date, Some(ymd(2022, 8, 31)));
        assert_eq!(config.checkpoint_rows, 100);
    }

    #[test]
    fn category_lookup_trims_label() {
        let config = MigrationConfig::default();
        let entry = config.category_for("  Schoenen ").expect("mapped");
        assert_eq!(entry.path, "Schoenen en Kousen / Schoenen");
        assert!(config.category_for("Onbekend").is_none());
    }

    #[test]
    fn partial_json_overrides_defaults() {
        let config: MigrationConfig =
            serde_json::from_str(r#"{"exempt_legacy_code": "20990001"}"#).expect("parse");
        assert_eq!(config.exempt_legacy_code, "20990001");
        assert_eq!(config.checkpoint_rows, 100);
    }

    #[test]
    fn condition_ratings_map_to_display_values() {
        let config = MigrationConfig::default();
        assert!(config.condition_label("5").is_some());
        assert!(config.condition_label("2").is_none());
    }
}
