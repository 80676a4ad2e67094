//! Weight, climate and building-age tables used by the risk scorer.

use safenest_models::{BuildingAge, Climate};

/// Penalty weight for one defect class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefectWeight {
    /// Severity on a 1–5 scale
    pub severity: f64,
    /// How strongly affected area scales the penalty
    pub area_multiplier: f64,
    pub description: &'static str,
}

impl DefectWeight {
    const fn new(severity: f64, area_multiplier: f64, description: &'static str) -> Self {
        Self {
            severity,
            area_multiplier,
            description,
        }
    }
}

/// Weight applied to any class missing from the table.
pub const DEFAULT_WEIGHT: DefectWeight =
    DefectWeight::new(2.0, 1.0, "Potential issue requiring assessment");

const DAMPNESS: DefectWeight = DefectWeight::new(2.0, 1.2, "Dampness indicates moisture intrusion");
const MOLD: DefectWeight = DefectWeight::new(5.0, 2.5, "Mold poses health hazards and spreads");

/// Look up the weight for a normalized class key.
pub fn defect_weight(key: &str) -> DefectWeight {
    match key {
        "crack" => DefectWeight::new(
            3.0,
            1.5,
            "Structural cracks may indicate foundation or settling issues",
        ),
        "leak" => DefectWeight::new(4.0, 2.0, "Active leaks cause progressive damage"),
        "water_damage" => DefectWeight::new(4.0, 2.0, "Water damage may hide mold or rot"),
        "damp" | "dampness" => DAMPNESS,
        "mold" | "mould" => MOLD,
        "corrosion" => DefectWeight::new(3.0, 1.5, "Corrosion weakens structural elements"),
        "rust" => DefectWeight::new(3.0, 1.5, "Rust indicates moisture exposure"),
        "peeling" => DefectWeight::new(1.5, 1.0, "Peeling paint may expose surfaces"),
        "stain" => DefectWeight::new(1.0, 0.8, "Staining may indicate past water issues"),
        "electrical" => DefectWeight::new(4.5, 1.0, "Electrical issues pose fire/safety risk"),
        "spalling" => DefectWeight::new(3.5, 1.8, "Concrete spalling exposes rebar"),
        "deformation" => DefectWeight::new(4.0, 2.0, "Structural deformation is serious"),
        _ => DEFAULT_WEIGHT,
    }
}

/// Climate multiplier for a normalized class key; 1.0 when no adjustment.
pub fn climate_multiplier(climate: Climate, key: &str) -> f64 {
    match (climate, key) {
        (Climate::HotHumid, "mold") => 1.5,
        (Climate::HotHumid, "dampness") => 1.3,
        (Climate::HotHumid, "rust") => 1.2,
        (Climate::ColdDry, "crack") => 1.3,
        (Climate::ColdDry, "spalling") => 1.4,
        (Climate::Coastal, "rust") => 1.5,
        (Climate::Coastal, "corrosion") => 1.5,
        (Climate::Coastal, "salt_damage") => 1.4,
        _ => 1.0,
    }
}

/// Flat penalty points for the building's construction era.
pub fn age_penalty(age: BuildingAge) -> f64 {
    match age {
        BuildingAge::Pre1950 => 15.0,
        BuildingAge::Pre1970 => 10.0,
        BuildingAge::From1970To1990 => 5.0,
        BuildingAge::From1990To2010 => 2.0,
        BuildingAge::Post2010 | BuildingAge::Unknown => 0.0,
    }
}

/// Table key for a class label: trimmed and lower-cased.
///
/// "Water Damage" stays `water damage` and so falls back to the default
/// weight; see [`canonical_class_key`] for the aliasing form.
pub fn class_key(class_name: &str) -> String {
    class_name.trim().to_lowercase()
}

/// Class key with spaces and hyphens mapped to underscores and the
/// detector's "Rust/Corrosion" label resolved to `rust`.
pub fn canonical_class_key(class_name: &str) -> String {
    let key: String = class_key(class_name)
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect();

    match key.as_str() {
        "rust/corrosion" => "rust".to_string(),
        _ => key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_key_lowercases_only() {
        assert_eq!(class_key("Water Damage"), "water damage");
        assert_eq!(class_key("  Mold "), "mold");
        assert_eq!(class_key("Rust/Corrosion"), "rust/corrosion");
        assert_eq!(defect_weight(&class_key("Water Damage")), DEFAULT_WEIGHT);
    }

    #[test]
    fn test_canonical_class_key() {
        assert_eq!(canonical_class_key("Water Damage"), "water_damage");
        assert_eq!(canonical_class_key("salt-damage"), "salt_damage");
        assert_eq!(canonical_class_key("Rust/Corrosion"), "rust");
        assert_eq!(canonical_class_key("crack"), "crack");
    }

    #[test]
    fn test_weight_lookup() {
        assert_eq!(defect_weight("mold").severity, 5.0);
        assert_eq!(defect_weight("mould"), defect_weight("mold"));
        assert_eq!(defect_weight("stain").area_multiplier, 0.8);
        assert_eq!(defect_weight("graffiti"), DEFAULT_WEIGHT);
    }

    #[test]
    fn test_climate_table() {
        assert_eq!(climate_multiplier(Climate::HotHumid, "mold"), 1.5);
        assert_eq!(climate_multiplier(Climate::Coastal, "rust"), 1.5);
        assert_eq!(climate_multiplier(Climate::Temperate, "mold"), 1.0);
        assert_eq!(climate_multiplier(Climate::Unknown, "rust"), 1.0);
    }

    #[test]
    fn test_age_table() {
        assert_eq!(age_penalty(BuildingAge::Pre1950), 15.0);
        assert_eq!(age_penalty(BuildingAge::From1990To2010), 2.0);
        assert_eq!(age_penalty(BuildingAge::Unknown), 0.0);
    }
}
