//! Inspection context supplied by the user alongside detections.
//!
//! Unknown keys never fail deserialization: they map to an `Unknown`
//! variant that produces no scoring adjustment.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Construction-era bracket of the inspected building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum BuildingAge {
    #[serde(rename = "pre_1950")]
    Pre1950,
    #[serde(rename = "pre_1970")]
    Pre1970,
    #[serde(rename = "1970_1990")]
    From1970To1990,
    #[serde(rename = "1990_2010")]
    From1990To2010,
    #[serde(rename = "post_2010")]
    Post2010,
    #[serde(other)]
    Unknown,
}

impl BuildingAge {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildingAge::Pre1950 => "pre_1950",
            BuildingAge::Pre1970 => "pre_1970",
            BuildingAge::From1970To1990 => "1970_1990",
            BuildingAge::From1990To2010 => "1990_2010",
            BuildingAge::Post2010 => "post_2010",
            BuildingAge::Unknown => "unknown",
        }
    }

    /// Lenient parse: unrecognized keys become `Unknown`.
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_lowercase().as_str() {
            "pre_1950" => BuildingAge::Pre1950,
            "pre_1970" => BuildingAge::Pre1970,
            "1970_1990" => BuildingAge::From1970To1990,
            "1990_2010" => BuildingAge::From1990To2010,
            "post_2010" => BuildingAge::Post2010,
            _ => BuildingAge::Unknown,
        }
    }
}

impl fmt::Display for BuildingAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Climate zone of the property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Climate {
    HotHumid,
    ColdDry,
    Coastal,
    #[default]
    Temperate,
    #[serde(other)]
    Unknown,
}

impl Climate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Climate::HotHumid => "hot_humid",
            Climate::ColdDry => "cold_dry",
            Climate::Coastal => "coastal",
            Climate::Temperate => "temperate",
            Climate::Unknown => "unknown",
        }
    }

    /// Lenient parse: unrecognized keys become `Unknown`.
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_lowercase().as_str() {
            "hot_humid" => Climate::HotHumid,
            "cold_dry" => Climate::ColdDry,
            "coastal" => Climate::Coastal,
            "temperate" => Climate::Temperate,
            _ => Climate::Unknown,
        }
    }
}

impl fmt::Display for Climate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Optional user-provided context fused into the risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct UserContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_age: Option<BuildingAge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub climate: Option<Climate>,
}

impl UserContext {
    pub fn new(building_age: Option<BuildingAge>, climate: Option<Climate>) -> Self {
        Self {
            building_age,
            climate,
        }
    }

    /// Climate to apply, defaulting to temperate.
    pub fn climate_or_default(&self) -> Climate {
        self.climate.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_keys_deserialize() {
        let ctx: UserContext =
            serde_json::from_str(r#"{"building_age": "victorian", "climate": "arctic"}"#).unwrap();
        assert_eq!(ctx.building_age, Some(BuildingAge::Unknown));
        assert_eq!(ctx.climate, Some(Climate::Unknown));
    }

    #[test]
    fn test_known_keys() {
        let ctx: UserContext =
            serde_json::from_str(r#"{"building_age": "1970_1990", "climate": "hot_humid"}"#)
                .unwrap();
        assert_eq!(ctx.building_age, Some(BuildingAge::From1970To1990));
        assert_eq!(ctx.climate_or_default(), Climate::HotHumid);
    }

    #[test]
    fn test_from_key_is_lenient() {
        assert_eq!(BuildingAge::from_key(" PRE_1950 "), BuildingAge::Pre1950);
        assert_eq!(BuildingAge::from_key("new"), BuildingAge::Unknown);
        assert_eq!(Climate::from_key("Coastal"), Climate::Coastal);
        assert_eq!(UserContext::default().climate_or_default(), Climate::Temperate);
    }
}
