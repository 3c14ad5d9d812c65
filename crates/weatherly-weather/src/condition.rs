//! WMO weather code normalization.
//!
//! Codes are matched against ordered tables of inclusive ranges; the first
//! matching row wins and anything unmatched falls back to clear.
//! See: https://open-meteo.com/en/docs#weathervariables
//!
//! Fog folds into cloudy and snow folds into rainy. Both are product
//! choices carried over from the app's three-word vocabulary.

use crate::types::Condition;

/// One row of a code table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeRange<T> {
    pub start: i32,
    pub end: i32,
    pub value: T,
}

impl<T: Copy> CodeRange<T> {
    const fn new(start: i32, end: i32, value: T) -> Self {
        Self { start, end, value }
    }

    pub fn contains(&self, code: i32) -> bool {
        (self.start..=self.end).contains(&code)
    }
}

fn lookup<T: Copy>(table: &[CodeRange<T>], code: i32, fallback: T) -> T {
    table
        .iter()
        .find(|row| row.contains(code))
        .map(|row| row.value)
        .unwrap_or(fallback)
}

/// Semantic condition table, evaluated top to bottom.
pub const CONDITION_TABLE: &[CodeRange<Condition>] = &[
    CodeRange::new(0, 0, Condition::Clear),
    CodeRange::new(1, 3, Condition::Cloudy),
    // Fog and depositing rime fog
    CodeRange::new(45, 48, Condition::Cloudy),
    // Drizzle, freezing drizzle, rain, freezing rain
    CodeRange::new(51, 67, Condition::Rainy),
    // Snow fall and snow grains
    CodeRange::new(71, 77, Condition::Rainy),
    CodeRange::new(80, 82, Condition::Rainy),
    // Snow showers
    CodeRange::new(85, 86, Condition::Rainy),
    // Thunderstorm and anything the provider adds above it
    CodeRange::new(95, i32::MAX, Condition::Rainy),
];

/// Background asset family, finer grained than [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Clear,
    Cloudy,
    Fog,
    Rain,
    Snow,
    Storm,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Cloudy => "cloudy",
            Self::Fog => "fog",
            Self::Rain => "rain",
            Self::Snow => "snow",
            Self::Storm => "storm",
        }
    }
}

pub const ASSET_TABLE: &[CodeRange<AssetKind>] = &[
    CodeRange::new(0, 0, AssetKind::Clear),
    CodeRange::new(1, 3, AssetKind::Cloudy),
    CodeRange::new(45, 48, AssetKind::Fog),
    CodeRange::new(51, 57, AssetKind::Rain),
    CodeRange::new(61, 67, AssetKind::Rain),
    CodeRange::new(71, 77, AssetKind::Snow),
    CodeRange::new(80, 82, AssetKind::Rain),
    CodeRange::new(85, 86, AssetKind::Snow),
    CodeRange::new(95, i32::MAX, AssetKind::Storm),
];

/// Map a WMO code to the semantic condition.
pub fn map_condition(code: i32) -> Condition {
    lookup(CONDITION_TABLE, code, Condition::Clear)
}

pub fn asset_kind(code: i32) -> AssetKind {
    lookup(ASSET_TABLE, code, AssetKind::Clear)
}

/// Day/night qualified asset key used to pick a background video, e.g. `rain_night`.
pub fn video_key(code: i32, is_day: bool) -> String {
    let suffix = if is_day { "day" } else { "night" };
    format!("{}_{}", asset_kind(code).as_str(), suffix)
}

/// Human-readable description of a WMO code.
pub fn description(code: i32) -> &'static str {
    match code {
        0 => "Clear Sky",
        1 => "Mainly Clear",
        2 => "Partly Cloudy",
        3 => "Overcast",
        45 => "Foggy",
        48 => "Depositing Rime Fog",
        51 => "Light Drizzle",
        53 => "Moderate Drizzle",
        55 => "Dense Drizzle",
        56 => "Light Freezing Drizzle",
        57 => "Dense Freezing Drizzle",
        61 => "Slight Rain",
        63 => "Moderate Rain",
        65 => "Heavy Rain",
        66 => "Light Freezing Rain",
        67 => "Heavy Freezing Rain",
        71 => "Slight Snow Fall",
        73 => "Moderate Snow Fall",
        75 => "Heavy Snow Fall",
        77 => "Snow Grains",
        80 => "Slight Rain Showers",
        81 => "Moderate Rain Showers",
        82 => "Violent Rain Showers",
        85 => "Slight Snow Showers",
        86 => "Heavy Snow Showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm & Hail",
        99 => "Visual Thunderstorm",
        _ => "Unknown",
    }
}
