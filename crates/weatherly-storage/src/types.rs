use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use weatherly_weather::WeatherSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Full,
    Minimal,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Minimal => "minimal",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "minimal" => Ok(Self::Minimal),
            other => Err(format!("unknown view mode '{}'", other)),
        }
    }
}

/// Remembered selection, one slot per view mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LastCityIndex {
    pub full: usize,
    pub minimal: usize,
}

impl LastCityIndex {
    pub fn get(&self, mode: ViewMode) -> usize {
        match mode {
            ViewMode::Full => self.full,
            ViewMode::Minimal => self.minimal,
        }
    }

    pub fn set(&mut self, mode: ViewMode, index: usize) {
        match mode {
            ViewMode::Full => self.full = index,
            ViewMode::Minimal => self.minimal = index,
        }
    }
}

/// View preferences. Missing fields read as defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub view_mode: ViewMode,
    pub last_city_index: LastCityIndex,
}

/// Daily reminder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPreferences {
    pub enabled: bool,
    pub hour: u32,
    pub minute: u32,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            enabled: true,
            hour: 8,
            minute: 0,
        }
    }
}

/// One cached snapshot with the time it was stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: WeatherSnapshot,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

/// Cache contents keyed by city id.
pub type WeatherCache = HashMap<String, CacheEntry>;
