use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The app's reduced weather vocabulary, derived from provider WMO codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    #[default]
    #[serde(alias = "sunny")]
    Clear,
    Cloudy,
    Rainy,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Cloudy => "cloudy",
            Self::Rainy => "rainy",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized current conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentConditions {
    pub temp: i32,
    pub condition: Condition,
    /// Background asset key such as `rain_night`
    pub video: String,
    pub wind: i32,
    pub humidity: u8,
    pub feels_like: i32,
    pub uv: Option<f64>,
    pub is_day: bool,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyEntry {
    pub id: usize,
    /// Local wall-clock time, `HH:MM`
    pub time: String,
    pub temp: i32,
    pub condition: Condition,
    pub video: String,
    pub is_day: bool,
    pub is_current: bool,
}

impl HourlyEntry {
    pub fn is_night(&self) -> bool {
        !self.is_day
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyEntry {
    pub id: usize,
    /// `Today` for the first entry, weekday name otherwise
    pub day: String,
    pub date: NaiveDate,
    pub high: i32,
    pub low: i32,
    pub uv: Option<f64>,
    /// Max precipitation probability in percent
    pub precipitation: u8,
    pub condition: Condition,
    pub video: String,
    pub sunrise: String,
    pub sunset: String,
    /// Lowest low across the whole forecast, for range bars
    pub global_low: i32,
    pub global_high: i32,
}

/// One normalized provider response. Recomputed on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyEntry>,
    pub daily: Vec<DailyEntry>,
    pub timezone: Option<String>,
    pub utc_offset_seconds: Option<i32>,
}

/// A geocoding candidate offered to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitySearchResult {
    pub id: String,
    pub name: String,
    /// Upper-case ISO country code, empty when the provider has none
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub display_name: String,
}

/// A saved city with its last known weather.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub id: String,
    pub name: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub temp: i32,
    #[serde(default)]
    pub condition: Condition,
    #[serde(default)]
    pub hourly: Option<Vec<HourlyEntry>>,
    #[serde(default)]
    pub daily: Option<Vec<DailyEntry>>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub utc_offset_seconds: Option<i32>,
    #[serde(default)]
    pub current: Option<CurrentConditions>,
}

impl City {
    /// The city saved on first launch.
    pub fn seed() -> Self {
        Self {
            id: "1".to_string(),
            name: "Casablanca".to_string(),
            country: "MA".to_string(),
            lat: 33.5731,
            lon: -7.5898,
            temp: 22,
            condition: Condition::Rainy,
            hourly: None,
            daily: None,
            timezone: None,
            utc_offset_seconds: None,
            current: None,
        }
    }

    /// A city picked from search results, before any weather is known.
    pub fn from_search(result: &CitySearchResult) -> Self {
        Self {
            id: result.id.clone(),
            name: result.name.clone(),
            country: result.country.clone(),
            lat: result.lat,
            lon: result.lon,
            temp: 0,
            condition: Condition::Cloudy,
            hourly: None,
            daily: None,
            timezone: None,
            utc_offset_seconds: None,
            current: None,
        }
    }

    /// Merge a fresh snapshot into this city.
    ///
    /// `None` (a failed fetch) leaves every field untouched.
    pub fn apply_snapshot(&mut self, snapshot: Option<&WeatherSnapshot>) -> bool {
        let Some(snapshot) = snapshot else {
            return false;
        };

        self.temp = snapshot.current.temp;
        self.condition = snapshot.current.condition;
        self.hourly = Some(snapshot.hourly.clone());
        self.daily = Some(snapshot.daily.clone());
        self.current = Some(snapshot.current.clone());
        if snapshot.timezone.is_some() {
            self.timezone = snapshot.timezone.clone();
        }
        if snapshot.utc_offset_seconds.is_some() {
            self.utc_offset_seconds = snapshot.utc_offset_seconds;
        }
        true
    }

    /// Same place as another city: case-insensitive name plus country code.
    pub fn is_same_place(&self, name: &str, country: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase() && self.country == country
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn snapshot() -> WeatherSnapshot {
        WeatherSnapshot {
            current: CurrentConditions {
                temp: 14,
                condition: Condition::Cloudy,
                video: "cloudy_day".to_string(),
                wind: 12,
                humidity: 70,
                feels_like: 12,
                uv: Some(3.5),
                is_day: true,
                description: "Overcast".to_string(),
            },
            hourly: vec![],
            daily: vec![],
            timezone: Some("Europe/Paris".to_string()),
            utc_offset_seconds: Some(3600),
        }
    }

    #[test]
    fn test_condition_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Condition::Rainy).unwrap(), "\"rainy\"");
        let c: Condition = serde_json::from_str("\"cloudy\"").unwrap();
        assert_eq!(c, Condition::Cloudy);
    }

    #[test]
    fn test_legacy_sunny_reads_as_clear() {
        let c: Condition = serde_json::from_str("\"sunny\"").unwrap();
        assert_eq!(c, Condition::Clear);
    }

    #[test]
    fn test_apply_snapshot_updates_city() {
        let mut city = City::seed();
        assert!(city.apply_snapshot(Some(&snapshot())));
        assert_eq!(city.temp, 14);
        assert_eq!(city.condition, Condition::Cloudy);
        assert_eq!(city.timezone.as_deref(), Some("Europe/Paris"));
        assert_eq!(city.utc_offset_seconds, Some(3600));
        assert!(city.current.is_some());
    }

    #[test]
    fn test_apply_none_keeps_previous_values() {
        let mut city = City::seed();
        let before = city.clone();
        assert!(!city.apply_snapshot(None));
        assert_eq!(city, before);
        assert_eq!(city.temp, 22);
        assert_eq!(city.condition, Condition::Rainy);
    }

    #[test]
    fn test_city_reads_minimal_legacy_json() {
        let json = r#"{"id":"1","name":"Casablanca","country":"MA","temp":22,"condition":"rainy","lat":33.5731,"lon":-7.5898}"#;
        let city: City = serde_json::from_str(json).unwrap();
        assert_eq!(city, City::seed());
    }

    #[test]
    fn test_same_place_ignores_name_case() {
        let city = City::seed();
        assert!(city.is_same_place("casablanca", "MA"));
        assert!(!city.is_same_place("Casablanca", "CL"));
    }
}
