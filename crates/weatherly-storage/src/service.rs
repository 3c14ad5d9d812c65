//! Typed persistence for the app's records.
//!
//! Each record is a JSON blob under its own key. Saves report failures;
//! loads never fail and fall back to defaults with a warning, so a corrupt
//! or missing record can't keep the app from starting.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use weatherly_core::StorageError;
use weatherly_weather::{City, WeatherSnapshot};

use crate::clock::{Clock, SystemClock};
use crate::store::{KeyValueStore, StorageResult};
use crate::types::{
    CacheEntry, NotificationPreferences, Preferences, ViewMode, WeatherCache,
};

pub const CITIES_KEY: &str = "@weatherapp_cities";
pub const PREFERENCES_KEY: &str = "@weatherapp_preferences";
pub const CACHE_KEY: &str = "@weatherapp_cache";
pub const LAST_ACTIVE_CITY_KEY: &str = "@weatherapp_last_active_city";
pub const NOTIFICATION_PREFS_KEY: &str = "@weather_notification_prefs";

/// Cache entries younger than this are served without a network call.
pub const DEFAULT_CACHE_MAX_AGE: Duration = Duration::from_secs(3 * 60 * 60);

pub struct StorageService {
    store: KeyValueStore,
    clock: Arc<dyn Clock>,
}

impl StorageService {
    pub fn new(store: KeyValueStore) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: KeyValueStore, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Fresh in-memory storage.
    pub fn in_memory() -> StorageResult<Self> {
        Ok(Self::new(KeyValueStore::in_memory()?))
    }

    pub fn store(&self) -> &KeyValueStore {
        &self.store
    }

    fn save_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        let json = serde_json::to_string(value)?;
        self.store.set(key, &json).map_err(|e| {
            tracing::error!("Failed to save {}: {}", key, e);
            e
        })
    }

    /// `Ok(None)` when absent, `Err` when unreadable.
    fn read_json<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.store.get(key)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Like `read_json` but degrades to `None` with a warning.
    fn load_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.read_json(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Ignoring unreadable {}: {}", key, e);
                None
            }
        }
    }

    // Cities

    pub fn save_cities(&self, cities: &[City]) -> StorageResult<()> {
        self.save_json(CITIES_KEY, cities)?;
        tracing::debug!("Saved {} cities", cities.len());
        Ok(())
    }

    /// Saved cities, or the seed list when none are stored.
    pub fn load_cities(&self) -> Vec<City> {
        match self.load_json::<Vec<City>>(CITIES_KEY) {
            Some(cities) if !cities.is_empty() => cities,
            _ => vec![City::seed()],
        }
    }

    // Preferences

    pub fn save_preferences(&self, prefs: &Preferences) -> StorageResult<()> {
        self.save_json(PREFERENCES_KEY, prefs)
    }

    pub fn load_preferences(&self) -> Preferences {
        self.load_json(PREFERENCES_KEY).unwrap_or_default()
    }

    pub fn update_view_mode(&self, mode: ViewMode) -> StorageResult<Preferences> {
        let mut prefs = self.load_preferences();
        prefs.view_mode = mode;
        self.save_preferences(&prefs)?;
        Ok(prefs)
    }

    pub fn update_last_city_index(&self, mode: ViewMode, index: usize) -> StorageResult<Preferences> {
        let mut prefs = self.load_preferences();
        prefs.last_city_index.set(mode, index);
        self.save_preferences(&prefs)?;
        Ok(prefs)
    }

    // Weather cache

    /// Store a snapshot for a city, stamped with the current time.
    pub fn cache_weather(&self, city_id: &str, snapshot: &WeatherSnapshot) -> StorageResult<()> {
        let entry = CacheEntry {
            data: snapshot.clone(),
            timestamp: self.clock.now_ms(),
        };
        self.store.update(CACHE_KEY, |current| {
            let mut cache: WeatherCache = current
                .and_then(|json| match serde_json::from_str(&json) {
                    Ok(cache) => Some(cache),
                    Err(e) => {
                        tracing::warn!("Resetting unreadable weather cache: {}", e);
                        None
                    }
                })
                .unwrap_or_default();
            cache.insert(city_id.to_string(), entry);
            serde_json::to_string(&cache).map_err(StorageError::from)
        })?;
        tracing::debug!("Cached weather for city {}", city_id);
        Ok(())
    }

    pub fn weather_cache(&self) -> WeatherCache {
        self.load_json(CACHE_KEY).unwrap_or_default()
    }

    pub fn cached_weather(&self, city_id: &str) -> Option<WeatherSnapshot> {
        let entry = self.weather_cache().remove(city_id)?;
        let age_minutes = (self.clock.now_ms() - entry.timestamp) / 60_000;
        tracing::debug!("Using cached weather for {} ({} min old)", city_id, age_minutes);
        Some(entry.data)
    }

    /// True iff an entry exists and is strictly younger than `max_age`.
    pub fn is_cache_fresh(&self, city_id: &str, max_age: Duration) -> bool {
        let Some(entry) = self.weather_cache().remove(city_id) else {
            return false;
        };
        let age = self.clock.now_ms() - entry.timestamp;
        let max_age_ms = i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX);
        age < max_age_ms
    }

    pub fn is_cache_fresh_default(&self, city_id: &str) -> bool {
        self.is_cache_fresh(city_id, DEFAULT_CACHE_MAX_AGE)
    }

    // Last active city

    pub fn save_last_active_city(&self, city: &City) -> StorageResult<()> {
        self.save_json(LAST_ACTIVE_CITY_KEY, city)
    }

    pub fn load_last_active_city(&self) -> Option<City> {
        self.load_json(LAST_ACTIVE_CITY_KEY)
    }

    // Notifications

    pub fn save_notification_preferences(&self, prefs: &NotificationPreferences) -> StorageResult<()> {
        self.save_json(NOTIFICATION_PREFS_KEY, prefs)
    }

    pub fn load_notification_preferences(&self) -> NotificationPreferences {
        self.load_json(NOTIFICATION_PREFS_KEY).unwrap_or_default()
    }

    /// Forget cities, preferences and cached weather.
    pub fn clear_all(&self) -> StorageResult<()> {
        self.store
            .remove_many(&[CITIES_KEY, PREFERENCES_KEY, CACHE_KEY])?;
        tracing::info!("Cleared saved cities, preferences and weather cache");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::clock::ManualClock;
    use crate::types::LastCityIndex;
    use weatherly_weather::{Condition, CurrentConditions};

    const T0: i64 = 1_700_000_000_000;

    fn service() -> (StorageService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(T0));
        let storage =
            StorageService::with_clock(KeyValueStore::in_memory().unwrap(), clock.clone());
        (storage, clock)
    }

    fn snapshot(temp: i32) -> WeatherSnapshot {
        WeatherSnapshot {
            current: CurrentConditions {
                temp,
                condition: Condition::Clear,
                video: "clear_day".to_string(),
                wind: 5,
                humidity: 40,
                feels_like: temp,
                uv: None,
                is_day: true,
                description: "Clear Sky".to_string(),
            },
            hourly: vec![],
            daily: vec![],
            timezone: Some("Europe/Paris".to_string()),
            utc_offset_seconds: Some(3600),
        }
    }

    fn paris() -> City {
        City {
            id: "42".to_string(),
            name: "Paris".to_string(),
            country: "FR".to_string(),
            lat: 48.85,
            lon: 2.35,
            temp: 18,
            ..City::seed()
        }
    }

    #[test]
    fn test_first_launch_yields_seed_city() {
        let (storage, _) = service();
        let cities = storage.load_cities();
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].name, "Casablanca");
        assert_eq!(cities[0].condition, Condition::Rainy);
    }

    #[test]
    fn test_empty_or_corrupt_city_list_yields_seed() {
        let (storage, _) = service();
        storage.save_cities(&[]).unwrap();
        assert_eq!(storage.load_cities(), vec![City::seed()]);

        storage.store().set(CITIES_KEY, "{not json").unwrap();
        assert_eq!(storage.load_cities(), vec![City::seed()]);
    }

    #[test]
    fn test_cities_round_trip_in_order() {
        let (storage, _) = service();
        let cities = vec![City::seed(), paris()];
        storage.save_cities(&cities).unwrap();
        assert_eq!(storage.load_cities(), cities);
    }

    #[test]
    fn test_preferences_default_and_merge() {
        let (storage, _) = service();
        assert_eq!(storage.load_preferences(), Preferences::default());

        storage
            .store()
            .set(PREFERENCES_KEY, r#"{"lastCityIndex":{"full":2}}"#)
            .unwrap();
        let prefs = storage.load_preferences();
        assert_eq!(prefs.view_mode, ViewMode::Full);
        assert_eq!(prefs.last_city_index, LastCityIndex { full: 2, minimal: 0 });

        storage.store().set(PREFERENCES_KEY, "{\"viewMode\": 7").unwrap();
        assert_eq!(storage.load_preferences(), Preferences::default());
    }

    #[test]
    fn test_update_preferences() {
        let (storage, _) = service();
        storage.update_view_mode(ViewMode::Minimal).unwrap();
        storage.update_last_city_index(ViewMode::Minimal, 4).unwrap();
        let prefs = storage.update_last_city_index(ViewMode::Full, 1).unwrap();

        assert_eq!(prefs, storage.load_preferences());
        assert_eq!(prefs.view_mode, ViewMode::Minimal);
        assert_eq!(prefs.last_city_index.minimal, 4);
        assert_eq!(prefs.last_city_index.full, 1);
    }

    #[test]
    fn test_cache_freshness_window() {
        let (storage, clock) = service();
        storage.cache_weather("42", &snapshot(20)).unwrap();

        clock.set(T0 + 2 * 3_600_000 + 59 * 60_000);
        assert!(storage.is_cache_fresh_default("42"));

        clock.set(T0 + 3 * 3_600_000);
        assert!(!storage.is_cache_fresh_default("42"));

        assert!(storage.is_cache_fresh("42", Duration::from_secs(4 * 3600)));
        assert!(!storage.is_cache_fresh("missing", Duration::from_secs(4 * 3600)));
    }

    #[test]
    fn test_cache_is_keyed_per_city() {
        let (storage, clock) = service();
        storage.cache_weather("1", &snapshot(10)).unwrap();
        clock.advance(Duration::from_secs(60));
        storage.cache_weather("42", &snapshot(20)).unwrap();
        storage.cache_weather("42", &snapshot(21)).unwrap();

        let cache = storage.weather_cache();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache["1"].timestamp, T0);
        assert_eq!(cache["42"].timestamp, T0 + 60_000);
        assert_eq!(storage.cached_weather("42").unwrap().current.temp, 21);
        assert!(storage.cached_weather("7").is_none());
    }

    #[test]
    fn test_corrupt_cache_is_replaced_on_write() {
        let (storage, _) = service();
        storage.store().set(CACHE_KEY, "garbage").unwrap();
        assert!(storage.weather_cache().is_empty());
        assert!(!storage.is_cache_fresh_default("1"));

        storage.cache_weather("1", &snapshot(10)).unwrap();
        assert_eq!(storage.weather_cache().len(), 1);
    }

    #[test]
    fn test_last_active_city() {
        let (storage, _) = service();
        assert!(storage.load_last_active_city().is_none());
        storage.save_last_active_city(&paris()).unwrap();
        assert_eq!(storage.load_last_active_city().unwrap().name, "Paris");
    }

    #[test]
    fn test_notification_preferences() {
        let (storage, _) = service();
        assert_eq!(
            storage.load_notification_preferences(),
            NotificationPreferences::default()
        );
        let prefs = NotificationPreferences {
            enabled: false,
            hour: 20,
            minute: 30,
        };
        storage.save_notification_preferences(&prefs).unwrap();
        assert_eq!(storage.load_notification_preferences(), prefs);
    }

    #[test]
    fn test_clear_all_keeps_last_active_and_notifications() {
        let (storage, _) = service();
        storage.save_cities(&[paris()]).unwrap();
        storage.update_view_mode(ViewMode::Minimal).unwrap();
        storage.cache_weather("42", &snapshot(20)).unwrap();
        storage.save_last_active_city(&paris()).unwrap();
        storage
            .save_notification_preferences(&NotificationPreferences::default())
            .unwrap();

        storage.clear_all().unwrap();

        assert_eq!(storage.load_cities(), vec![City::seed()]);
        assert_eq!(storage.load_preferences(), Preferences::default());
        assert!(storage.weather_cache().is_empty());
        assert!(storage.load_last_active_city().is_some());
        assert!(storage.store().get(NOTIFICATION_PREFS_KEY).unwrap().is_some());
    }
}
