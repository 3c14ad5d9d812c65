//! Local persistence for Weatherly.
//!
//! A single SQLite table holds every record as JSON under a namespaced key.
//! [`StorageService`] layers typed saves and loads on top of it.

pub mod clock;
pub mod service;
pub mod store;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use service::{
    StorageService, CACHE_KEY, CITIES_KEY, DEFAULT_CACHE_MAX_AGE, LAST_ACTIVE_CITY_KEY,
    NOTIFICATION_PREFS_KEY, PREFERENCES_KEY,
};
pub use store::{KeyValueStore, StorageResult};
pub use types::{
    CacheEntry, LastCityIndex, NotificationPreferences, Preferences, ViewMode, WeatherCache,
};
