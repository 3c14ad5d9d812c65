//! The weather app's data pipeline, wired together.
//!
//! `WeatherApp` holds the saved city list in memory and keeps storage, the
//! weather cache and the daily reminder in step with it. Network failures
//! never surface as errors here: a city that can't be refreshed keeps its
//! last known values.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use parking_lot::RwLock;
use weatherly_core::{AppError, CityError, Config};
use weatherly_notify::{NotificationBackend, NotificationScheduler};
use weatherly_storage::{NotificationPreferences, StorageService, ViewMode};
use weatherly_weather::{
    City, CitySearchResult, GeocodingClient, SearchDebouncer, VideoCache, WeatherClient,
    WeatherSnapshot,
};

use crate::presentation::Presentation;

/// In-memory view of what the user sees.
#[derive(Debug, Clone, PartialEq)]
pub struct AppSnapshot {
    pub cities: Vec<City>,
    pub active_index: usize,
    /// City the daily reminder describes
    pub notification_index: usize,
    pub view_mode: ViewMode,
}

#[derive(Debug)]
struct AppState {
    cities: Vec<City>,
    active_index: usize,
    notification_index: usize,
    view_mode: ViewMode,
}

/// Outcome of a startup refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupReport {
    pub cities: usize,
    pub refreshed: usize,
    pub notifications_enabled: bool,
}

pub struct WeatherApp {
    config: Config,

    /// Persistent records (cities, preferences, cache)
    storage: Arc<StorageService>,

    /// Forecast provider
    weather: WeatherClient,

    /// Geocoder, shared with the debouncer
    geocoder: Arc<GeocodingClient>,

    /// Keystroke-driven search
    debouncer: SearchDebouncer<GeocodingClient>,

    /// Daily reminder
    scheduler: NotificationScheduler,

    /// Sticky background video picks
    videos: Arc<VideoCache>,

    state: RwLock<AppState>,
}

impl WeatherApp {
    pub fn new(
        config: Config,
        storage: Arc<StorageService>,
        backend: Arc<dyn NotificationBackend>,
    ) -> Result<Self, AppError> {
        Self::with_parts(
            config,
            storage,
            NotificationScheduler::new(backend),
            Arc::new(VideoCache::new()),
        )
    }

    pub fn with_parts(
        config: Config,
        storage: Arc<StorageService>,
        scheduler: NotificationScheduler,
        videos: Arc<VideoCache>,
    ) -> Result<Self, AppError> {
        let weather = WeatherClient::new(&config.api)?;
        let geocoder = Arc::new(GeocodingClient::new(&config.api, &config.search)?);
        let debouncer = SearchDebouncer::new(
            geocoder.clone(),
            config.search.debounce(),
            config.search.min_query_len,
        );

        Ok(Self {
            config,
            storage,
            weather,
            geocoder,
            debouncer,
            scheduler,
            videos,
            state: RwLock::new(AppState {
                cities: vec![City::seed()],
                active_index: 0,
                notification_index: 0,
                view_mode: ViewMode::Full,
            }),
        })
    }

    pub fn storage(&self) -> &Arc<StorageService> {
        &self.storage
    }

    pub fn scheduler(&self) -> &NotificationScheduler {
        &self.scheduler
    }

    pub fn video_cache(&self) -> &Arc<VideoCache> {
        &self.videos
    }

    pub fn snapshot(&self) -> AppSnapshot {
        let state = self.state.read();
        AppSnapshot {
            cities: state.cities.clone(),
            active_index: state.active_index,
            notification_index: state.notification_index,
            view_mode: state.view_mode,
        }
    }

    pub fn cities(&self) -> Vec<City> {
        self.state.read().cities.clone()
    }

    pub fn active_city(&self) -> Option<City> {
        let state = self.state.read();
        state.cities.get(state.active_index).cloned()
    }

    /// The city the daily reminder describes, falling back to the first.
    pub fn notification_city(&self) -> Option<City> {
        let state = self.state.read();
        state
            .cities
            .get(state.notification_index)
            .or_else(|| state.cities.first())
            .cloned()
    }

    /// Load saved cities and the selection without touching the network.
    pub fn load(&self) -> AppSnapshot {
        let cities = self.storage.load_cities();
        self.install(cities);
        self.snapshot()
    }

    fn install(&self, cities: Vec<City>) {
        let prefs = self.storage.load_preferences();
        let mode = prefs.view_mode;
        let active_index = prefs
            .last_city_index
            .get(mode)
            .min(cities.len().saturating_sub(1));
        let notification_index = self
            .storage
            .load_last_active_city()
            .and_then(|saved| cities.iter().position(|c| c.id == saved.id))
            .unwrap_or(0);

        let mut state = self.state.write();
        state.cities = cities;
        state.active_index = active_index;
        state.notification_index = notification_index;
        state.view_mode = mode;
    }

    /// Load saved data, refresh every city and apply notification settings.
    pub async fn start(&self) -> StartupReport {
        let mut cities = self.storage.load_cities();
        tracing::info!("Loaded {} saved cities", cities.len());

        let results = join_all(
            cities
                .iter()
                .map(|city| self.weather.get_weather(city.lat, city.lon)),
        )
        .await;

        let mut refreshed = 0;
        for (city, snapshot) in cities.iter_mut().zip(results) {
            if city.apply_snapshot(snapshot.as_ref()) {
                refreshed += 1;
                self.cache_snapshot(&city.id, snapshot.as_ref());
            } else {
                tracing::warn!("Failed to refresh weather for {}, keeping last values", city.name);
            }
        }
        tracing::info!("Refreshed {}/{} cities", refreshed, cities.len());

        self.install(cities.clone());
        self.persist_cities(&cities);

        let notification_city = self.notification_city();
        let notification_prefs = self
            .scheduler
            .initialize(&self.storage, notification_city.as_ref())
            .await;

        StartupReport {
            cities: cities.len(),
            refreshed,
            notifications_enabled: notification_prefs.enabled,
        }
    }

    fn cache_snapshot(&self, city_id: &str, snapshot: Option<&WeatherSnapshot>) {
        if let Some(snapshot) = snapshot {
            if let Err(e) = self.storage.cache_weather(city_id, snapshot) {
                tracing::warn!("Failed to cache weather for {}: {}", city_id, e);
            }
        }
    }

    fn persist_cities(&self, cities: &[City]) {
        if let Err(e) = self.storage.save_cities(cities) {
            tracing::error!("Failed to save cities: {}", e);
        }
    }

    /// Refresh one city, preferring a fresh cache entry over the network.
    ///
    /// Returns whether the city's weather changed.
    pub async fn refresh_city(&self, index: usize) -> Result<bool, AppError> {
        let city = self
            .state
            .read()
            .cities
            .get(index)
            .cloned()
            .ok_or(CityError::IndexOutOfRange(index))?;

        let cached = if self.storage.is_cache_fresh(&city.id, self.config.cache.max_age()) {
            self.storage.cached_weather(&city.id)
        } else {
            None
        };

        let snapshot = match cached {
            Some(snapshot) => Some(snapshot),
            None => {
                let fetched = self.weather.get_weather(city.lat, city.lon).await;
                self.cache_snapshot(&city.id, fetched.as_ref());
                fetched
            }
        };

        let Some(snapshot) = snapshot else {
            tracing::warn!("Weather unavailable for {}, keeping last values", city.name);
            return Ok(false);
        };

        let cities = {
            let mut state = self.state.write();
            // The list may have changed while we were fetching.
            let Some(target) = state.cities.iter_mut().find(|c| c.id == city.id) else {
                return Ok(false);
            };
            target.apply_snapshot(Some(&snapshot));
            state.cities.clone()
        };
        self.persist_cities(&cities);
        Ok(true)
    }

    /// Add a city picked from search results and make it active.
    pub async fn add_city(&self, result: &CitySearchResult) -> Result<usize, AppError> {
        if self
            .state
            .read()
            .cities
            .iter()
            .any(|c| c.is_same_place(&result.name, &result.country))
        {
            tracing::info!("City already exists: {}", result.name);
            return Err(CityError::Duplicate(result.name.clone()).into());
        }

        let mut city = City::from_search(result);
        let snapshot = self.weather.get_weather(city.lat, city.lon).await;
        if city.apply_snapshot(snapshot.as_ref()) {
            self.cache_snapshot(&city.id, snapshot.as_ref());
        } else {
            tracing::warn!("Failed to fetch initial weather for {}", city.name);
        }

        let (index, cities, mode) = {
            let mut state = self.state.write();
            // Re-check: another add may have landed during the fetch.
            if state
                .cities
                .iter()
                .any(|c| c.is_same_place(&city.name, &city.country))
            {
                return Err(CityError::Duplicate(city.name).into());
            }
            state.cities.push(city);
            state.active_index = state.cities.len() - 1;
            (state.active_index, state.cities.clone(), state.view_mode)
        };

        tracing::info!("Added city: {}", cities[index].name);
        self.persist_cities(&cities);
        self.persist_selection(&cities[index], mode, index);
        Ok(index)
    }

    /// Remove a city. The last remaining city can't be removed.
    pub fn remove_city(&self, index: usize) -> Result<City, AppError> {
        let (removed, cities, active, mode) = {
            let mut state = self.state.write();
            if index >= state.cities.len() {
                return Err(CityError::IndexOutOfRange(index).into());
            }
            if state.cities.len() <= 1 {
                return Err(CityError::LastCity.into());
            }

            let removed = state.cities.remove(index);
            if state.active_index >= index && state.active_index > 0 {
                state.active_index -= 1;
            }
            if state.notification_index == index {
                state.notification_index = 0;
            } else if state.notification_index > index {
                state.notification_index -= 1;
            }
            (
                removed,
                state.cities.clone(),
                state.active_index,
                state.view_mode,
            )
        };

        tracing::info!("Removed city: {}", removed.name);
        self.persist_cities(&cities);
        if let Some(city) = cities.get(active) {
            self.persist_selection(city, mode, active);
        }
        Ok(removed)
    }

    pub fn select_city(&self, index: usize) -> Result<City, AppError> {
        let (city, mode) = {
            let mut state = self.state.write();
            let city = state
                .cities
                .get(index)
                .cloned()
                .ok_or(CityError::IndexOutOfRange(index))?;
            state.active_index = index;
            (city, state.view_mode)
        };
        self.persist_selection(&city, mode, index);
        Ok(city)
    }

    fn persist_selection(&self, city: &City, mode: ViewMode, index: usize) {
        if let Err(e) = self.storage.update_last_city_index(mode, index) {
            tracing::error!("Failed to save selected city: {}", e);
        } else {
            tracing::debug!("Selected city saved: {}", city.name);
        }
    }

    /// Switch layouts. Memory only changes once the preference is stored.
    pub fn set_view_mode(&self, mode: ViewMode) -> Result<(), AppError> {
        let index = self.state.read().active_index;
        self.storage.update_view_mode(mode)?;
        self.storage.update_last_city_index(mode, index)?;
        self.state.write().view_mode = mode;
        Ok(())
    }

    /// Pick the city the daily reminder describes and reschedule if enabled.
    pub async fn set_notification_city(&self, index: usize) -> Result<City, AppError> {
        let city = {
            let mut state = self.state.write();
            let city = state
                .cities
                .get(index)
                .cloned()
                .ok_or(CityError::IndexOutOfRange(index))?;
            state.notification_index = index;
            city
        };

        self.storage.save_last_active_city(&city)?;
        tracing::info!("Notification city set to {}", city.name);

        let prefs = self.storage.load_notification_preferences();
        if prefs.enabled {
            self.scheduler
                .update_settings(&self.storage, prefs, Some(&city))
                .await?;
        }
        Ok(city)
    }

    /// Save reminder settings and reschedule for the notification city.
    ///
    /// Returns whether a daily reminder is scheduled afterwards.
    pub async fn update_notifications(&self, prefs: NotificationPreferences) -> Result<bool, AppError> {
        let city = self.notification_city();
        self.scheduler
            .update_settings(&self.storage, prefs, city.as_ref())
            .await
    }

    pub async fn send_test_notification(&self) -> Result<bool, AppError> {
        let city = self.notification_city();
        Ok(self.scheduler.send_test(city.as_ref()).await?)
    }

    /// Debounced search; `None` means a newer query superseded this one.
    pub async fn search(&self, query: &str) -> Option<Vec<CitySearchResult>> {
        self.debouncer.search(query).await
    }

    /// Search without debouncing.
    pub async fn search_now(&self, query: &str) -> Result<Vec<CitySearchResult>, AppError> {
        Ok(self.geocoder.try_search(query).await?)
    }

    /// Theme, local time and background for the active city.
    pub fn presentation(&self) -> Option<Presentation> {
        self.active_city()
            .map(|city| Presentation::for_city(&city, &self.videos, Utc::now()))
    }

    /// Wipe saved cities, preferences and cache, back to first-launch state.
    pub fn reset(&self) -> Result<(), AppError> {
        self.storage.clear_all()?;
        self.videos.clear();
        let mut state = self.state.write();
        state.cities = vec![City::seed()];
        state.active_index = 0;
        state.notification_index = 0;
        state.view_mode = ViewMode::Full;
        Ok(())
    }
}
