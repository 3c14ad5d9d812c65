#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use tempfile::TempDir;
use weatherly_app::WeatherApp;
use weatherly_core::{ApiConfig, AppError, CityError, Config};
use weatherly_notify::{
    InMemoryBackend, MessageComposer, NotificationBackend, NotificationScheduler, Trigger,
};
use weatherly_storage::{KeyValueStore, NotificationPreferences, StorageService, ViewMode};
use weatherly_weather::{City, CitySearchResult, Condition, VideoCache};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn forecast(temp: f64, code: i32) -> serde_json::Value {
    let hours: Vec<String> = (0..24).map(|h| format!("2024-05-01T{:02}:00", h)).collect();
    serde_json::json!({
        "timezone": "UTC",
        "utc_offset_seconds": 0,
        "current": {
            "temperature_2m": temp,
            "weather_code": code,
            "is_day": 1,
            "wind_speed_10m": 8.0,
            "relative_humidity_2m": 55,
            "apparent_temperature": temp - 1.0
        },
        "hourly": {
            "time": hours,
            "temperature_2m": vec![temp; 24],
            "weather_code": vec![code; 24],
            "is_day": vec![1; 24]
        },
        "daily": {
            "time": ["2024-05-01"],
            "weather_code": [code],
            "temperature_2m_max": [temp + 3.0],
            "temperature_2m_min": [temp - 4.0],
            "sunrise": ["2024-05-01T06:30"],
            "sunset": ["2024-05-01T20:45"],
            "uv_index_max": [4.2],
            "precipitation_probability_max": [20]
        }
    })
}

async fn mount_forecast(server: &MockServer, lat: &str, temp: f64, code: i32) {
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("latitude", lat))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast(temp, code)))
        .mount(server)
        .await;
}

struct Harness {
    app: WeatherApp,
    storage: Arc<StorageService>,
    backend: Arc<InMemoryBackend>,
    _dir: TempDir,
}

fn harness(server: &MockServer) -> Harness {
    let dir = TempDir::new().unwrap();
    let config = Config {
        data_dir: dir.path().to_path_buf(),
        api: ApiConfig {
            weather_base_url: server.uri(),
            geocoding_base_url: server.uri(),
            ..ApiConfig::default()
        },
        ..Config::default()
    };
    let storage = Arc::new(StorageService::new(
        KeyValueStore::new(config.database_path()).unwrap(),
    ));
    let backend = Arc::new(InMemoryBackend::new());
    let scheduler =
        NotificationScheduler::with_composer(backend.clone(), MessageComposer::with_seed(3));
    let app = WeatherApp::with_parts(
        config,
        storage.clone(),
        scheduler,
        Arc::new(VideoCache::with_seed(3)),
    )
    .unwrap();

    Harness {
        app,
        storage,
        backend,
        _dir: dir,
    }
}

fn search_result(id: &str, name: &str, country: &str, lat: f64, lon: f64) -> CitySearchResult {
    CitySearchResult {
        id: id.to_string(),
        name: name.to_string(),
        country: country.to_string(),
        lat,
        lon,
        display_name: format!("{}, {}", name, country),
    }
}

#[tokio::test]
async fn first_launch_refreshes_seed_and_schedules_reminder() {
    let server = MockServer::start().await;
    mount_forecast(&server, "33.5731", 19.6, 2).await;
    let h = harness(&server);

    let report = h.app.start().await;
    assert_eq!(report.cities, 1);
    assert_eq!(report.refreshed, 1);
    assert!(report.notifications_enabled);

    let city = h.app.active_city().unwrap();
    assert_eq!(city.name, "Casablanca");
    assert_eq!(city.temp, 20);
    assert_eq!(city.condition, Condition::Cloudy);
    assert!(city.hourly.is_some());

    assert_eq!(h.storage.load_cities(), vec![city.clone()]);
    assert!(h.storage.is_cache_fresh_default(&city.id));

    let scheduled = h.backend.scheduled().await.unwrap();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(scheduled[0].request.trigger, Trigger::Daily { hour: 8, minute: 0 });
    assert_eq!(scheduled[0].request.content.data.city_name, "Casablanca");
}

#[tokio::test]
async fn failed_refresh_keeps_previous_values() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let h = harness(&server);

    let report = h.app.start().await;
    assert_eq!(report.refreshed, 0);

    let city = h.app.active_city().unwrap();
    assert_eq!(city, City::seed());
    assert_eq!(city.temp, 22);
    assert_eq!(city.condition, Condition::Rainy);
}

#[tokio::test]
async fn parallel_refresh_matches_each_city() {
    let server = MockServer::start().await;
    mount_forecast(&server, "33.5731", 25.0, 0).await;
    mount_forecast(&server, "59.91", -2.0, 73).await;
    let h = harness(&server);

    let mut oslo = City::from_search(&search_result("7", "Oslo", "NO", 59.91, 10.75));
    oslo.temp = 5;
    h.storage.save_cities(&[City::seed(), oslo]).unwrap();
    h.storage.update_last_city_index(ViewMode::Full, 1).unwrap();

    let report = h.app.start().await;
    assert_eq!(report.refreshed, 2);

    let cities = h.app.cities();
    assert_eq!(cities[0].name, "Casablanca");
    assert_eq!(cities[0].temp, 25);
    assert_eq!(cities[0].condition, Condition::Clear);
    assert_eq!(cities[1].name, "Oslo");
    assert_eq!(cities[1].temp, -2);
    assert_eq!(cities[1].condition, Condition::Rainy);
    assert_eq!(h.app.snapshot().active_index, 1);
}

#[tokio::test]
async fn saved_index_is_clamped_to_list() {
    let server = MockServer::start().await;
    mount_forecast(&server, "33.5731", 20.0, 0).await;
    let h = harness(&server);
    h.storage.update_view_mode(ViewMode::Minimal).unwrap();
    h.storage.update_last_city_index(ViewMode::Minimal, 9).unwrap();

    h.app.start().await;
    let snapshot = h.app.snapshot();
    assert_eq!(snapshot.active_index, 0);
    assert_eq!(snapshot.view_mode, ViewMode::Minimal);
}

#[tokio::test]
async fn add_city_selects_it_and_rejects_duplicates() {
    let server = MockServer::start().await;
    mount_forecast(&server, "33.5731", 20.0, 0).await;
    mount_forecast(&server, "48.85", 14.0, 61).await;
    let h = harness(&server);
    h.app.start().await;

    let paris = search_result("99", "Paris", "FR", 48.85, 2.35);
    let index = h.app.add_city(&paris).await.unwrap();
    assert_eq!(index, 1);
    assert_eq!(h.app.snapshot().active_index, 1);

    let added = h.app.active_city().unwrap();
    assert_eq!(added.temp, 14);
    assert_eq!(added.condition, Condition::Rainy);
    assert_eq!(h.storage.load_cities().len(), 2);
    assert_eq!(h.app.notification_city().unwrap().name, "Casablanca");

    let again = search_result("100", "paris", "FR", 48.85, 2.35);
    let err = h.app.add_city(&again).await.unwrap_err();
    assert!(matches!(err, AppError::City(CityError::Duplicate(_))));
    assert_eq!(h.app.cities().len(), 2);

    // Same name, different country is a different place.
    let texas = search_result("101", "Paris", "US", 33.66, -95.55);
    assert!(h.app.add_city(&texas).await.is_ok());
}

#[tokio::test]
async fn add_city_without_weather_uses_placeholders() {
    let server = MockServer::start().await;
    mount_forecast(&server, "33.5731", 20.0, 0).await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("latitude", "64.14"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let h = harness(&server);
    h.app.start().await;

    h.app
        .add_city(&search_result("5", "Reykjavik", "IS", 64.14, -21.94))
        .await
        .unwrap();
    let city = h.app.active_city().unwrap();
    assert_eq!(city.temp, 0);
    assert_eq!(city.condition, Condition::Cloudy);
    assert!(city.hourly.is_none());
}

#[tokio::test]
async fn remove_city_shifts_selection_and_keeps_one() {
    let server = MockServer::start().await;
    mount_forecast(&server, "33.5731", 20.0, 0).await;
    mount_forecast(&server, "48.85", 14.0, 0).await;
    mount_forecast(&server, "52.52", 12.0, 0).await;
    let h = harness(&server);
    h.app.start().await;

    h.app
        .add_city(&search_result("2", "Paris", "FR", 48.85, 2.35))
        .await
        .unwrap();
    h.app
        .add_city(&search_result("3", "Berlin", "DE", 52.52, 13.4))
        .await
        .unwrap();
    assert_eq!(h.app.snapshot().active_index, 2);

    // Removing before the active city moves the selection down with it.
    h.app.remove_city(0).unwrap();
    let snapshot = h.app.snapshot();
    assert_eq!(snapshot.active_index, 1);
    assert_eq!(snapshot.cities[1].name, "Berlin");

    // Removing after the active city leaves it alone.
    h.app.select_city(0).unwrap();
    h.app.remove_city(1).unwrap();
    assert_eq!(h.app.snapshot().active_index, 0);
    assert_eq!(h.app.cities().len(), 1);

    let err = h.app.remove_city(0).unwrap_err();
    assert!(matches!(err, AppError::City(CityError::LastCity)));
    assert_eq!(h.storage.load_cities().len(), 1);
    assert_eq!(h.storage.load_cities()[0].name, "Paris");
}

#[tokio::test]
async fn refresh_serves_fresh_cache_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast(11.0, 3)))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&server);

    assert!(h.app.refresh_city(0).await.unwrap());
    assert!(h.app.refresh_city(0).await.unwrap());
    assert_eq!(h.app.active_city().unwrap().temp, 11);

    let err = h.app.refresh_city(5).await.unwrap_err();
    assert!(matches!(err, AppError::City(CityError::IndexOutOfRange(5))));
}

#[tokio::test]
async fn notification_settings_default_to_first_city() {
    let server = MockServer::start().await;
    mount_forecast(&server, "33.5731", 20.0, 0).await;
    let h = harness(&server);
    h.app.start().await;

    let prefs = NotificationPreferences {
        enabled: true,
        hour: 20,
        minute: 30,
    };
    assert!(h.app.update_notifications(prefs).await.unwrap());

    let scheduled = h.backend.scheduled().await.unwrap();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(scheduled[0].request.trigger, Trigger::Daily { hour: 20, minute: 30 });
    assert!(scheduled[0].request.content.title.starts_with("Good evening! 20° "));
    assert_eq!(h.storage.load_notification_preferences(), prefs);

    assert!(h.app.send_test_notification().await.unwrap());
    assert_eq!(h.backend.delivered().len(), 1);
    assert_eq!(h.backend.scheduled().await.unwrap().len(), 1);

    let scheduled = h
        .app
        .update_notifications(NotificationPreferences {
            enabled: false,
            ..prefs
        })
        .await
        .unwrap();
    assert!(!scheduled);
    assert!(h.backend.scheduled().await.unwrap().is_empty());
}

#[tokio::test]
async fn reminder_follows_notification_city_not_active_city() {
    let server = MockServer::start().await;
    mount_forecast(&server, "33.5731", 20.0, 0).await;
    mount_forecast(&server, "48.85", 14.0, 61).await;
    let h = harness(&server);
    h.app.start().await;

    h.app
        .add_city(&search_result("2", "Paris", "FR", 48.85, 2.35))
        .await
        .unwrap();
    let prefs = NotificationPreferences {
        enabled: true,
        hour: 20,
        minute: 30,
    };
    assert!(h.app.update_notifications(prefs).await.unwrap());
    let scheduled = h.backend.scheduled().await.unwrap();
    assert_eq!(scheduled[0].request.content.data.city_name, "Casablanca");

    // Choosing the city reschedules straight away while reminders are on.
    let city = h.app.set_notification_city(1).await.unwrap();
    assert_eq!(city.name, "Paris");
    let scheduled = h.backend.scheduled().await.unwrap();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(scheduled[0].request.content.data.city_name, "Paris");
    assert!(scheduled[0].request.content.title.starts_with("Good evening! 14° "));
    assert_eq!(h.storage.load_last_active_city().unwrap().name, "Paris");

    h.app.select_city(0).unwrap();
    assert_eq!(h.app.active_city().unwrap().name, "Casablanca");
    assert!(h.app.update_notifications(prefs).await.unwrap());
    let scheduled = h.backend.scheduled().await.unwrap();
    assert_eq!(scheduled[0].request.content.data.city_name, "Paris");
    assert!(scheduled[0].request.content.title.starts_with("Good evening! 14° "));

    assert!(h.app.send_test_notification().await.unwrap());
    assert_eq!(h.backend.delivered()[0].content.data.city_name, "Paris");

    // A fresh load picks the stored choice back up.
    assert_eq!(h.app.load().notification_index, 1);

    let err = h.app.set_notification_city(5).await.unwrap_err();
    assert!(matches!(err, AppError::City(CityError::IndexOutOfRange(5))));

    h.app.remove_city(1).unwrap();
    assert_eq!(h.app.snapshot().notification_index, 0);
    assert_eq!(h.app.notification_city().unwrap().name, "Casablanca");
}

#[tokio::test]
async fn notification_city_change_leaves_disabled_reminder_off() {
    let server = MockServer::start().await;
    mount_forecast(&server, "33.5731", 20.0, 0).await;
    mount_forecast(&server, "48.85", 14.0, 61).await;
    let h = harness(&server);
    h.app.start().await;
    h.app
        .add_city(&search_result("2", "Paris", "FR", 48.85, 2.35))
        .await
        .unwrap();
    h.app
        .update_notifications(NotificationPreferences {
            enabled: false,
            hour: 8,
            minute: 0,
        })
        .await
        .unwrap();

    h.app.set_notification_city(1).await.unwrap();
    assert!(h.backend.scheduled().await.unwrap().is_empty());
    assert_eq!(h.app.notification_city().unwrap().name, "Paris");
}

#[tokio::test]
async fn view_mode_is_stored_and_shown() {
    let server = MockServer::start().await;
    let h = harness(&server);
    h.app.load();

    h.app.set_view_mode(ViewMode::Minimal).unwrap();
    let prefs = h.storage.load_preferences();
    assert_eq!(prefs.view_mode, ViewMode::Minimal);
    assert_eq!(prefs.last_city_index.get(ViewMode::Minimal), 0);
    assert_eq!(h.app.snapshot().view_mode, ViewMode::Minimal);

    // Memory never runs ahead of what a reload would see.
    assert_eq!(h.app.load().view_mode, h.app.snapshot().view_mode);
}

#[tokio::test]
async fn search_goes_through_geocoder() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Lisbon"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "place_id": 11,
            "lat": "38.72",
            "lon": "-9.14",
            "class": "place",
            "type": "city",
            "address": {"city": "Lisbon", "country": "Portugal", "country_code": "pt"}
        }])))
        .mount(&server)
        .await;
    let h = harness(&server);

    let results = h.app.search("Lisbon").await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].country, "PT");
    assert_eq!(h.app.search_now("L").await.unwrap(), vec![]);
}

#[tokio::test]
async fn presentation_and_reset() {
    let server = MockServer::start().await;
    mount_forecast(&server, "33.5731", 20.0, 0).await;
    let h = harness(&server);
    h.app.start().await;

    let view = h.app.presentation().unwrap();
    assert!(view.video_url.is_some());
    assert_eq!(h.app.video_cache().len(), 1);

    h.app.set_view_mode(ViewMode::Minimal).unwrap();
    h.app.reset().unwrap();
    assert!(h.app.video_cache().is_empty());
    assert_eq!(h.storage.load_preferences().view_mode, ViewMode::Full);
    assert_eq!(h.app.cities(), vec![City::seed()]);
}

#[tokio::test]
async fn load_restores_saved_state_offline() {
    let server = MockServer::start().await;
    let h = harness(&server);

    let mut lima = City::from_search(&search_result("8", "Lima", "PE", -12.05, -77.04));
    lima.temp = 17;
    h.storage.save_cities(&[City::seed(), lima]).unwrap();
    h.storage.update_view_mode(ViewMode::Minimal).unwrap();
    h.storage.update_last_city_index(ViewMode::Minimal, 1).unwrap();

    let snapshot = h.app.load();
    assert_eq!(snapshot.cities.len(), 2);
    assert_eq!(snapshot.active_index, 1);
    assert_eq!(snapshot.view_mode, ViewMode::Minimal);
    assert_eq!(h.app.active_city().unwrap().temp, 17);
    assert!(server.received_requests().await.unwrap().is_empty());
}
