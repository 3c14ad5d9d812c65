//! Open-Meteo forecast client and response normalization.

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, NaiveDateTime, Timelike, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;
use weatherly_core::{ApiConfig, ReqwestErrorExt, WeatherError};

use crate::condition::{description, map_condition, video_key};
use crate::types::{CurrentConditions, DailyEntry, HourlyEntry, WeatherSnapshot};

const CURRENT_FIELDS: &str =
    "temperature_2m,weather_code,is_day,wind_speed_10m,relative_humidity_2m,apparent_temperature";
const HOURLY_FIELDS: &str = "temperature_2m,weather_code,is_day,uv_index";
const DAILY_FIELDS: &str = "weather_code,temperature_2m_max,temperature_2m_min,sunrise,sunset,uv_index_max,precipitation_probability_max";

/// Number of hourly entries kept, starting at the current hour.
pub const HOURLY_WINDOW: usize = 24;

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    timezone: Option<String>,
    utc_offset_seconds: Option<i32>,
    current: RawCurrent,
    hourly: RawHourly,
    daily: RawDaily,
}

#[derive(Debug, Deserialize)]
struct RawCurrent {
    temperature_2m: f64,
    weather_code: i32,
    is_day: u8,
    wind_speed_10m: f64,
    relative_humidity_2m: f64,
    apparent_temperature: f64,
}

#[derive(Debug, Deserialize)]
struct RawHourly {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    weather_code: Vec<Option<i32>>,
    is_day: Vec<Option<u8>>,
}

#[derive(Debug, Deserialize)]
struct RawDaily {
    time: Vec<String>,
    weather_code: Vec<Option<i32>>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    sunrise: Vec<String>,
    sunset: Vec<String>,
    #[serde(default)]
    uv_index_max: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_probability_max: Vec<Option<f64>>,
}

/// Weather client for the Open-Meteo forecast API.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    base_url: String,
}

impl WeatherClient {
    pub fn new(api: &ApiConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(api.request_timeout())
            .user_agent(api.user_agent.as_str())
            .build()
            .map_err(|e| WeatherError::Network(e.into_network_error()))?;

        Ok(Self {
            client,
            base_url: api.weather_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch and normalize weather for coordinates.
    ///
    /// Any failure is logged and reported as `None`; callers keep whatever
    /// data they already had.
    pub async fn get_weather(&self, lat: f64, lon: f64) -> Option<WeatherSnapshot> {
        match self.fetch(lat, lon).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!("Weather fetch for {}, {} failed: {}", lat, lon, e);
                None
            }
        }
    }

    /// Typed variant of [`get_weather`](Self::get_weather).
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot, WeatherError> {
        validate_coordinates(lat, lon)?;

        let url = format!("{}/forecast", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", lat.to_string()),
                ("longitude", lon.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("hourly", HOURLY_FIELDS.to_string()),
                ("daily", DAILY_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await
            .map_err(|e| WeatherError::Network(e.into_network_error()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status(status.as_u16()));
        }

        let body: ForecastResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(e.to_string()))?;

        let snapshot = normalize(body, Utc::now())?;
        tracing::debug!(
            "Fetched weather: {}° {} ({} hourly, {} daily)",
            snapshot.current.temp,
            snapshot.current.condition,
            snapshot.hourly.len(),
            snapshot.daily.len()
        );
        Ok(snapshot)
    }
}

fn validate_coordinates(lat: f64, lon: f64) -> Result<(), WeatherError> {
    let valid = lat.is_finite()
        && lon.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lon);
    if valid {
        Ok(())
    } else {
        Err(WeatherError::InvalidCoordinates { lat, lon })
    }
}

/// Round half up, matching how the provider's web clients display temperatures.
pub(crate) fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

fn parse_local_time(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M").ok()
}

/// `2024-05-01T14:00` -> `14:00`
fn clock_part(value: &str) -> String {
    value
        .split_once('T')
        .map(|(_, time)| time.chars().take(5).collect())
        .unwrap_or_default()
}

fn check_len(field: &str, actual: usize, expected: usize) -> Result<(), WeatherError> {
    if actual < expected {
        return Err(WeatherError::Parse(format!(
            "{} has {} entries, expected {}",
            field, actual, expected
        )));
    }
    Ok(())
}

fn normalize(raw: ForecastResponse, now: DateTime<Utc>) -> Result<WeatherSnapshot, WeatherError> {
    let hourly = normalize_hourly(&raw.hourly, raw.utc_offset_seconds, now)?;
    let daily = normalize_daily(&raw.daily)?;

    let is_day = raw.current.is_day != 0;
    let current = CurrentConditions {
        temp: round_half_up(raw.current.temperature_2m),
        condition: map_condition(raw.current.weather_code),
        video: video_key(raw.current.weather_code, is_day),
        wind: round_half_up(raw.current.wind_speed_10m),
        humidity: raw.current.relative_humidity_2m.round().clamp(0.0, 100.0) as u8,
        feels_like: round_half_up(raw.current.apparent_temperature),
        uv: daily.first().and_then(|d| d.uv),
        is_day,
        description: description(raw.current.weather_code).to_string(),
    };

    Ok(WeatherSnapshot {
        current,
        hourly,
        daily,
        timezone: raw.timezone,
        utc_offset_seconds: raw.utc_offset_seconds,
    })
}

fn normalize_hourly(
    raw: &RawHourly,
    utc_offset_seconds: Option<i32>,
    now: DateTime<Utc>,
) -> Result<Vec<HourlyEntry>, WeatherError> {
    let n = raw.time.len();
    check_len("hourly.temperature_2m", raw.temperature_2m.len(), n)?;
    check_len("hourly.weather_code", raw.weather_code.len(), n)?;
    check_len("hourly.is_day", raw.is_day.len(), n)?;

    // Provider times are local to the location, so compare against the
    // location's wall clock rather than the device's.
    let local_now = now.naive_utc()
        + ChronoDuration::seconds(i64::from(utc_offset_seconds.unwrap_or(0)));
    let start = raw
        .time
        .iter()
        .position(|t| {
            parse_local_time(t).is_some_and(|dt| {
                dt.date() == local_now.date() && dt.hour() == local_now.hour()
            })
        })
        .unwrap_or(0);

    let entries = (start..n)
        .take(HOURLY_WINDOW)
        .enumerate()
        .map(|(i, index)| {
            let code = raw.weather_code[index].unwrap_or(0);
            let is_day = raw.is_day[index].unwrap_or(1) != 0;
            HourlyEntry {
                id: i,
                time: clock_part(&raw.time[index]),
                temp: round_half_up(raw.temperature_2m[index].unwrap_or(0.0)),
                condition: map_condition(code),
                video: video_key(code, is_day),
                is_day,
                is_current: i == 0,
            }
        })
        .collect();

    Ok(entries)
}

fn normalize_daily(raw: &RawDaily) -> Result<Vec<DailyEntry>, WeatherError> {
    let n = raw.time.len();
    check_len("daily.weather_code", raw.weather_code.len(), n)?;
    check_len("daily.temperature_2m_max", raw.temperature_2m_max.len(), n)?;
    check_len("daily.temperature_2m_min", raw.temperature_2m_min.len(), n)?;
    check_len("daily.sunrise", raw.sunrise.len(), n)?;
    check_len("daily.sunset", raw.sunset.len(), n)?;

    let global_low = raw
        .temperature_2m_min
        .iter()
        .flatten()
        .copied()
        .reduce(f64::min)
        .map(round_half_up)
        .unwrap_or(0);
    let global_high = raw
        .temperature_2m_max
        .iter()
        .flatten()
        .copied()
        .reduce(f64::max)
        .map(round_half_up)
        .unwrap_or(0);

    raw.time
        .iter()
        .enumerate()
        .map(|(i, time)| {
            let date = NaiveDate::parse_from_str(time, "%Y-%m-%d")
                .map_err(|e| WeatherError::Parse(format!("daily.time[{}]: {}", i, e)))?;
            let code = raw.weather_code[i].unwrap_or(0);
            let day = if i == 0 {
                "Today".to_string()
            } else {
                date.format("%A").to_string()
            };

            Ok(DailyEntry {
                id: i,
                day,
                date,
                high: round_half_up(raw.temperature_2m_max[i].unwrap_or(0.0)),
                low: round_half_up(raw.temperature_2m_min[i].unwrap_or(0.0)),
                uv: raw.uv_index_max.get(i).copied().flatten(),
                precipitation: raw
                    .precipitation_probability_max
                    .get(i)
                    .copied()
                    .flatten()
                    .map(|p| p.round().clamp(0.0, 100.0) as u8)
                    .unwrap_or(0),
                condition: map_condition(code),
                video: video_key(code, true),
                sunrise: clock_part(&raw.sunrise[i]),
                sunset: clock_part(&raw.sunset[i]),
                global_low,
                global_high,
            })
        })
        .collect()
}
