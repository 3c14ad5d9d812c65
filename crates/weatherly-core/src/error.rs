//! Centralized error types for Weatherly.
//!
//! Every failure in the data pipeline has a defined fallback, so these types
//! mostly travel as far as a log line and a `user_message()` for the UI.
//! Nothing here is meant to terminate the process.

use thiserror::Error;

/// Anything an app-level operation can fail with.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),

    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    #[error("City list error: {0}")]
    City(#[from] CityError),
}

impl AppError {
    /// Short text for a toast or inline banner.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Storage(e) => e.user_message(),
            AppError::Weather(e) => e.user_message(),
            AppError::Notification(e) => e.user_message(),
            AppError::City(e) => e.user_message(),
        }
    }
}

/// Transport failures talking to the forecast or geocoding provider.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Could not reach provider: {0}")]
    Unreachable(String),

    #[error("Provider did not answer in time")]
    Timeout,

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Undecodable body: {0}")]
    Decode(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::Unreachable(_) => "You appear to be offline.",
            NetworkError::Timeout => "Weather is taking too long to load.",
            NetworkError::Http { status, .. } if *status >= 500 => {
                "Weather service unavailable. Please try again later."
            }
            NetworkError::Http { .. } => "Weather service error. Please try again.",
            NetworkError::Decode(_) => "Weather data may be outdated.",
        }
    }
}

/// Local persistence errors (SQLite key-value store, JSON blobs).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Data corruption detected: {0}")]
    Corruption(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    pub fn user_message(&self) -> &'static str {
        match self {
            StorageError::Unavailable(_) => {
                "Unable to access local data. Try restarting the app."
            }
            StorageError::QueryFailed(_) => "Saving failed. Your changes may not persist.",
            StorageError::Corruption(_) => "Saved data was unreadable. Defaults were restored.",
            StorageError::Serialization(_) => "Saved data was unreadable. Defaults were restored.",
        }
    }
}

/// Weather and geocoding provider errors.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Provider returned status {0}")]
    Status(u16),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid coordinates: {lat}, {lon}")]
    InvalidCoordinates { lat: f64, lon: f64 },
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::Network(e) => e.user_message(),
            WeatherError::Status(status) if *status >= 500 => {
                "Weather service unavailable. Please try again later."
            }
            WeatherError::Status(_) => "Weather service error. Please try again.",
            WeatherError::Parse(_) => "Weather data may be outdated.",
            WeatherError::InvalidCoordinates { .. } => "That location could not be used.",
        }
    }
}

/// Notification scheduling errors.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Invalid notification time {hour:02}:{minute:02}")]
    InvalidTime { hour: u32, minute: u32 },
}

impl NotificationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NotificationError::InvalidTime { .. } => "Pick a valid reminder time.",
        }
    }
}

/// Saved city list errors.
#[derive(Debug, Error)]
pub enum CityError {
    #[error("Cannot remove the last remaining city")]
    LastCity,

    #[error("City already saved: {0}")]
    Duplicate(String),

    #[error("No city at index {0}")]
    IndexOutOfRange(usize),
}

impl CityError {
    pub fn user_message(&self) -> &'static str {
        match self {
            CityError::LastCity => "Keep at least one city in your list.",
            CityError::Duplicate(_) => "That city is already in your list.",
            CityError::IndexOutOfRange(_) => "That city no longer exists.",
        }
    }
}

/// Classify a reqwest failure.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            return NetworkError::Timeout;
        }
        if self.is_decode() {
            return NetworkError::Decode(self.to_string());
        }
        match self.status() {
            Some(status) => NetworkError::Http {
                status: status.as_u16(),
                message: self.to_string(),
            },
            None => NetworkError::Unreachable(self.to_string()),
        }
    }
}

/// Classify a SQLite failure.
pub trait RusqliteErrorExt {
    fn into_storage_error(self) -> StorageError;
}

impl RusqliteErrorExt for rusqlite::Error {
    fn into_storage_error(self) -> StorageError {
        match &self {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("corrupt") => {
                StorageError::Corruption(self.to_string())
            }
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::CannotOpen =>
            {
                StorageError::Unavailable(self.to_string())
            }
            _ => StorageError::QueryFailed(self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_are_non_empty() {
        let errors: Vec<AppError> = vec![
            NetworkError::Timeout.into(),
            StorageError::QueryFailed("test".into()).into(),
            WeatherError::Status(503).into(),
            NotificationError::InvalidTime { hour: 24, minute: 0 }.into(),
            CityError::LastCity.into(),
        ];

        for err in errors {
            assert!(!err.user_message().is_empty(), "empty message for {err}");
        }
    }

    #[test]
    fn test_app_error_conversion() {
        let err: AppError = CityError::LastCity.into();
        assert!(matches!(err, AppError::City(CityError::LastCity)));
    }

    #[test]
    fn test_weather_status_message_depends_on_class() {
        assert_eq!(
            WeatherError::Status(503).user_message(),
            "Weather service unavailable. Please try again later."
        );
        assert_eq!(
            WeatherError::Status(400).user_message(),
            "Weather service error. Please try again."
        );
    }

    #[test]
    fn test_network_error_propagates_through_weather() {
        let err = WeatherError::from(NetworkError::Timeout);
        assert_eq!(err.user_message(), NetworkError::Timeout.user_message());
    }

    #[test]
    fn test_invalid_time_display_is_zero_padded() {
        let err = NotificationError::InvalidTime { hour: 7, minute: 5 };
        assert_eq!(err.to_string(), "Invalid notification time 07:05");
    }

    #[test]
    fn test_serde_error_maps_to_serialization() {
        let parse = serde_json::from_str::<u32>("not json");
        let Err(e) = parse else {
            unreachable!("input is not valid JSON");
        };
        let err: StorageError = e.into();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
