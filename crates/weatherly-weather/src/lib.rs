//! Weather domain for Weatherly
//!
//! Fetches forecasts from Open-Meteo, searches cities through Nominatim and
//! normalizes everything into the app's small vocabulary. Also derives the
//! time-of-day hints (local hour, theme, background video) the UI keys off.

pub mod clock;
pub mod condition;
pub mod geocode;
pub mod provider;
pub mod search;
pub mod theme;
pub mod types;
pub mod video;

pub use clock::{city_hour, city_time, city_time_label, is_night, local_hour_for, local_time_for};
pub use condition::{description, map_condition, video_key, AssetKind};
pub use geocode::{CitySearch, GeocodingClient};
pub use provider::WeatherClient;
pub use search::SearchDebouncer;
pub use theme::{GradientTheme, Palette, WeatherTheme};
pub use types::*;
pub use video::{TimePeriod, VideoCache, VideoCategory, VideoLibrary};
