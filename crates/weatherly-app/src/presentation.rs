//! Everything the UI needs to dress a city page.

use chrono::{DateTime, Utc};
use serde::Serialize;
use weatherly_weather::clock::{city_hour, city_time_label, is_night};
use weatherly_weather::{City, GradientTheme, Palette, TimePeriod, VideoCache, WeatherTheme};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    /// Hour at the city, not on the device
    pub local_hour: u32,
    pub local_time: String,
    pub is_night: bool,
    #[serde(skip)]
    pub period: TimePeriod,
    pub gradient: GradientTheme,
    pub palette: Palette,
    pub panel: WeatherTheme,
    pub video_url: Option<String>,
}

impl Presentation {
    pub fn for_city(city: &City, videos: &VideoCache, now: DateTime<Utc>) -> Self {
        let hour = city_hour(city, now);
        let condition = city.condition.as_str();
        let night = is_night(hour);
        let gradient = GradientTheme::select(hour, condition);

        Self {
            local_hour: hour,
            local_time: city_time_label(city, now),
            is_night: night,
            period: TimePeriod::from_hour(hour),
            gradient,
            palette: gradient.palette(),
            panel: WeatherTheme::new(condition, night),
            video_url: videos.video_url(condition, hour),
        }
    }
}
