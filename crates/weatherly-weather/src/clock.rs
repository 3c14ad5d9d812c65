//! Wall-clock time at a city.
//!
//! Theme, greeting and video choices all key off the hour *at the city*, not
//! on the device. The provider reports an IANA zone name and a raw UTC
//! offset; the zone wins when it parses, then the offset, then device time.

use chrono::{DateTime, FixedOffset, Local, Timelike, Utc};
use chrono_tz::Tz;

use crate::types::City;

/// Wall-clock time in `timezone`, else at `offset_seconds`, else on the
/// device. Every local-hour lookup goes through here.
pub fn local_time_for(
    timezone: Option<&str>,
    offset_seconds: Option<i32>,
    now: DateTime<Utc>,
) -> DateTime<FixedOffset> {
    if let Some(name) = timezone {
        match name.parse::<Tz>() {
            Ok(tz) => return now.with_timezone(&tz).fixed_offset(),
            Err(_) => tracing::debug!("Unknown timezone '{}', trying offset", name),
        }
    }
    match offset_seconds.and_then(FixedOffset::east_opt) {
        Some(offset) => now.with_timezone(&offset),
        None => now.with_timezone(&Local).fixed_offset(),
    }
}

/// Hour (0-23) in `timezone`, falling back to the device's local hour when
/// the zone is missing or unknown.
pub fn local_hour_for(timezone: Option<&str>, now: DateTime<Utc>) -> u32 {
    local_time_for(timezone, None, now).hour()
}

/// Wall-clock time at a saved city.
pub fn city_time(city: &City, now: DateTime<Utc>) -> DateTime<FixedOffset> {
    local_time_for(city.timezone.as_deref(), city.utc_offset_seconds, now)
}

pub fn city_hour(city: &City, now: DateTime<Utc>) -> u32 {
    city_time(city, now).hour()
}

/// `HH:MM` at the city, for headers and the CLI.
pub fn city_time_label(city: &City, now: DateTime<Utc>) -> String {
    city_time(city, now).format("%H:%M").to_string()
}

/// Night for theming purposes: 19:00 through 05:59.
pub fn is_night(hour: u32) -> bool {
    hour >= 19 || hour < 6
}
