//! Notification copy.
//!
//! Titles greet by time of day and show the temperature; bodies name the
//! city and add a short "vibe" line picked at random from a pool keyed by
//! the condition.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

const RAINY: &[&str] = &[
    "Perfect cozy vibes 🌧️",
    "Lo-fi & raindrop energy 🎧",
    "Umbrella gang rise up ☔",
    "Nature's chill playlist 🌧️",
    "Rainy day mood activated 💧",
];

const CLOUDY: &[&str] = &[
    "Moody sky aesthetic ☁️",
    "Cloud watching vibes ☁️",
    "Soft grey energy today 🌥️",
    "Chill overcast mood ☁️",
];

const SUNNY: &[&str] = &[
    "Main character energy ☀️",
    "Golden hour all day ✨",
    "Vitamin D loading... ☀️",
    "Sunglasses required 😎",
    "Perfect vibe weather! 🌞",
];

const SNOWY: &[&str] = &[
    "Winter wonderland mode ❄️",
    "Hot cocoa weather ☕❄️",
    "Snow day magic ✨❄️",
    "Cozy szn activated 🧣",
];

const STORMY: &[&str] = &[
    "Dramatic weather era ⛈️",
    "Thunder rumbles = nap time 💤",
    "Epic storm energy ⚡",
    "Main character storm arc ⛈️",
];

const FOGGY: &[&str] = &[
    "Mysterious aesthetic 🌫️",
    "Silent Hill but make it cute 🌫️",
    "Mystical fog vibes ✨",
    "Dreamy haze mode 💭",
];

const WINDY: &[&str] = &[
    "Hair flip weather 💨",
    "Kite flying energy 🪁",
    "Windy adventure day 🌬️",
];

const DEFAULT_VIBES: &[&str] = &[
    "Check your weather vibe ✨",
    "New day, new vibes 🌈",
    "Weather check time! 🔮",
];

/// What kind of notification a payload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    DailyWeather,
    Test,
}

/// Structured payload carried alongside the visible text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub city_name: String,
    pub temp: Option<i32>,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    pub data: NotificationData,
}

/// Builds notification text. Owns the RNG so tests can seed it.
pub struct MessageComposer {
    rng: Mutex<fastrand::Rng>,
}

impl Default for MessageComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageComposer {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::new()),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
        }
    }

    pub fn greeting(hour: u32) -> &'static str {
        match hour {
            5..=11 => "Good morning",
            12..=16 => "Good afternoon",
            17..=20 => "Good evening",
            _ => "Night owl",
        }
    }

    pub fn emoji(condition: &str) -> &'static str {
        let c = condition.to_lowercase();
        if c.contains("rain") || c.contains("drizzle") {
            "🌧️"
        } else if c.contains("thunder") || c.contains("storm") {
            "⛈️"
        } else if c.contains("snow") {
            "❄️"
        } else if c.contains("fog") || c.contains("mist") {
            "🌫️"
        } else if c.contains("cloud") || c.contains("overcast") {
            "☁️"
        } else if c.contains("clear") {
            "☀️"
        } else if c.contains("sun") {
            "🌞"
        } else if c.contains("wind") {
            "💨"
        } else {
            "✨"
        }
    }

    fn temp_prefix(temp: Option<i32>) -> &'static str {
        match temp {
            Some(t) if t <= 0 => "Bundle up! ",
            Some(t) if t <= 10 => "Jacket weather! ",
            Some(t) if t >= 35 => "Stay cool! ",
            Some(t) if t >= 28 => "Kinda hot! ",
            _ => "",
        }
    }

    /// Vibe pool for a condition. Keyword order differs from [`Self::emoji`].
    pub fn vibe_pool(condition: &str) -> &'static [&'static str] {
        let c = condition.to_lowercase();
        if c.contains("rain") || c.contains("drizzle") {
            RAINY
        } else if c.contains("cloud") || c.contains("overcast") {
            CLOUDY
        } else if c.contains("sun") || c.contains("clear") {
            SUNNY
        } else if c.contains("snow") {
            SNOWY
        } else if c.contains("thunder") || c.contains("storm") {
            STORMY
        } else if c.contains("fog") || c.contains("mist") {
            FOGGY
        } else if c.contains("wind") {
            WINDY
        } else {
            DEFAULT_VIBES
        }
    }

    pub fn vibe(&self, condition: &str, temp: Option<i32>) -> String {
        let pool = Self::vibe_pool(condition);
        let pick = pool[self.rng.lock().usize(..pool.len())];
        format!("{}{}", Self::temp_prefix(temp), pick)
    }

    /// Full notification for a greeting hour and optional city details.
    pub fn compose(
        &self,
        kind: NotificationKind,
        hour: u32,
        city_name: Option<&str>,
        temp: Option<i32>,
        condition: &str,
    ) -> NotificationContent {
        let city_name = city_name.filter(|n| !n.is_empty()).unwrap_or("your area");
        let temp_part = temp.map(|t| format!("{}° ", t)).unwrap_or_default();

        NotificationContent {
            title: format!("{}! {}{}", Self::greeting(hour), temp_part, Self::emoji(condition)),
            body: format!("{} — {}", city_name, self.vibe(condition, temp)),
            data: NotificationData {
                kind,
                city_name: city_name.to_string(),
                temp,
                condition: condition.to_string(),
            },
        }
    }
}
