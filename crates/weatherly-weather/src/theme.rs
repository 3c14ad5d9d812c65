//! Colour themes that follow the sky.
//!
//! Weather takes precedence over time of day: any wet condition is stormy
//! and any grey condition is cloudy regardless of the hour.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientTheme {
    Stormy,
    Cloudy,
    Night,
    Morning,
    Sunset,
    Sunny,
}

/// Colour stops and accents for one theme, as CSS colour strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Palette {
    pub gradient_colors: [&'static str; 3],
    pub tint_color: &'static str,
    pub accent: &'static str,
    pub border: &'static str,
}

impl GradientTheme {
    /// Pick a theme from the local hour and a free-form condition string.
    pub fn select(hour: u32, condition: &str) -> Self {
        let cond = condition.to_lowercase();

        if cond.contains("rain") || cond.contains("storm") || cond.contains("snow") {
            Self::Stormy
        } else if cond.contains("cloud") || cond.contains("fog") {
            Self::Cloudy
        } else if hour >= 20 || hour < 6 {
            Self::Night
        } else if hour < 11 {
            Self::Morning
        } else if hour >= 16 {
            Self::Sunset
        } else {
            Self::Sunny
        }
    }

    pub fn palette(&self) -> Palette {
        match self {
            Self::Stormy => Palette {
                gradient_colors: [
                    "rgba(0, 0, 0, 0)",
                    "rgba(30, 41, 59, 0.9)",
                    "rgba(15, 23, 42, 0.98)",
                ],
                tint_color: "rgba(59, 130, 246, 0.08)",
                accent: "#60a5fa",
                border: "rgba(96, 165, 250, 0.25)",
            },
            Self::Cloudy => Palette {
                gradient_colors: [
                    "rgba(0, 0, 0, 0)",
                    "rgba(51, 65, 85, 0.9)",
                    "rgba(30, 41, 59, 0.98)",
                ],
                tint_color: "rgba(148, 163, 184, 0.08)",
                accent: "#94a3b8",
                border: "rgba(148, 163, 184, 0.2)",
            },
            Self::Night => Palette {
                gradient_colors: [
                    "transparent",
                    "rgba(15, 23, 42, 0.85)",
                    "rgba(2, 6, 23, 0.98)",
                ],
                tint_color: "rgba(99, 102, 241, 0.12)",
                accent: "#818cf8",
                border: "rgba(129, 140, 248, 0.3)",
            },
            Self::Morning => Palette {
                gradient_colors: [
                    "transparent",
                    "rgba(180, 83, 9, 0.7)",
                    "rgba(120, 53, 15, 0.95)",
                ],
                tint_color: "rgba(251, 191, 36, 0.1)",
                accent: "#fbbf24",
                border: "rgba(251, 191, 36, 0.3)",
            },
            Self::Sunset => Palette {
                gradient_colors: [
                    "transparent",
                    "rgba(190, 18, 60, 0.75)",
                    "rgba(136, 19, 55, 0.98)",
                ],
                tint_color: "rgba(244, 63, 94, 0.12)",
                accent: "#f43f5e",
                border: "rgba(244, 63, 94, 0.3)",
            },
            Self::Sunny => Palette {
                gradient_colors: [
                    "transparent",
                    "rgba(3, 105, 161, 0.7)",
                    "rgba(12, 74, 110, 0.95)",
                ],
                tint_color: "rgba(56, 189, 248, 0.12)",
                accent: "#38bdf8",
                border: "rgba(56, 189, 248, 0.3)",
            },
        }
    }
}

/// Glass panel styling for the detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherTheme {
    pub theme: GradientTheme,
    pub glass_tint: &'static str,
    pub border: &'static str,
    pub accent: &'static str,
    pub blur_tint: &'static str,
}

impl WeatherTheme {
    /// Night and day are represented by 22:00 and noon.
    pub fn new(condition: &str, is_night: bool) -> Self {
        let theme = GradientTheme::select(if is_night { 22 } else { 12 }, condition);
        let palette = theme.palette();
        Self {
            theme,
            glass_tint: palette.tint_color,
            border: palette.border,
            accent: palette.accent,
            blur_tint: if is_night { "dark" } else { "default" },
        }
    }
}
