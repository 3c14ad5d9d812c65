//! Background video selection.
//!
//! Videos are grouped by time period and a coarse sky category. A pick is
//! random within its group but sticky: [`VideoCache`] remembers the first
//! URL chosen for each `period_category` pair so re-renders keep the same
//! clip until the cache is cleared.

use std::collections::{HashMap, HashSet};
use std::fmt;

use parking_lot::Mutex;

const BASE_URL: &str = "https://res.cloudinary.com/dft6axtes/video/upload";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimePeriod {
    Day,
    Sunset,
    Night,
}

impl TimePeriod {
    /// 05-06 dawn and 17-19 evening share the sunset clips.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=6 => Self::Sunset,
            7..=16 => Self::Day,
            17..=19 => Self::Sunset,
            _ => Self::Night,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Sunset => "sunset",
            Self::Night => "night",
        }
    }

}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoCategory {
    Clear,
    Clouds,
    Rain,
    Snow,
    Storm,
    Default,
}

impl VideoCategory {
    /// Keyword match on a free-form condition, first hit wins.
    pub fn from_condition(condition: &str) -> Self {
        let c = condition.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| c.contains(w));

        if has(&["clear", "sunny"]) {
            Self::Clear
        } else if has(&["cloud", "overcast", "partly"]) {
            Self::Clouds
        } else if has(&["rain", "drizzle", "shower"]) {
            Self::Rain
        } else if has(&["snow", "sleet", "ice"]) {
            Self::Snow
        } else if has(&["thunder", "storm", "lightning"]) {
            Self::Storm
        } else if has(&["fog", "mist", "haze"]) {
            Self::Clouds
        } else {
            Self::Default
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Clouds => "clouds",
            Self::Rain => "rain",
            Self::Snow => "snow",
            Self::Storm => "storm",
            Self::Default => "default",
        }
    }
}

/// Static catalogue of clip paths relative to the CDN base.
#[derive(Debug, Clone, Copy, Default)]
pub struct VideoLibrary;

impl VideoLibrary {
    fn paths(period: TimePeriod, category: VideoCategory) -> &'static [&'static str] {
        use TimePeriod::*;
        use VideoCategory::*;

        match (period, category) {
            (Day, Clear) => &[
                "v1766841211/day_clear_1_kevkxe.mp4",
                "v1766841093/day_clear_ah26xj.mp4",
            ],
            (Day, Clouds) => &[
                "v1766841227/day_clouds_1_vbal7k.mp4",
                "v1766841186/day_clouds_2_eenj6g.mp4",
                "v1766841025/day_clouds_4_qpmyln.mp4",
                "v1766845534/day_clouds_5_lio3zi.mp4",
            ],
            (Day, Snow) => &["v1766845563/day_snow_1_gbjt6u.mp4"],
            (Day, Rain) => &[
                "v1766841031/night_rain_voztvm.mp4",
                "v1766846138/day_rain_wvfqbe.mp4",
                "v1766846443/day_rain_1_z6ohwl.mp4",
            ],
            (Day, Storm) => &[],
            (Day, Default) => &["v1766841211/day_clear_1_kevkxe.mp4"],

            (Sunset, Clear) => &[
                "v1766841133/Sunset_binrd8.mp4",
                "v1766841121/sunrise_zebbbl.mp4",
                "v1766841001/sunrise_1_a3wqvh.mp4",
                "v1766841195/dawn_clear_jihzhd.mp4",
            ],
            (Sunset, Clouds) => &[
                "v1766841151/dawn_clouds_rlvxjh.mp4",
                "v1766841133/Sunset_binrd8.mp4",
            ],
            (Sunset, Snow) => &["v1766840995/dawn_snow_i2lejr.mp4"],
            (Sunset, Rain) | (Sunset, Storm) => &["v1766841151/dawn_clouds_rlvxjh.mp4"],
            (Sunset, Default) => &[
                "v1766841133/Sunset_binrd8.mp4",
                "v1766841121/sunrise_zebbbl.mp4",
            ],

            (Night, Clear) => &[
                "v1766841177/night_clear_rsqeiq.mp4",
                "v1766841195/night_clear_1_scb0ga.mp4",
                "v1766841098/night_clear_3_lvsnm8.mp4",
            ],
            (Night, Clouds) => &["v1766841177/night_clear_rsqeiq.mp4"],
            (Night, Snow) => &["v1766841110/night_snow_bkbqor.mp4"],
            (Night, Rain) => &[
                "v1766841031/night_rain_voztvm.mp4",
                "v1766841101/night_rain_1_wmxweq.mp4",
                "v1766846292/night_rain_2_uetlh9.mp4",
            ],
            (Night, Storm) => &["v1766840986/night_storm_uf54ca.mp4"],
            (Night, Default) => &[
                "v1766841177/night_clear_rsqeiq.mp4",
                "v1766841195/night_clear_1_scb0ga.mp4",
            ],
        }
    }

    /// Candidate URLs for a group; an empty group falls back to the period default.
    pub fn candidates(period: TimePeriod, category: VideoCategory) -> Vec<String> {
        let mut paths = Self::paths(period, category);
        if paths.is_empty() {
            paths = Self::paths(period, VideoCategory::Default);
        }
        paths.iter().map(|p| format!("{}/{}", BASE_URL, p)).collect()
    }

    /// Every distinct URL in the catalogue, in catalogue order.
    pub fn all_urls() -> Vec<String> {
        const PERIODS: [TimePeriod; 3] = [TimePeriod::Day, TimePeriod::Sunset, TimePeriod::Night];
        const CATEGORIES: [VideoCategory; 6] = [
            VideoCategory::Clear,
            VideoCategory::Clouds,
            VideoCategory::Snow,
            VideoCategory::Rain,
            VideoCategory::Storm,
            VideoCategory::Default,
        ];

        let mut seen = HashSet::new();
        PERIODS
            .iter()
            .flat_map(|&period| CATEGORIES.iter().map(move |&category| Self::paths(period, category)))
            .flat_map(|paths| paths.iter())
            .filter(|path| seen.insert(**path))
            .map(|path| format!("{}/{}", BASE_URL, path))
            .collect()
    }
}

struct CacheState {
    rng: fastrand::Rng,
    picks: HashMap<String, String>,
}

/// Sticky random video picks, shared by whoever renders backgrounds.
pub struct VideoCache {
    state: Mutex<CacheState>,
}

impl Default for VideoCache {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoCache {
    pub fn new() -> Self {
        Self::with_rng(fastrand::Rng::new())
    }

    /// Deterministic picks for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(fastrand::Rng::with_seed(seed))
    }

    fn with_rng(rng: fastrand::Rng) -> Self {
        Self {
            state: Mutex::new(CacheState {
                rng,
                picks: HashMap::new(),
            }),
        }
    }

    pub fn cache_key(period: TimePeriod, category: VideoCategory) -> String {
        format!("{}_{}", period.as_str(), category.as_str())
    }

    /// URL for a condition at a local hour, memoized per period and category.
    pub fn video_url(&self, condition: &str, hour: u32) -> Option<String> {
        let period = TimePeriod::from_hour(hour);
        let category = VideoCategory::from_condition(condition);
        let key = Self::cache_key(period, category);

        let mut state = self.state.lock();
        if let Some(url) = state.picks.get(&key) {
            return Some(url.clone());
        }

        let candidates = VideoLibrary::candidates(period, category);
        if candidates.is_empty() {
            return None;
        }
        let url = candidates[state.rng.usize(..candidates.len())].clone();
        tracing::debug!(
            "{} + {} -> {} (cached)",
            period,
            category.as_str(),
            url.rsplit('/').next().unwrap_or_default()
        );
        state.picks.insert(key, url.clone());
        Some(url)
    }

    pub fn clear(&self) {
        self.state.lock().picks.clear();
        tracing::debug!("Video cache cleared");
    }

    pub fn evict(&self, key: &str) -> bool {
        self.state.lock().picks.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.state.lock().picks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Everything worth preloading.
    pub fn all_urls(&self) -> Vec<String> {
        VideoLibrary::all_urls()
    }
}
