//! Weatherly application layer.
//!
//! Wires storage, the weather and geocoding clients, the notification
//! scheduler and the video cache into [`WeatherApp`], which front ends drive.

pub mod app;
pub mod presentation;

pub use app::{AppSnapshot, StartupReport, WeatherApp};
pub use presentation::Presentation;
