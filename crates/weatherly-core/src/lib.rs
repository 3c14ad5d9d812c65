//! Shared plumbing for Weatherly: configuration, error taxonomy and logging.

pub mod config;
pub mod error;

pub use config::{
    ApiConfig, CacheConfig, Config, NotificationConfig, SearchConfig, ValidationResult,
};
pub use error::{
    AppError, CityError, NetworkError, NotificationError, ReqwestErrorExt, RusqliteErrorExt,
    StorageError, WeatherError,
};

use anyhow::Result;

/// Initialize logging for the process.
///
/// Honours `RUST_LOG`; falls back to `info`. Safe to call more than once,
/// later calls are no-ops.
pub fn init() -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("Tracing subscriber already installed");
        return Ok(());
    }

    tracing::info!("Weatherly core initialized");
    Ok(())
}
