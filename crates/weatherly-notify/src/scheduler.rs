//! Keeps one daily weather reminder in sync with user preferences.

use std::sync::Arc;

use chrono::{Local, Timelike};
use parking_lot::Mutex;
use weatherly_core::{AppError, NotificationError};
use weatherly_storage::{NotificationPreferences, StorageService};
use weatherly_weather::City;

use crate::backend::{
    ChannelSpec, NotificationBackend, NotificationRequest, NotificationResult, Trigger,
    DAILY_CHANNEL_ID,
};
use crate::message::{MessageComposer, NotificationKind};

const TEST_TEMP: i32 = 22;
const TEST_CONDITION: &str = "clear";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Scheduled { hour: u32, minute: u32 },
}

pub struct NotificationScheduler {
    backend: Arc<dyn NotificationBackend>,
    composer: MessageComposer,
    state: Mutex<SchedulerState>,
}

impl NotificationScheduler {
    pub fn new(backend: Arc<dyn NotificationBackend>) -> Self {
        Self::with_composer(backend, MessageComposer::new())
    }

    pub fn with_composer(backend: Arc<dyn NotificationBackend>, composer: MessageComposer) -> Self {
        Self {
            backend,
            composer,
            state: Mutex::new(SchedulerState::Idle),
        }
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.lock()
    }

    pub fn backend(&self) -> &Arc<dyn NotificationBackend> {
        &self.backend
    }

    /// Ask for permission if needed and register the daily channel.
    async fn ensure_permission(&self) -> NotificationResult<bool> {
        let mut permission = self.backend.permission_status().await?;
        if !permission.is_granted() {
            permission = self.backend.request_permission().await?;
        }
        if !permission.is_granted() {
            tracing::info!("Notification permission not granted");
            return Ok(false);
        }
        self.backend
            .register_channel(&ChannelSpec::daily_weather())
            .await?;
        Ok(true)
    }

    /// Replace any existing reminder with one at `hour:minute`.
    ///
    /// Returns `Ok(false)` when permission is refused; the scheduler is
    /// left idle in that case.
    pub async fn schedule_daily(
        &self,
        hour: u32,
        minute: u32,
        city: Option<&City>,
    ) -> NotificationResult<bool> {
        if hour > 23 || minute > 59 {
            return Err(NotificationError::InvalidTime { hour, minute });
        }

        self.cancel().await?;

        if !self.ensure_permission().await? {
            tracing::warn!("Cannot schedule daily notification: no permission");
            return Ok(false);
        }

        let content = self.composer.compose(
            NotificationKind::DailyWeather,
            hour,
            city.map(|c| c.name.as_str()),
            city.map(|c| c.temp),
            city.map(|c| c.condition.as_str()).unwrap_or_default(),
        );
        self.backend
            .schedule(NotificationRequest {
                content,
                trigger: Trigger::Daily { hour, minute },
                channel_id: Some(DAILY_CHANNEL_ID.to_string()),
            })
            .await?;

        *self.state.lock() = SchedulerState::Scheduled { hour, minute };
        tracing::info!("Notification scheduled for {}:{:02}", hour, minute);
        Ok(true)
    }

    pub async fn cancel(&self) -> NotificationResult<()> {
        self.backend.cancel_all().await?;
        *self.state.lock() = SchedulerState::Idle;
        tracing::debug!("All notifications cancelled");
        Ok(())
    }

    /// Fire one notification now, greeting by the device's current hour.
    pub async fn send_test(&self, city: Option<&City>) -> NotificationResult<bool> {
        self.send_test_at(city, Local::now().hour()).await
    }

    /// As [`Self::send_test`] with an explicit greeting hour.
    pub async fn send_test_at(&self, city: Option<&City>, hour: u32) -> NotificationResult<bool> {
        if !self.ensure_permission().await? {
            tracing::warn!("Cannot send test notification: no permission");
            return Ok(false);
        }

        let content = self.composer.compose(
            NotificationKind::Test,
            hour,
            city.map(|c| c.name.as_str()),
            Some(city.map_or(TEST_TEMP, |c| c.temp)),
            city.map_or(TEST_CONDITION, |c| c.condition.as_str()),
        );
        self.backend
            .schedule(NotificationRequest {
                content,
                trigger: Trigger::Immediate,
                channel_id: Some(DAILY_CHANNEL_ID.to_string()),
            })
            .await?;

        tracing::info!("Test notification sent");
        Ok(true)
    }

    /// Apply stored preferences at startup.
    ///
    /// Without an explicit city the last active city is used. Failures are
    /// logged; the loaded preferences are returned either way.
    pub async fn initialize(
        &self,
        storage: &StorageService,
        city: Option<&City>,
    ) -> NotificationPreferences {
        let prefs = storage.load_notification_preferences();

        let fallback;
        let city = match city {
            Some(city) => Some(city),
            None => {
                fallback = storage.load_last_active_city();
                if let Some(city) = &fallback {
                    tracing::debug!("Using last active city for notifications: {}", city.name);
                }
                fallback.as_ref()
            }
        };

        let result = if prefs.enabled {
            self.schedule_daily(prefs.hour, prefs.minute, city).await.map(|_| ())
        } else {
            self.cancel().await
        };
        if let Err(e) = result {
            tracing::warn!("Failed to initialize notifications: {}", e);
        }

        prefs
    }

    /// Persist new preferences, then schedule or cancel to match.
    ///
    /// Returns whether a daily reminder is scheduled afterwards.
    pub async fn update_settings(
        &self,
        storage: &StorageService,
        prefs: NotificationPreferences,
        city: Option<&City>,
    ) -> Result<bool, AppError> {
        if prefs.hour > 23 || prefs.minute > 59 {
            return Err(NotificationError::InvalidTime {
                hour: prefs.hour,
                minute: prefs.minute,
            }
            .into());
        }

        storage.save_notification_preferences(&prefs)?;
        tracing::info!(
            "Notification preferences saved: enabled={} {}:{:02}",
            prefs.enabled,
            prefs.hour,
            prefs.minute
        );

        if prefs.enabled {
            Ok(self.schedule_daily(prefs.hour, prefs.minute, city).await?)
        } else {
            self.cancel().await?;
            Ok(false)
        }
    }
}
