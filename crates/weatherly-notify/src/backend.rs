//! Platform notification abstraction.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use weatherly_core::NotificationError;

use crate::message::NotificationContent;

pub type NotificationResult<T> = Result<T, NotificationError>;

pub const DAILY_CHANNEL_ID: &str = "weather-daily";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
    Undetermined,
}

impl Permission {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    Default,
    High,
}

/// Delivery channel settings, registered once permission is granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSpec {
    pub id: String,
    pub name: String,
    pub importance: Importance,
    pub vibration_pattern: Vec<u64>,
    pub light_color: String,
    pub sound: String,
}

impl ChannelSpec {
    pub fn daily_weather() -> Self {
        Self {
            id: DAILY_CHANNEL_ID.to_string(),
            name: "Daily Weather".to_string(),
            importance: Importance::High,
            vibration_pattern: vec![0, 250, 250, 250],
            light_color: "#60A5FA".to_string(),
            sound: "default".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trigger {
    /// Deliver right away.
    Immediate,
    /// Repeat every day at a local wall-clock time.
    Daily { hour: u32, minute: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub content: NotificationContent,
    pub trigger: Trigger,
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledNotification {
    pub id: String,
    pub request: NotificationRequest,
}

/// OS notification facilities.
#[async_trait]
pub trait NotificationBackend: Send + Sync {
    async fn permission_status(&self) -> NotificationResult<Permission>;

    /// Prompt the user if the platform needs to. Returns the resulting status.
    async fn request_permission(&self) -> NotificationResult<Permission>;

    async fn register_channel(&self, channel: &ChannelSpec) -> NotificationResult<()>;

    /// Returns the platform id of the scheduled notification.
    async fn schedule(&self, request: NotificationRequest) -> NotificationResult<String>;

    async fn cancel_all(&self) -> NotificationResult<()>;

    /// Pending recurring notifications. Immediate ones are never listed.
    async fn scheduled(&self) -> NotificationResult<Vec<ScheduledNotification>>;
}

#[derive(Debug)]
struct InMemoryState {
    permission: Permission,
    grant_on_request: bool,
    channels: Vec<ChannelSpec>,
    scheduled: Vec<ScheduledNotification>,
    delivered: Vec<NotificationRequest>,
    next_id: u64,
}

/// Records everything, delivers nothing. Used headless and in tests.
#[derive(Debug)]
pub struct InMemoryBackend {
    state: Mutex<InMemoryState>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Permission already granted.
    pub fn new() -> Self {
        Self::with_permission(Permission::Granted, true)
    }

    /// Start with `permission`; a request flips it to granted only when
    /// `grant_on_request` is set.
    pub fn with_permission(permission: Permission, grant_on_request: bool) -> Self {
        Self {
            state: Mutex::new(InMemoryState {
                permission,
                grant_on_request,
                channels: Vec::new(),
                scheduled: Vec::new(),
                delivered: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Immediate notifications sent so far.
    pub fn delivered(&self) -> Vec<NotificationRequest> {
        self.state.lock().delivered.clone()
    }

    pub fn channels(&self) -> Vec<ChannelSpec> {
        self.state.lock().channels.clone()
    }
}

#[async_trait]
impl NotificationBackend for InMemoryBackend {
    async fn permission_status(&self) -> NotificationResult<Permission> {
        Ok(self.state.lock().permission)
    }

    async fn request_permission(&self) -> NotificationResult<Permission> {
        let mut state = self.state.lock();
        if !state.permission.is_granted() {
            state.permission = if state.grant_on_request {
                Permission::Granted
            } else {
                Permission::Denied
            };
        }
        Ok(state.permission)
    }

    async fn register_channel(&self, channel: &ChannelSpec) -> NotificationResult<()> {
        let mut state = self.state.lock();
        state.channels.retain(|c| c.id != channel.id);
        state.channels.push(channel.clone());
        Ok(())
    }

    async fn schedule(&self, request: NotificationRequest) -> NotificationResult<String> {
        let mut state = self.state.lock();
        let id = format!("notification-{}", state.next_id);
        state.next_id += 1;

        match request.trigger {
            Trigger::Immediate => state.delivered.push(request),
            Trigger::Daily { .. } => state.scheduled.push(ScheduledNotification {
                id: id.clone(),
                request,
            }),
        }
        Ok(id)
    }

    async fn cancel_all(&self) -> NotificationResult<()> {
        self.state.lock().scheduled.clear();
        Ok(())
    }

    async fn scheduled(&self) -> NotificationResult<Vec<ScheduledNotification>> {
        Ok(self.state.lock().scheduled.clone())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::message::{MessageComposer, NotificationKind};

    fn request(trigger: Trigger) -> NotificationRequest {
        NotificationRequest {
            content: MessageComposer::with_seed(1).compose(
                NotificationKind::Test,
                9,
                None,
                None,
                "clear",
            ),
            trigger,
            channel_id: Some(DAILY_CHANNEL_ID.to_string()),
        }
    }

    #[tokio::test]
    async fn test_permission_flow() {
        let granted_later = InMemoryBackend::with_permission(Permission::Undetermined, true);
        assert_eq!(granted_later.request_permission().await.unwrap(), Permission::Granted);

        let refused = InMemoryBackend::with_permission(Permission::Undetermined, false);
        assert_eq!(refused.request_permission().await.unwrap(), Permission::Denied);
        assert_eq!(refused.permission_status().await.unwrap(), Permission::Denied);
    }

    #[tokio::test]
    async fn test_immediate_is_delivered_not_scheduled() {
        let backend = InMemoryBackend::new();
        backend.schedule(request(Trigger::Immediate)).await.unwrap();
        backend
            .schedule(request(Trigger::Daily { hour: 8, minute: 0 }))
            .await
            .unwrap();

        assert_eq!(backend.delivered().len(), 1);
        assert_eq!(backend.scheduled().await.unwrap().len(), 1);

        backend.cancel_all().await.unwrap();
        assert!(backend.scheduled().await.unwrap().is_empty());
        assert_eq!(backend.delivered().len(), 1);
    }

    #[tokio::test]
    async fn test_channel_registration_is_idempotent() {
        let backend = InMemoryBackend::new();
        backend.register_channel(&ChannelSpec::daily_weather()).await.unwrap();
        backend.register_channel(&ChannelSpec::daily_weather()).await.unwrap();

        let channels = backend.channels();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].vibration_pattern, vec![0, 250, 250, 250]);
        assert_eq!(channels[0].importance, Importance::High);
    }

    #[test]
    fn test_trigger_wire_format() {
        let json = serde_json::to_value(Trigger::Daily { hour: 8, minute: 0 }).unwrap();
        assert_eq!(json, serde_json::json!({"type": "daily", "hour": 8, "minute": 0}));
    }
}
