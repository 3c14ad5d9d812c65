//! Desktop notification backend driven by tokio timers.
//!
//! Each daily trigger is a task that sleeps until the next local `hh:mm`,
//! emits the notification on a channel and goes back to sleep. There is no
//! OS permission prompt on this backend, so permission is always granted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Days, Local, TimeZone};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::backend::{
    ChannelSpec, NotificationBackend, NotificationRequest, NotificationResult, Permission,
    ScheduledNotification, Trigger,
};
use crate::message::NotificationContent;

/// A notification that fired.
#[derive(Debug, Clone)]
pub struct DeliveredNotification {
    pub id: String,
    pub content: NotificationContent,
    pub delivered_at: DateTime<Local>,
}

/// Next instant strictly after `now` whose wall-clock time is `hour:minute`.
///
/// Returns `None` for an invalid time. A time skipped by a DST jump moves to
/// the following day.
pub fn next_fire<Tz: TimeZone>(now: &DateTime<Tz>, hour: u32, minute: u32) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    let mut candidate = now.date_naive().and_hms_opt(hour, minute, 0)?;

    for _ in 0..3 {
        if let Some(at) = tz.from_local_datetime(&candidate).earliest() {
            if at > *now {
                return Some(at);
            }
        }
        candidate = candidate.checked_add_days(Days::new(1))?;
    }
    None
}

struct Job {
    request: NotificationRequest,
    token: CancellationToken,
}

pub struct LocalTimerBackend {
    tx: mpsc::UnboundedSender<DeliveredNotification>,
    jobs: Mutex<HashMap<String, Job>>,
    channels: Mutex<Vec<ChannelSpec>>,
    next_id: AtomicU64,
}

impl LocalTimerBackend {
    /// Backend plus the receiving end for fired notifications.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DeliveredNotification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let backend = Self {
            tx,
            jobs: Mutex::new(HashMap::new()),
            channels: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        };
        (backend, rx)
    }

    fn deliver(
        tx: &mpsc::UnboundedSender<DeliveredNotification>,
        id: &str,
        content: &NotificationContent,
    ) {
        let delivered = DeliveredNotification {
            id: id.to_string(),
            content: content.clone(),
            delivered_at: Local::now(),
        };
        if tx.send(delivered).is_err() {
            tracing::debug!("Notification {} dropped, no receiver", id);
        }
    }

    fn spawn_daily(&self, id: String, content: NotificationContent, hour: u32, minute: u32) -> CancellationToken {
        let token = CancellationToken::new();
        let task_token = token.clone();
        let tx = self.tx.clone();

        tokio::spawn(async move {
            loop {
                let now = Local::now();
                let Some(at) = next_fire(&now, hour, minute) else {
                    tracing::warn!("No next fire time for {:02}:{:02}", hour, minute);
                    break;
                };
                let wait = (at - now).to_std().unwrap_or_default();
                tracing::debug!("Notification {} fires at {}", id, at.format("%Y-%m-%d %H:%M"));

                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = tokio::time::sleep(wait) => {
                        Self::deliver(&tx, &id, &content);
                    }
                }
            }
        });

        token
    }
}

#[async_trait]
impl NotificationBackend for LocalTimerBackend {
    async fn permission_status(&self) -> NotificationResult<Permission> {
        Ok(Permission::Granted)
    }

    async fn request_permission(&self) -> NotificationResult<Permission> {
        Ok(Permission::Granted)
    }

    async fn register_channel(&self, channel: &ChannelSpec) -> NotificationResult<()> {
        let mut channels = self.channels.lock();
        channels.retain(|c| c.id != channel.id);
        channels.push(channel.clone());
        Ok(())
    }

    async fn schedule(&self, request: NotificationRequest) -> NotificationResult<String> {
        let id = format!("local-{}", self.next_id.fetch_add(1, Ordering::SeqCst));

        match request.trigger {
            Trigger::Immediate => {
                Self::deliver(&self.tx, &id, &request.content);
            }
            Trigger::Daily { hour, minute } => {
                let token = self.spawn_daily(id.clone(), request.content.clone(), hour, minute);
                self.jobs.lock().insert(id.clone(), Job { request, token });
            }
        }
        Ok(id)
    }

    async fn cancel_all(&self) -> NotificationResult<()> {
        let jobs: Vec<Job> = self.jobs.lock().drain().map(|(_, job)| job).collect();
        for job in &jobs {
            job.token.cancel();
        }
        if !jobs.is_empty() {
            tracing::debug!("Cancelled {} timer(s)", jobs.len());
        }
        Ok(())
    }

    async fn scheduled(&self) -> NotificationResult<Vec<ScheduledNotification>> {
        Ok(self
            .jobs
            .lock()
            .iter()
            .map(|(id, job)| ScheduledNotification {
                id: id.clone(),
                request: job.request.clone(),
            })
            .collect())
    }
}

impl Drop for LocalTimerBackend {
    fn drop(&mut self) {
        for job in self.jobs.get_mut().values() {
            job.token.cancel();
        }
    }
}
