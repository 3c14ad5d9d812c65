//! Daily weather reminders.
//!
//! [`NotificationScheduler`] owns the single recurring reminder and talks to
//! the platform through [`NotificationBackend`]. [`LocalTimerBackend`] runs
//! reminders as tokio timers on desktop; [`InMemoryBackend`] only records.

pub mod backend;
pub mod message;
pub mod scheduler;
pub mod timer;

pub use backend::{
    ChannelSpec, Importance, InMemoryBackend, NotificationBackend, NotificationRequest,
    NotificationResult, Permission, ScheduledNotification, Trigger, DAILY_CHANNEL_ID,
};
pub use message::{MessageComposer, NotificationContent, NotificationData, NotificationKind};
pub use scheduler::{NotificationScheduler, SchedulerState};
pub use timer::{next_fire, DeliveredNotification, LocalTimerBackend};
