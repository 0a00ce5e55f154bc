pub mod controller;
pub mod gateway;
pub mod local;
#[cfg(test)]
pub(crate) mod testing;

pub use controller::{next_occurrence, ReminderScheduler};
pub use gateway::{
    NotificationGateway, NotificationPayload, NotificationPolicy, PermissionStatus,
    ScheduledNotification,
};
pub use local::{FiredReminder, LocalNotificationGateway};
