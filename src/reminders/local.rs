//! In-process notification backend.
//!
//! Each scheduled notification gets its own tokio task that sleeps until
//! the next occurrence of its clock-time, then fires on a daily interval,
//! pushing [`FiredReminder`]s onto a channel the embedding UI drains.
//! Cancellation aborts the task.

use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, RwLock,
};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use log::{debug, info, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::TrackerError;
use crate::schedule::ClockTime;

use super::controller::next_occurrence;
use super::gateway::{
    NotificationGateway, NotificationPayload, NotificationPolicy, PermissionStatus,
    ScheduledNotification,
};

const DAY_SECS: u64 = 24 * 60 * 60;

/// A notification that came due.
#[derive(Debug, Clone)]
pub struct FiredReminder {
    pub notification_id: String,
    pub payload: NotificationPayload,
    pub policy: NotificationPolicy,
    pub fired_at: DateTime<Local>,
}

struct ScheduledEntry {
    notification: ScheduledNotification,
    task: JoinHandle<()>,
}

pub struct LocalNotificationGateway {
    entries: Mutex<HashMap<String, ScheduledEntry>>,
    fired_tx: UnboundedSender<FiredReminder>,
    permission_granted: AtomicBool,
    policy: Arc<RwLock<NotificationPolicy>>,
}

impl LocalNotificationGateway {
    pub fn new() -> (Self, UnboundedReceiver<FiredReminder>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let gateway = Self {
            entries: Mutex::new(HashMap::new()),
            fired_tx,
            permission_granted: AtomicBool::new(true),
            policy: Arc::new(RwLock::new(NotificationPolicy::default())),
        };
        (gateway, fired_rx)
    }

    /// One-time registration of the presentation policy, called from the
    /// application entry point before anything is scheduled.
    pub fn configure(&self, policy: NotificationPolicy) {
        *self.policy.write().unwrap() = policy;
        info!("Notification policy configured: {policy:?}");
    }

    pub fn set_permission(&self, granted: bool) {
        self.permission_granted.store(granted, Ordering::SeqCst);
    }

    fn repeat_interval() -> Duration {
        // MEDTRACK_REMINDER_INTERVAL_SECS shortens the daily cycle for
        // manual testing.
        std::env::var("MEDTRACK_REMINDER_INTERVAL_SECS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DAY_SECS))
    }
}

#[async_trait]
impl NotificationGateway for LocalNotificationGateway {
    async fn request_permission(&self) -> Result<PermissionStatus, TrackerError> {
        if self.permission_granted.load(Ordering::SeqCst) {
            Ok(PermissionStatus::Granted)
        } else {
            Ok(PermissionStatus::Denied)
        }
    }

    async fn schedule_daily(
        &self,
        hour: u32,
        minute: u32,
        payload: NotificationPayload,
    ) -> Result<String, TrackerError> {
        if !self.permission_granted.load(Ordering::SeqCst) {
            return Err(TrackerError::NotificationPermissionDenied);
        }

        if hour > 23 || minute > 59 {
            return Err(TrackerError::Notification(format!(
                "{hour:02}:{minute:02} is not a wall-clock time"
            )));
        }
        let time = ClockTime::new(hour as u8, minute as u8);

        let id = Uuid::new_v4().to_string();
        let notification = ScheduledNotification {
            id: id.clone(),
            hour,
            minute,
            payload: payload.clone(),
        };

        let fired_tx = self.fired_tx.clone();
        let policy = self.policy.clone();
        let task_id = id.clone();
        let task = tokio::spawn(async move {
            let now = Local::now().naive_local();
            let first = next_occurrence(now, time);
            let initial_delay = (first - now)
                .to_std()
                .unwrap_or(Duration::from_secs(0));
            debug!(
                "reminder {task_id} first fires at {first} (in {}s)",
                initial_delay.as_secs()
            );
            tokio::time::sleep(initial_delay).await;

            loop {
                let fired = FiredReminder {
                    notification_id: task_id.clone(),
                    payload: payload.clone(),
                    policy: *policy.read().unwrap(),
                    fired_at: Local::now(),
                };
                if fired_tx.send(fired).is_err() {
                    debug!("reminder {task_id} consumer dropped, stopping loop");
                    break;
                }
                tokio::time::sleep(Self::repeat_interval()).await;
            }
        });

        let mut entries = self.entries.lock().unwrap();
        entries.insert(id.clone(), ScheduledEntry { notification, task });

        Ok(id)
    }

    async fn list_scheduled(&self) -> Result<Vec<ScheduledNotification>, TrackerError> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .values()
            .map(|entry| entry.notification.clone())
            .collect())
    }

    async fn cancel(&self, id: &str) -> Result<(), TrackerError> {
        let removed = {
            let mut entries = self.entries.lock().unwrap();
            entries.remove(id)
        };
        match removed {
            Some(entry) => {
                entry.task.abort();
                Ok(())
            }
            None => {
                warn!("cancel for unknown notification {id}");
                Ok(())
            }
        }
    }
}

impl Drop for LocalNotificationGateway {
    fn drop(&mut self) {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        for entry in entries.values() {
            entry.task.abort();
        }
        entries.clear();
    }
}
