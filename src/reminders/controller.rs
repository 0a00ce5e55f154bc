//! Keeps scheduled notifications consistent with stored medication state.
//!
//! The only supported way to change an active reminder set is
//! cancel-then-reschedule: incremental edits would let live notifications
//! drift from the stored record.

use std::sync::Arc;

use chrono::{Days, NaiveDateTime, Timelike};
use log::{debug, info};

use crate::error::TrackerError;
use crate::models::Medication;
use crate::schedule::ClockTime;

use super::gateway::{NotificationGateway, NotificationPayload, PermissionStatus};

/// Next time `time` comes around on the wall clock: today if still ahead,
/// otherwise tomorrow.
pub fn next_occurrence(now: NaiveDateTime, time: ClockTime) -> NaiveDateTime {
    let clock = chrono::NaiveTime::from_hms_opt(u32::from(time.hour()), u32::from(time.minute()), 0)
        .expect("ClockTime holds a valid wall-clock time");
    let today = now.date().and_time(clock);
    if today > now {
        today
    } else {
        now.date()
            .checked_add_days(Days::new(1))
            .map(|tomorrow| tomorrow.and_time(clock))
            .unwrap_or(today)
    }
}

#[derive(Clone)]
pub struct ReminderScheduler {
    gateway: Arc<dyn NotificationGateway>,
}

impl ReminderScheduler {
    pub fn new(gateway: Arc<dyn NotificationGateway>) -> Self {
        Self { gateway }
    }

    /// Registers one repeating daily notification per time slot and returns
    /// their identifiers. Nothing is scheduled when reminders are disabled
    /// or the medication carries no timed slots.
    pub async fn schedule(&self, medication: &Medication) -> Result<Vec<String>, TrackerError> {
        if !medication.reminder_enabled || medication.times.is_empty() {
            return Ok(Vec::new());
        }

        if self.gateway.request_permission().await? == PermissionStatus::Denied {
            return Err(TrackerError::NotificationPermissionDenied);
        }

        let now = chrono::Local::now().naive_local();
        let mut ids = Vec::with_capacity(medication.times.len());
        for time in &medication.times {
            let next = next_occurrence(now, *time);
            debug!(
                "scheduling {} reminder for {} at {next}",
                medication.name, time
            );
            let payload = NotificationPayload {
                medication_id: medication.id.clone(),
                title: "Medication Reminder".into(),
                body: format!("Take your {}, {} now!", medication.name, medication.dosage),
            };
            let id = self
                .gateway
                .schedule_daily(next.hour(), next.minute(), payload)
                .await?;
            ids.push(id);
        }

        info!(
            "Scheduled {} reminder(s) for medication {}",
            ids.len(),
            medication.id
        );
        Ok(ids)
    }

    /// Cancels every scheduled notification tagged with `medication_id`.
    /// Safe to call when nothing is scheduled.
    pub async fn cancel(&self, medication_id: &str) -> Result<(), TrackerError> {
        let scheduled = self.gateway.list_scheduled().await?;
        for notification in scheduled {
            if notification.payload.medication_id == medication_id {
                self.gateway.cancel(&notification.id).await?;
            }
        }
        Ok(())
    }

    /// Cancel-then-schedule, the sole supported update path.
    pub async fn resync(&self, medication: &Medication) -> Result<Vec<String>, TrackerError> {
        self.cancel(&medication.id).await?;
        self.schedule(medication).await
    }
}
