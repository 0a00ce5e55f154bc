//! Seam to the platform notification resource.
//!
//! The engine only ever talks to this trait; platform backends and test
//! doubles implement it. Scheduling is best-effort: a failing gateway must
//! never block a domain write.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Payload attached to every scheduled notification. `medication_id` is the
/// cancellation handle: cancel scans match on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub medication_id: String,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledNotification {
    pub id: String,
    pub hour: u32,
    pub minute: u32,
    pub payload: NotificationPayload,
}

/// Process-wide presentation policy, registered once at bootstrap rather
/// than mutated ambiently afterwards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPolicy {
    pub show_alert: bool,
    pub play_sound: bool,
    pub set_badge: bool,
}

impl Default for NotificationPolicy {
    fn default() -> Self {
        Self {
            show_alert: true,
            play_sound: true,
            set_badge: true,
        }
    }
}

#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn request_permission(&self) -> Result<PermissionStatus, TrackerError>;

    /// Registers a repeating daily notification and returns its identifier.
    async fn schedule_daily(
        &self,
        hour: u32,
        minute: u32,
        payload: NotificationPayload,
    ) -> Result<String, TrackerError>;

    async fn list_scheduled(&self) -> Result<Vec<ScheduledNotification>, TrackerError>;

    /// Cancelling an unknown id is not an error.
    async fn cancel(&self, id: &str) -> Result<(), TrackerError>;
}
