//! Test double for the notification gateway.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::TrackerError;

use super::gateway::{
    NotificationGateway, NotificationPayload, PermissionStatus, ScheduledNotification,
};

pub struct MockGateway {
    permission: PermissionStatus,
    scheduled: Mutex<HashMap<String, ScheduledNotification>>,
    next_id: Mutex<u32>,
}

impl MockGateway {
    pub fn granted() -> Self {
        Self::with_permission(PermissionStatus::Granted)
    }

    pub fn denied() -> Self {
        Self::with_permission(PermissionStatus::Denied)
    }

    pub fn with_permission(permission: PermissionStatus) -> Self {
        Self {
            permission,
            scheduled: Mutex::new(HashMap::new()),
            next_id: Mutex::new(0),
        }
    }
}

#[async_trait]
impl NotificationGateway for MockGateway {
    async fn request_permission(&self) -> Result<PermissionStatus, TrackerError> {
        Ok(self.permission)
    }

    async fn schedule_daily(
        &self,
        hour: u32,
        minute: u32,
        payload: NotificationPayload,
    ) -> Result<String, TrackerError> {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let id = format!("notif-{}", *next_id);
        self.scheduled.lock().unwrap().insert(
            id.clone(),
            ScheduledNotification {
                id: id.clone(),
                hour,
                minute,
                payload,
            },
        );
        Ok(id)
    }

    async fn list_scheduled(&self) -> Result<Vec<ScheduledNotification>, TrackerError> {
        Ok(self.scheduled.lock().unwrap().values().cloned().collect())
    }

    async fn cancel(&self, id: &str) -> Result<(), TrackerError> {
        self.scheduled.lock().unwrap().remove(id);
        Ok(())
    }
}
