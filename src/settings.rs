use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::reminders::NotificationPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserSettings {
    notification_policy: NotificationPolicy,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            notification_policy: NotificationPolicy::default(),
        }
    }
}

/// JSON-file-backed user settings. Unreadable or missing files fall back to
/// defaults; writes persist immediately.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn notification_policy(&self) -> NotificationPolicy {
        self.data.read().unwrap().notification_policy
    }

    pub fn update_notification_policy(&self, policy: NotificationPolicy) -> Result<()> {
        {
            let mut guard = self.data.write().unwrap();
            guard.notification_policy = policy;
            self.persist(&guard)?;
        }
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
