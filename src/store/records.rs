//! Durable medication list and dose-event log.
//!
//! Both collections persist as JSON arrays under fixed keys. Reads degrade
//! to an empty collection on storage failure; writes surface
//! `StorageWrite`. Every mutation is a whole read-modify-write executed as
//! one closure on the store worker, so overlapping calls cannot drop each
//! other's updates.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use log::error;
use rusqlite::Connection;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::TrackerError;
use crate::models::{DoseEvent, Medication};

use super::{read_value, write_value, KvStore};

pub const MEDICATIONS_KEY: &str = "medications";
pub const DOSE_HISTORY_KEY: &str = "dose_history";
pub const RECORD_KEYS: &[&str] = &[MEDICATIONS_KEY, DOSE_HISTORY_KEY];

fn load_list<T: DeserializeOwned>(conn: &Connection, key: &str) -> Result<Vec<T>> {
    match read_value(conn, key)? {
        Some(raw) => serde_json::from_str(&raw)
            .with_context(|| format!("failed to decode list under key {key}")),
        None => Ok(Vec::new()),
    }
}

fn store_list<T: Serialize>(conn: &Connection, key: &str, items: &[T]) -> Result<()> {
    let raw = serde_json::to_string(items)
        .with_context(|| format!("failed to encode list under key {key}"))?;
    write_value(conn, key, &raw)
}

#[derive(Clone)]
pub struct MedicationStore {
    kv: KvStore,
}

impl MedicationStore {
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    pub fn kv(&self) -> &KvStore {
        &self.kv
    }

    pub async fn try_get_medications(&self) -> Result<Vec<Medication>, TrackerError> {
        self.kv
            .execute(|conn| load_list(conn, MEDICATIONS_KEY))
            .await
            .map_err(|err| TrackerError::StorageRead(format!("{err:#}")))
    }

    /// Degrading read: storage failures log and come back empty so the UI
    /// always has something to render.
    pub async fn get_medications(&self) -> Vec<Medication> {
        match self.try_get_medications().await {
            Ok(medications) => medications,
            Err(err) => {
                error!("Error getting medications: {err}");
                Vec::new()
            }
        }
    }

    pub async fn get_medication(&self, id: &str) -> Result<Medication, TrackerError> {
        self.get_medications()
            .await
            .into_iter()
            .find(|med| med.id == id)
            .ok_or_else(|| TrackerError::MedicationNotFound(id.to_string()))
    }

    pub async fn add_medication(&self, medication: &Medication) -> Result<(), TrackerError> {
        let record = medication.clone();
        self.kv
            .execute(move |conn| {
                let mut medications: Vec<Medication> = load_list(conn, MEDICATIONS_KEY)?;
                medications.push(record);
                store_list(conn, MEDICATIONS_KEY, &medications)
            })
            .await
            .map_err(|err| TrackerError::StorageWrite(format!("{err:#}")))
    }

    /// Replaces the stored record with the same id.
    pub async fn update_medication(
        &self,
        medication: &Medication,
    ) -> Result<Medication, TrackerError> {
        let record = medication.clone();
        let replaced = self
            .kv
            .execute(move |conn| {
                let mut medications: Vec<Medication> = load_list(conn, MEDICATIONS_KEY)?;
                let slot = medications.iter_mut().find(|med| med.id == record.id);
                match slot {
                    Some(existing) => {
                        *existing = record.clone();
                        store_list(conn, MEDICATIONS_KEY, &medications)?;
                        Ok(Some(record))
                    }
                    None => Ok(None),
                }
            })
            .await
            .map_err(|err| TrackerError::StorageWrite(format!("{err:#}")))?;

        replaced.ok_or_else(|| TrackerError::MedicationNotFound(medication.id.clone()))
    }

    pub async fn try_get_dose_history(&self) -> Result<Vec<DoseEvent>, TrackerError> {
        self.kv
            .execute(|conn| load_list(conn, DOSE_HISTORY_KEY))
            .await
            .map_err(|err| TrackerError::StorageRead(format!("{err:#}")))
    }

    pub async fn get_dose_history(&self) -> Vec<DoseEvent> {
        match self.try_get_dose_history().await {
            Ok(history) => history,
            Err(err) => {
                error!("Error getting dose history: {err}");
                Vec::new()
            }
        }
    }

    /// Raw events recorded on the local calendar day of `now`.
    pub async fn get_todays_doses(&self) -> Vec<DoseEvent> {
        let today = Local::now().date_naive();
        self.get_dose_history()
            .await
            .into_iter()
            .filter(|event| event.time_stamp.with_timezone(&Local).date_naive() == today)
            .collect()
    }

    /// Appends one event. Prior entries are never touched: recording the
    /// same medication twice in a day leaves two entries in the log.
    pub async fn record_dose(
        &self,
        medication_id: &str,
        taken: bool,
        time_stamp: DateTime<Utc>,
    ) -> Result<DoseEvent, TrackerError> {
        let event = DoseEvent::new(medication_id, taken, time_stamp);
        let record = event.clone();
        self.kv
            .execute(move |conn| {
                let mut history: Vec<DoseEvent> = load_list(conn, DOSE_HISTORY_KEY)?;
                history.push(record);
                store_list(conn, DOSE_HISTORY_KEY, &history)
            })
            .await
            .map_err(|err| TrackerError::StorageWrite(format!("{err:#}")))?;
        Ok(event)
    }

    pub async fn clear_all_data(&self) -> Result<(), TrackerError> {
        self.kv
            .remove_all(RECORD_KEYS)
            .await
            .map_err(|err| TrackerError::StorageWrite(format!("{err:#}")))
    }
}
