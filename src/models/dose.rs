use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One recorded take/skip event for a medication.
///
/// Events are append-only: recording binds the event to the medication and
/// the moment of recording, not to a schedule slot. They are never mutated
/// or removed except by a global clear.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DoseEvent {
    pub id: String,
    pub medication_id: String,
    pub time_stamp: DateTime<Utc>,
    pub taken: bool,
}

impl DoseEvent {
    pub fn new(medication_id: &str, taken: bool, time_stamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            medication_id: medication_id.to_string(),
            time_stamp,
            taken,
        }
    }
}
