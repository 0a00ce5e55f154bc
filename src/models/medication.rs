use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TrackerError;
use crate::schedule::{ClockTime, Frequency};

/// Display palette the UI draws medication cards with. The assignment is
/// purely cosmetic and carries no domain meaning.
const COLOR_PALETTE: [&str; 25] = [
    "#1a8e2d", "#146922", "#4CAF50", "#8BC34A", "#C0CA33", // greens
    "#CDDC39", "#FFEB3B", "#FFC107", "#FF9800", "#FF5722", // yellows & oranges
    "#F44336", "#E91E63", "#9C27B0", "#673AB7", "#3F51B5", // reds & purples
    "#2196F3", "#03A9F4", "#00BCD4", "#009688", "#4E342E", // blues & teals
    "#607D8B", "#795548", "#9E9E9E", "#000000", "#FFFFFF", // grays, browns & black/white
];

/// How long the schedule stays active from its start date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TreatmentDuration {
    #[serde(rename = "7 days")]
    SevenDays,
    #[serde(rename = "14 days")]
    FourteenDays,
    #[serde(rename = "30 days")]
    ThirtyDays,
    #[serde(rename = "90 days")]
    NinetyDays,
    #[serde(rename = "Ongoing")]
    Ongoing,
}

impl TreatmentDuration {
    pub fn as_str(&self) -> &'static str {
        match self {
            TreatmentDuration::SevenDays => "7 days",
            TreatmentDuration::FourteenDays => "14 days",
            TreatmentDuration::ThirtyDays => "30 days",
            TreatmentDuration::NinetyDays => "90 days",
            TreatmentDuration::Ongoing => "Ongoing",
        }
    }

    /// `None` means the schedule never expires.
    pub fn days(&self) -> Option<i64> {
        match self {
            TreatmentDuration::SevenDays => Some(7),
            TreatmentDuration::FourteenDays => Some(14),
            TreatmentDuration::ThirtyDays => Some(30),
            TreatmentDuration::NinetyDays => Some(90),
            TreatmentDuration::Ongoing => None,
        }
    }
}

/// One prescribed treatment with its dosing schedule and supply tracking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: String,
    pub name: String,
    pub dosage: String,
    pub frequency: Frequency,
    pub duration: TreatmentDuration,
    pub color: String,
    pub start_date: DateTime<Utc>,
    pub times: Vec<ClockTime>,
    pub notes: String,
    pub reminder_enabled: bool,
    pub refill_reminder: bool,
    pub current_supply: u32,
    pub total_supply: u32,
    pub refill_at: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_refill_date: Option<DateTime<Utc>>,
}

/// Creation-time input. Ids, colors and supply bookkeeping are assigned by
/// [`MedicationInput::into_medication`], never by callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationInput {
    pub name: String,
    pub dosage: String,
    pub frequency: Frequency,
    pub duration: TreatmentDuration,
    pub start_date: DateTime<Utc>,
    /// When absent, the frequency's canonical times are used.
    pub times: Option<Vec<ClockTime>>,
    pub notes: String,
    pub reminder_enabled: bool,
    pub refill_reminder: bool,
    pub current_supply: Option<u32>,
    pub refill_at: Option<u32>,
}

impl MedicationInput {
    /// Rejects bad input before anything is written.
    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.name.trim().is_empty() {
            return Err(TrackerError::Validation("medication name is required".into()));
        }
        if self.dosage.trim().is_empty() {
            return Err(TrackerError::Validation("dosage is required".into()));
        }

        if self.refill_reminder {
            let current = self.current_supply.ok_or_else(|| {
                TrackerError::Validation(
                    "current supply is required for refill tracking".into(),
                )
            })?;
            let refill_at = self.refill_at.ok_or_else(|| {
                TrackerError::Validation("refill threshold is required".into())
            })?;
            if refill_at >= current {
                return Err(TrackerError::RefillValidation(format!(
                    "refill threshold {refill_at} must be below current supply {current}"
                )));
            }
        }

        Ok(())
    }

    pub fn into_medication(self) -> Medication {
        let times = match self.times {
            Some(times) => times,
            None => self.frequency.expand(),
        };
        let current_supply = self.current_supply.unwrap_or(0);

        Medication {
            id: Uuid::new_v4().to_string(),
            name: self.name,
            dosage: self.dosage,
            frequency: self.frequency,
            duration: self.duration,
            color: assign_color(&mut rand::thread_rng()),
            start_date: self.start_date,
            times,
            notes: self.notes,
            reminder_enabled: self.reminder_enabled,
            refill_reminder: self.refill_reminder,
            current_supply,
            // A fresh prescription starts full: total mirrors the entered supply.
            total_supply: current_supply,
            refill_at: self.refill_at.unwrap_or(0),
            last_refill_date: None,
        }
    }
}

/// Update-time invariants, enforced at the write boundary.
pub fn validate_update(medication: &Medication) -> Result<(), TrackerError> {
    if medication.name.trim().is_empty() {
        return Err(TrackerError::Validation("medication name is required".into()));
    }
    if medication.current_supply > medication.total_supply {
        return Err(TrackerError::Validation(format!(
            "current supply {} exceeds total supply {}",
            medication.current_supply, medication.total_supply
        )));
    }
    if medication.refill_at > 100 {
        return Err(TrackerError::RefillValidation(format!(
            "refill threshold {} is not a percentage",
            medication.refill_at
        )));
    }
    Ok(())
}

fn assign_color<R: Rng>(rng: &mut R) -> String {
    // Index stays within the palette; the draw is display-only.
    let index = rng.gen_range(0..COLOR_PALETTE.len());
    COLOR_PALETTE[index].to_string()
}
