//! Medication schedule and adherence engine.
//!
//! Expands dosing frequencies into concrete reminder times, tracks dose
//! events against an append-only log, derives day-level adherence and
//! supply status, and keeps local reminder notifications synchronized with
//! medication edits. The UI layer consumes [`tracker::MedTracker`]; nothing
//! here renders.

pub mod adherence;
pub mod error;
pub mod models;
pub mod reminders;
pub mod schedule;
pub mod settings;
pub mod store;
pub mod supply;
pub mod tracker;

pub use adherence::{DayProgress, ScheduledDose};
pub use error::TrackerError;
pub use models::{DoseEvent, Medication, MedicationInput, TreatmentDuration};
pub use reminders::{
    FiredReminder, LocalNotificationGateway, NotificationGateway, NotificationPayload,
    NotificationPolicy, ReminderScheduler,
};
pub use schedule::{ClockTime, Frequency};
pub use settings::SettingsStore;
pub use store::{KvStore, MedicationStore};
pub use supply::{SupplySnapshot, SupplyTier};
pub use tracker::MedTracker;
