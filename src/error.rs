//! Engine-level error taxonomy.
//!
//! Storage reads never surface these to callers (they degrade to empty
//! collections); everything else propagates so the embedding UI decides
//! what to show.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("storage read failed: {0}")]
    StorageRead(String),

    #[error("storage write failed: {0}")]
    StorageWrite(String),

    #[error("unknown frequency: {0}")]
    InvalidFrequency(String),

    #[error("invalid reminder time: {0}")]
    InvalidTime(String),

    #[error("supply percentage undefined: total supply is zero")]
    DivisionUndefined,

    #[error("notification permission denied")]
    NotificationPermissionDenied,

    #[error("notification scheduling failed: {0}")]
    Notification(String),

    #[error("invalid refill threshold: {0}")]
    RefillValidation(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("medication not found: {0}")]
    MedicationNotFound(String),
}
