pub mod dose;
pub mod medication;

pub use dose::DoseEvent;
pub use medication::{Medication, MedicationInput, TreatmentDuration};
