//! Supply tiers and refill percentage, derived from consumption.

use log::warn;
use serde::Serialize;

use crate::error::TrackerError;
use crate::models::Medication;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SupplyTier {
    Low,
    Medium,
    Good,
}

impl SupplyTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupplyTier::Low => "Low",
            SupplyTier::Medium => "Medium",
            SupplyTier::Good => "Good",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SupplySnapshot {
    pub tier: SupplyTier,
    pub percent: f64,
}

/// Remaining supply as a percentage of the total.
pub fn supply_percent(medication: &Medication) -> Result<f64, TrackerError> {
    if medication.total_supply == 0 {
        return Err(TrackerError::DivisionUndefined);
    }
    Ok(f64::from(medication.current_supply) / f64::from(medication.total_supply) * 100.0)
}

/// Derives the view-ready supply tier.
///
/// Threshold precedence, first match wins: percent at or below the refill
/// threshold is Low even when it would also qualify as Medium — a threshold
/// above 50 absorbs the Medium band. An undefined percentage (total supply
/// of zero) is reported and treated as 0%.
pub fn supply_status(medication: &Medication) -> SupplySnapshot {
    let percent = match supply_percent(medication) {
        Ok(percent) => percent,
        Err(err) => {
            warn!("supply status for {}: {err}", medication.id);
            0.0
        }
    };

    let tier = if percent <= f64::from(medication.refill_at) {
        SupplyTier::Low
    } else if percent <= 50.0 {
        SupplyTier::Medium
    } else {
        SupplyTier::Good
    };

    SupplySnapshot { tier, percent }
}
