//! Schedule expansion: turns a dosing frequency into concrete clock-times.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TrackerError;

/// A wall-clock reminder time, serialized as `"HH:MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    pub const fn new(hour: u8, minute: u8) -> Self {
        assert!(hour < 24 && minute < 60);
        Self { hour, minute }
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn parse(value: &str) -> Result<Self, TrackerError> {
        let invalid = || TrackerError::InvalidTime(value.to_string());

        let (hour_str, minute_str) = value.split_once(':').ok_or_else(invalid)?;
        let hour: u8 = hour_str.parse().map_err(|_| invalid())?;
        let minute: u8 = minute_str.parse().map_err(|_| invalid())?;

        if hour > 23 || minute > 59 {
            return Err(invalid());
        }

        Ok(Self { hour, minute })
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for ClockTime {
    type Err = TrackerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(de::Error::custom)
    }
}

/// Dosing cadence. The wire form matches the labels the UI stores.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Frequency {
    #[serde(rename = "Once daily")]
    OnceDaily,
    #[serde(rename = "Twice daily")]
    TwiceDaily,
    #[serde(rename = "Three times daily")]
    ThreeTimesDaily,
    #[serde(rename = "Four times daily")]
    FourTimesDaily,
    #[serde(rename = "As needed")]
    AsNeeded,
}

const ONCE_DAILY: &[ClockTime] = &[ClockTime::new(9, 0)];
const TWICE_DAILY: &[ClockTime] = &[ClockTime::new(9, 0), ClockTime::new(21, 0)];
const THREE_TIMES_DAILY: &[ClockTime] = &[
    ClockTime::new(9, 0),
    ClockTime::new(15, 0),
    ClockTime::new(21, 0),
];
const FOUR_TIMES_DAILY: &[ClockTime] = &[
    ClockTime::new(9, 0),
    ClockTime::new(13, 0),
    ClockTime::new(17, 0),
    ClockTime::new(21, 0),
];

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::OnceDaily => "Once daily",
            Frequency::TwiceDaily => "Twice daily",
            Frequency::ThreeTimesDaily => "Three times daily",
            Frequency::FourTimesDaily => "Four times daily",
            Frequency::AsNeeded => "As needed",
        }
    }

    pub fn from_label(label: &str) -> Result<Self, TrackerError> {
        match label {
            "Once daily" => Ok(Frequency::OnceDaily),
            "Twice daily" => Ok(Frequency::TwiceDaily),
            "Three times daily" => Ok(Frequency::ThreeTimesDaily),
            "Four times daily" => Ok(Frequency::FourTimesDaily),
            "As needed" => Ok(Frequency::AsNeeded),
            other => Err(TrackerError::InvalidFrequency(other.to_string())),
        }
    }

    /// Canonical reminder times for this cadence, in slot order.
    /// `AsNeeded` carries no timed reminders.
    pub fn expand(&self) -> Vec<ClockTime> {
        let slots: &[ClockTime] = match self {
            Frequency::OnceDaily => ONCE_DAILY,
            Frequency::TwiceDaily => TWICE_DAILY,
            Frequency::ThreeTimesDaily => THREE_TIMES_DAILY,
            Frequency::FourTimesDaily => FOUR_TIMES_DAILY,
            Frequency::AsNeeded => &[],
        };
        slots.to_vec()
    }
}

impl FromStr for Frequency {
    type Err = TrackerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_label(value)
    }
}

/// Replaces one slot's time in place, keeping slot count and order.
/// Retargeting a single slot must never regenerate the whole schedule.
pub fn set_time_slot(
    times: &mut [ClockTime],
    index: usize,
    value: ClockTime,
) -> Result<(), TrackerError> {
    let len = times.len();
    let slot = times.get_mut(index).ok_or_else(|| {
        TrackerError::Validation(format!(
            "time slot index {index} out of range for {len} slots",
        ))
    })?;
    *slot = value;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twice_daily_expands_to_morning_and_evening() {
        let times = Frequency::TwiceDaily.expand();
        assert_eq!(times, vec![ClockTime::new(9, 0), ClockTime::new(21, 0)]);
    }

    #[test]
    fn once_daily_expands_to_single_slot() {
        assert_eq!(Frequency::OnceDaily.expand(), vec![ClockTime::new(9, 0)]);
    }

    #[test]
    fn four_times_daily_keeps_slot_order() {
        let times = Frequency::FourTimesDaily.expand();
        let rendered: Vec<String> = times.iter().map(|t| t.to_string()).collect();
        assert_eq!(rendered, vec!["09:00", "13:00", "17:00", "21:00"]);
    }

    #[test]
    fn as_needed_has_no_timed_reminders() {
        assert!(Frequency::AsNeeded.expand().is_empty());
    }

    #[test]
    fn unknown_label_is_rejected() {
        let err = Frequency::from_label("Every full moon").unwrap_err();
        assert!(matches!(err, TrackerError::InvalidFrequency(_)));
    }

    #[test]
    fn clock_time_round_trips_through_strings() {
        let time = ClockTime::parse("07:05").unwrap();
        assert_eq!(time, ClockTime::new(7, 5));
        assert_eq!(time.to_string(), "07:05");
    }

    #[test]
    fn clock_time_rejects_out_of_range_values() {
        for raw in ["24:00", "12:60", "nine", "12", "12:3a"] {
            assert!(
                matches!(ClockTime::parse(raw), Err(TrackerError::InvalidTime(_))),
                "expected {raw} to be rejected"
            );
        }
    }

    #[test]
    fn set_time_slot_replaces_only_that_index() {
        let mut times = Frequency::ThreeTimesDaily.expand();
        set_time_slot(&mut times, 1, ClockTime::new(14, 30)).unwrap();
        assert_eq!(
            times,
            vec![
                ClockTime::new(9, 0),
                ClockTime::new(14, 30),
                ClockTime::new(21, 0)
            ]
        );
    }

    #[test]
    fn set_time_slot_rejects_out_of_range_index() {
        let mut times = Frequency::OnceDaily.expand();
        let err = set_time_slot(&mut times, 3, ClockTime::new(8, 0)).unwrap_err();
        assert!(matches!(err, TrackerError::Validation(_)));
    }
}
