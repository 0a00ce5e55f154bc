//! Day-level adherence: which scheduled doses are taken or outstanding on a
//! given date, and how far through the day's schedule the user is.
//!
//! Matching is at medication+day granularity. A dose event marks the whole
//! day for its medication; events do not bind to a schedule slot.

use chrono::{DateTime, Days, Local, NaiveDate, Utc};

use crate::models::{DoseEvent, Medication};
use crate::schedule::ClockTime;

/// One row of the day's schedule, ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledDose {
    pub medication: Medication,
    pub time: ClockTime,
    pub taken: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayProgress {
    pub completed: u32,
    pub total: u32,
    pub percent: u8,
}

fn local_day(instant: &DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&Local).date_naive()
}

/// Whether the medication's schedule covers `date`.
///
/// A duration of N days covers [start, start + N); Ongoing never expires.
pub fn medication_active_on(medication: &Medication, date: NaiveDate) -> bool {
    let start_day = local_day(&medication.start_date);
    if date < start_day {
        return false;
    }

    match medication.duration.days() {
        None => true,
        Some(days) => match start_day.checked_add_days(Days::new(days as u64)) {
            Some(end) => date < end,
            None => true,
        },
    }
}

/// True when any event for `medication_id` recorded on `date` has taken=true.
/// Multiple events per day are expected; any qualifying one counts.
pub fn taken_on(history: &[DoseEvent], medication_id: &str, date: NaiveDate) -> bool {
    history.iter().any(|event| {
        event.medication_id == medication_id && event.taken && local_day(&event.time_stamp) == date
    })
}

/// Expands every medication active on `date` into one row per time slot,
/// each flagged with the day-level taken status.
pub fn doses_for_date(
    medications: &[Medication],
    history: &[DoseEvent],
    date: NaiveDate,
) -> Vec<ScheduledDose> {
    let mut rows = Vec::new();

    for medication in medications {
        if !medication_active_on(medication, date) {
            continue;
        }
        let taken = taken_on(history, &medication.id, date);
        for time in &medication.times {
            rows.push(ScheduledDose {
                medication: medication.clone(),
                time: *time,
                taken,
            });
        }
    }

    rows
}

/// Aggregates the day's rows into completed/total/percent.
/// A day with no scheduled doses reports zero percent rather than dividing.
pub fn progress_for_date(
    medications: &[Medication],
    history: &[DoseEvent],
    date: NaiveDate,
) -> DayProgress {
    let rows = doses_for_date(medications, history, date);
    let total = rows.len() as u32;
    if total == 0 {
        return DayProgress {
            completed: 0,
            total: 0,
            percent: 0,
        };
    }

    let completed = rows.iter().filter(|row| row.taken).count() as u32;
    let percent = ((f64::from(completed) / f64::from(total)) * 100.0).round() as u8;

    DayProgress {
        completed,
        total,
        percent,
    }
}

/// Calendar decoration: did anything get recorded on `date`, taken or not.
pub fn has_any_dose_on_day(history: &[DoseEvent], date: NaiveDate) -> bool {
    history.iter().any(|event| local_day(&event.time_stamp) == date)
}
