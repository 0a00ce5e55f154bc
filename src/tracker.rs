//! The engine facade the UI layer calls.
//!
//! Every operation is async; within one logical action the store write must
//! complete and succeed before the reminder scheduler runs, and a scheduler
//! failure never rolls the write back — reminders are only ever set for
//! persisted state, and notification trouble is a warning, not an error.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use log::{info, warn};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::adherence::{self, DayProgress, ScheduledDose};
use crate::error::TrackerError;
use crate::models::{medication::validate_update, DoseEvent, Medication, MedicationInput};
use crate::reminders::{
    FiredReminder, LocalNotificationGateway, NotificationPolicy, ReminderScheduler,
};
use crate::schedule::{self, ClockTime};
use crate::settings::SettingsStore;
use crate::store::{KvStore, MedicationStore};
use crate::supply::{self, SupplySnapshot};

pub struct MedTracker {
    store: MedicationStore,
    scheduler: ReminderScheduler,
    settings: SettingsStore,
}

impl MedTracker {
    pub fn new(store: MedicationStore, scheduler: ReminderScheduler, settings: SettingsStore) -> Self {
        Self {
            store,
            scheduler,
            settings,
        }
    }

    /// Opens the store and settings under `data_dir`, registers the
    /// notification policy once, and resynchronizes reminders for every
    /// persisted medication. The returned receiver yields reminders as they
    /// come due.
    pub async fn bootstrap(
        data_dir: &Path,
    ) -> Result<(Self, UnboundedReceiver<FiredReminder>)> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let kv = KvStore::open(data_dir.join("medtrack.sqlite3"))?;
        let settings = SettingsStore::new(data_dir.join("settings.json"))?;

        let (gateway, fired_rx) = LocalNotificationGateway::new();
        gateway.configure(settings.notification_policy());

        let tracker = Self::new(
            MedicationStore::new(kv),
            ReminderScheduler::new(Arc::new(gateway)),
            settings,
        );

        tracker.resync_all_reminders().await;
        info!("Medication tracker ready");

        Ok((tracker, fired_rx))
    }

    /// Brings live notifications back in line with stored state, e.g. after
    /// a restart. Failures are reported per medication and skipped.
    pub async fn resync_all_reminders(&self) {
        for medication in self.store.get_medications().await {
            if !medication.reminder_enabled {
                continue;
            }
            if let Err(err) = self.scheduler.resync(&medication).await {
                warn!(
                    "Reminder resync for {} failed on startup: {err}",
                    medication.id
                );
            }
        }
    }

    pub async fn get_medications(&self) -> Vec<Medication> {
        self.store.get_medications().await
    }

    pub async fn get_medication(&self, id: &str) -> Result<Medication, TrackerError> {
        self.store.get_medication(id).await
    }

    /// Validates, persists, then schedules reminders. The write must succeed
    /// before anything is scheduled; a scheduling failure leaves the saved
    /// record in place.
    pub async fn add_medication(
        &self,
        input: MedicationInput,
    ) -> Result<Medication, TrackerError> {
        input.validate()?;
        let medication = input.into_medication();

        self.store.add_medication(&medication).await?;

        if medication.reminder_enabled {
            if let Err(err) = self.scheduler.schedule(&medication).await {
                warn!(
                    "Reminder scheduling for {} failed (medication saved): {err}",
                    medication.id
                );
            }
        }

        Ok(medication)
    }

    /// Persists the edit, then cancel-and-reschedules its reminders.
    pub async fn update_medication(
        &self,
        medication: Medication,
    ) -> Result<Medication, TrackerError> {
        validate_update(&medication)?;
        let updated = self.store.update_medication(&medication).await?;

        if let Err(err) = self.scheduler.resync(&updated).await {
            warn!(
                "Reminder resync for {} failed (edit saved): {err}",
                updated.id
            );
        }

        Ok(updated)
    }

    /// Retargets one reminder slot, leaving the rest of the schedule alone,
    /// then persists and resyncs like any other edit.
    pub async fn update_time_slot(
        &self,
        medication_id: &str,
        slot: usize,
        time: ClockTime,
    ) -> Result<Medication, TrackerError> {
        let mut medication = self.store.get_medication(medication_id).await?;
        schedule::set_time_slot(&mut medication.times, slot, time)?;
        self.update_medication(medication).await
    }

    pub async fn record_dose(
        &self,
        medication_id: &str,
        taken: bool,
        time_stamp: DateTime<Utc>,
    ) -> Result<DoseEvent, TrackerError> {
        self.store.record_dose(medication_id, taken, time_stamp).await
    }

    pub async fn get_dose_history(&self) -> Vec<DoseEvent> {
        self.store.get_dose_history().await
    }

    pub async fn get_todays_doses(&self) -> Vec<DoseEvent> {
        self.store.get_todays_doses().await
    }

    /// Schedule rows for `date`, one per time slot of each active medication.
    pub async fn doses_for_date(&self, date: NaiveDate) -> Vec<ScheduledDose> {
        let medications = self.store.get_medications().await;
        let history = self.store.get_dose_history().await;
        adherence::doses_for_date(&medications, &history, date)
    }

    pub async fn todays_schedule(&self) -> Vec<ScheduledDose> {
        self.doses_for_date(Local::now().date_naive()).await
    }

    pub async fn progress_for_date(&self, date: NaiveDate) -> DayProgress {
        let medications = self.store.get_medications().await;
        let history = self.store.get_dose_history().await;
        adherence::progress_for_date(&medications, &history, date)
    }

    pub async fn has_any_dose_on_day(&self, date: NaiveDate) -> bool {
        let history = self.store.get_dose_history().await;
        adherence::has_any_dose_on_day(&history, date)
    }

    pub async fn supply_status(&self, medication_id: &str) -> Result<SupplySnapshot, TrackerError> {
        let medication = self.store.get_medication(medication_id).await?;
        Ok(supply::supply_status(&medication))
    }

    /// Tops the supply back up and stamps the refill date. Already-full
    /// medications are left untouched.
    pub async fn record_refill(&self, medication_id: &str) -> Result<Medication, TrackerError> {
        let mut medication = self.store.get_medication(medication_id).await?;

        if medication.current_supply >= medication.total_supply {
            return Ok(medication);
        }

        medication.current_supply = medication.total_supply;
        medication.last_refill_date = Some(Utc::now());

        let updated = self.store.update_medication(&medication).await?;

        if let Err(err) = self.scheduler.resync(&updated).await {
            warn!(
                "Reminder resync for {} failed (refill saved): {err}",
                updated.id
            );
        }

        Ok(updated)
    }

    pub async fn clear_all_data(&self) -> Result<(), TrackerError> {
        self.store.clear_all_data().await
    }

    pub fn notification_policy(&self) -> NotificationPolicy {
        self.settings.notification_policy()
    }

    /// Persists a new policy; it takes effect at the next bootstrap, where
    /// the gateway is configured exactly once.
    pub fn set_notification_policy(&self, policy: NotificationPolicy) -> Result<(), TrackerError> {
        self.settings
            .update_notification_policy(policy)
            .map_err(|err| TrackerError::StorageWrite(format!("{err:#}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TreatmentDuration;
    use crate::reminders::testing::MockGateway;
    use crate::reminders::NotificationGateway;
    use crate::schedule::Frequency;

    struct Fixture {
        _dir: tempfile::TempDir,
        tracker: MedTracker,
        gateway: Arc<MockGateway>,
    }

    fn fixture_with(gateway: MockGateway) -> Fixture {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempfile::tempdir().unwrap();
        let kv = KvStore::open(dir.path().join("medtrack.sqlite3")).unwrap();
        let settings = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        let gateway = Arc::new(gateway);
        let tracker = MedTracker::new(
            MedicationStore::new(kv),
            ReminderScheduler::new(gateway.clone()),
            settings,
        );
        Fixture {
            _dir: dir,
            tracker,
            gateway,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(MockGateway::granted())
    }

    fn sample_input() -> MedicationInput {
        MedicationInput {
            name: "Amoxicillin".into(),
            dosage: "500mg".into(),
            frequency: Frequency::TwiceDaily,
            duration: TreatmentDuration::SevenDays,
            start_date: Utc::now(),
            times: None,
            notes: String::new(),
            reminder_enabled: true,
            refill_reminder: false,
            current_supply: None,
            refill_at: None,
        }
    }

    #[tokio::test]
    async fn add_round_trips_with_assigned_id_and_schedules() {
        let fx = fixture();
        let added = fx.tracker.add_medication(sample_input()).await.unwrap();

        assert!(!added.id.is_empty());
        assert_eq!(fx.tracker.get_medications().await, vec![added.clone()]);

        let scheduled = fx.gateway.list_scheduled().await.unwrap();
        assert_eq!(scheduled.len(), 2);
        assert!(scheduled.iter().all(|n| n.payload.medication_id == added.id));
    }

    #[tokio::test]
    async fn bad_refill_threshold_is_rejected_before_any_write() {
        let fx = fixture();
        let mut input = sample_input();
        input.refill_reminder = true;
        input.current_supply = Some(10);
        input.refill_at = Some(10);

        assert!(matches!(
            fx.tracker.add_medication(input).await,
            Err(TrackerError::RefillValidation(_))
        ));
        assert!(fx.tracker.get_medications().await.is_empty());
        assert!(fx.gateway.list_scheduled().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn denied_notifications_never_block_the_write() {
        let fx = fixture_with(MockGateway::denied());
        let added = fx.tracker.add_medication(sample_input()).await.unwrap();

        assert_eq!(fx.tracker.get_medications().await, vec![added]);
        assert!(fx.gateway.list_scheduled().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn recorded_dose_shows_up_in_todays_doses() {
        let fx = fixture();
        let added = fx.tracker.add_medication(sample_input()).await.unwrap();

        fx.tracker
            .record_dose(&added.id, true, Utc::now())
            .await
            .unwrap();

        let today = fx.tracker.get_todays_doses().await;
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].medication_id, added.id);
        assert!(today[0].taken);
    }

    #[tokio::test]
    async fn todays_schedule_reflects_taken_state() {
        let fx = fixture();
        let added = fx.tracker.add_medication(sample_input()).await.unwrap();

        let before = fx.tracker.todays_schedule().await;
        assert_eq!(before.len(), 2);
        assert!(before.iter().all(|row| !row.taken));

        fx.tracker
            .record_dose(&added.id, true, Utc::now())
            .await
            .unwrap();

        let after = fx.tracker.todays_schedule().await;
        assert!(after.iter().all(|row| row.taken));

        let progress = fx
            .tracker
            .progress_for_date(Local::now().date_naive())
            .await;
        assert_eq!(progress.completed, 2);
        assert_eq!(progress.total, 2);
        assert_eq!(progress.percent, 100);
    }

    #[tokio::test]
    async fn update_resyncs_the_reminder_set() {
        let fx = fixture();
        let mut added = fx.tracker.add_medication(sample_input()).await.unwrap();
        assert_eq!(fx.gateway.list_scheduled().await.unwrap().len(), 2);

        added.frequency = Frequency::OnceDaily;
        added.times = added.frequency.expand();
        fx.tracker.update_medication(added).await.unwrap();

        assert_eq!(fx.gateway.list_scheduled().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn editing_one_time_slot_keeps_the_others() {
        let fx = fixture();
        let added = fx.tracker.add_medication(sample_input()).await.unwrap();

        let edited = fx
            .tracker
            .update_time_slot(&added.id, 0, ClockTime::new(8, 30))
            .await
            .unwrap();

        let rendered: Vec<String> = edited.times.iter().map(|t| t.to_string()).collect();
        assert_eq!(rendered, vec!["08:30", "21:00"]);

        let scheduled = fx.gateway.list_scheduled().await.unwrap();
        assert_eq!(scheduled.len(), 2);
        assert!(scheduled.iter().any(|n| (n.hour, n.minute) == (8, 30)));
    }

    #[tokio::test]
    async fn refill_tops_up_and_stamps_the_date() {
        let fx = fixture();
        let mut input = sample_input();
        input.refill_reminder = true;
        input.current_supply = Some(30);
        input.refill_at = Some(10);
        let added = fx.tracker.add_medication(input).await.unwrap();

        // consume some supply first
        let mut consumed = added.clone();
        consumed.current_supply = 5;
        fx.tracker.update_medication(consumed).await.unwrap();

        let before = Utc::now();
        let refilled = fx.tracker.record_refill(&added.id).await.unwrap();
        let stamped = refilled.last_refill_date.unwrap();

        assert_eq!(refilled.current_supply, refilled.total_supply);
        assert!((stamped - before).num_seconds().abs() <= 1);

        let status = fx.tracker.supply_status(&added.id).await.unwrap();
        assert_eq!(status.percent, 100.0);
    }

    #[tokio::test]
    async fn refill_when_already_full_is_a_no_op() {
        let fx = fixture();
        let mut input = sample_input();
        input.refill_reminder = true;
        input.current_supply = Some(30);
        input.refill_at = Some(10);
        let added = fx.tracker.add_medication(input).await.unwrap();

        let unchanged = fx.tracker.record_refill(&added.id).await.unwrap();
        assert!(unchanged.last_refill_date.is_none());

        let status = fx.tracker.supply_status(&added.id).await.unwrap();
        assert_eq!(status.percent, 100.0);
        assert_eq!(status.tier, crate::supply::SupplyTier::Good);
    }

    #[tokio::test]
    async fn clear_all_data_wipes_records() {
        let fx = fixture();
        let added = fx.tracker.add_medication(sample_input()).await.unwrap();
        fx.tracker
            .record_dose(&added.id, true, Utc::now())
            .await
            .unwrap();

        fx.tracker.clear_all_data().await.unwrap();

        assert!(fx.tracker.get_medications().await.is_empty());
        assert!(fx.tracker.get_dose_history().await.is_empty());
        assert!(!fx
            .tracker
            .has_any_dose_on_day(Local::now().date_naive())
            .await);
    }

    #[tokio::test]
    async fn bootstrap_resyncs_persisted_reminders() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempfile::tempdir().unwrap();

        {
            let (tracker, _rx) = MedTracker::bootstrap(dir.path()).await.unwrap();
            tracker.add_medication(sample_input()).await.unwrap();
        }

        let (tracker, _rx) = MedTracker::bootstrap(dir.path()).await.unwrap();
        assert_eq!(tracker.get_medications().await.len(), 1);
    }
}
