//! End-to-end reconcile passes against in-memory collaborators.
//!
//! Tests verify that:
//! - Each plant/reading combination yields the expected conditions and delay
//! - Failed passes still persist Unknown/False conditions
//! - Repeated passes are idempotent and keep transition times
//! - Deleted objects end the pass without a status write
//! - Status write failures are joined onto the pass error

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hydroculture_core::{
    find_status_condition, Condition, ConditionStatus, Herbs, NamespacedName, Plant, READY,
    REASON_RECONCILIATION_ERROR, TEMP_READY,
};
use hydroculture_reconciler::{
    Drift, Error, HerbsReconciler, Observation, ReconcileContext, ReconcilerConfig, Reconciled,
};
use hydroculture_store::{
    Error as StoreError, HerbsStore, InMemoryHerbsStore, InMemorySensorSource, Result as StoreResult,
};
use proptest::prelude::*;
use tokio::sync::watch;

const NAMESPACE: &str = "greenhouse";

/// Store wrapper that counts status writes and can be told to fail.
struct RecordingStore {
    inner: InMemoryHerbsStore,
    writes: AtomicUsize,
    fail_get: AtomicBool,
    fail_writes: AtomicBool,
}

impl RecordingStore {
    fn new() -> Self {
        Self {
            inner: InMemoryHerbsStore::new(),
            writes: AtomicUsize::new(0),
            fail_get: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl HerbsStore for RecordingStore {
    async fn get(&self, key: &NamespacedName) -> StoreResult<Herbs> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("connection refused"));
        }
        self.inner.get(key).await
    }

    async fn update_status(&self, herbs: &Herbs) -> StoreResult<Herbs> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("status subresource rejected"));
        }
        self.inner.update_status(herbs).await
    }
}

struct Harness {
    store: Arc<RecordingStore>,
    sensors: Arc<InMemorySensorSource>,
    reconciler: HerbsReconciler,
    key: NamespacedName,
}

impl Harness {
    async fn new(plant: &str, reading: Option<&str>) -> Self {
        let store = Arc::new(RecordingStore::new());
        let sensors = Arc::new(InMemorySensorSource::new());
        let herbs = Herbs::new(NAMESPACE, "tray", plant);
        let key = herbs.key();
        let _ = store.inner.create(herbs).await;
        if let Some(value) = reading {
            sensors.set_temperature(NAMESPACE, value).await;
        }
        let reconciler =
            HerbsReconciler::new(store.clone(), sensors.clone(), ReconcilerConfig::default());
        Self {
            store,
            sensors,
            reconciler,
            key,
        }
    }

    async fn reconcile(&self) -> Reconciled {
        self.reconciler
            .reconcile(&ReconcileContext::background(), &self.key)
            .await
    }

    async fn condition(&self, type_: &str) -> Option<Condition> {
        let herbs = self.store.inner.get(&self.key).await.ok()?;
        find_status_condition(&herbs.status.conditions, type_).cloned()
    }

    async fn statuses(&self) -> (Option<ConditionStatus>, Option<ConditionStatus>) {
        (
            self.condition(TEMP_READY).await.map(|c| c.status),
            self.condition(READY).await.map(|c| c.status),
        )
    }
}

#[tokio::test]
async fn basil_at_ideal_temperature_converges() {
    // GIVEN: basil (ideal 24) and a reading of 24
    let h = Harness::new("basil", Some("24")).await;

    // WHEN: One pass runs
    let outcome = h.reconcile().await;

    // THEN: Both conditions are True and the next check is in 10s
    assert!(outcome.error.is_none());
    assert_eq!(outcome.result.requeue_after, Duration::from_secs(10));
    assert_eq!(
        h.statuses().await,
        (Some(ConditionStatus::True), Some(ConditionStatus::True))
    );
    let herbs = h.store.inner.get(&h.key).await.ok();
    assert_eq!(herbs.map(|h| h.status.temperature), Some(24));
}

#[tokio::test]
async fn cold_lettuce_is_adjusting() {
    // GIVEN: lettuce (ideal 20) and a reading of 15
    let h = Harness::new("lettuce", Some("15")).await;

    // WHEN: One pass runs
    let outcome = h.reconcile().await;

    // THEN: Both conditions are False and the next check is in 1s
    assert!(outcome.error.is_none());
    assert_eq!(outcome.result.requeue_after, Duration::from_secs(1));
    assert_eq!(
        h.statuses().await,
        (Some(ConditionStatus::False), Some(ConditionStatus::False))
    );
    let reason = h.condition(TEMP_READY).await.map(|c| c.reason);
    assert_eq!(reason.as_deref(), Some("TemperatureMismatch"));

    // AND: The pass reads it as a heating need and stores the reading
    let observation = Observation {
        plant: "lettuce".to_string(),
        ideal: 20,
        current: 15,
    };
    assert_eq!(observation.drift(), Drift::NeedsHeating);
    let herbs = h.store.inner.get(&h.key).await.ok();
    assert_eq!(herbs.map(|h| h.status.temperature), Some(15));
}

#[tokio::test]
async fn spinach_without_sensor_record_fails_with_read_error() {
    // GIVEN: spinach and no sensor record in the namespace
    let h = Harness::new("spinach", None).await;

    // WHEN: One pass runs
    let outcome = h.reconcile().await;

    // THEN: The pass fails, retries in 5s and records why
    assert!(matches!(outcome.error, Some(Error::SensorRead(_))));
    assert_eq!(outcome.result.requeue_after, Duration::from_secs(5));
    assert_eq!(
        h.statuses().await,
        (Some(ConditionStatus::Unknown), Some(ConditionStatus::False))
    );

    let temp_ready = h.condition(TEMP_READY).await;
    let message = temp_ready.as_ref().map(|c| c.message.clone()).unwrap_or_default();
    assert!(message.starts_with("Error: "));
    assert!(message.contains("not found"));
    assert_eq!(
        temp_ready.map(|c| c.reason),
        Some(REASON_RECONCILIATION_ERROR.to_string())
    );
    assert_eq!(
        h.condition(READY).await.map(|c| c.reason),
        Some(REASON_RECONCILIATION_ERROR.to_string())
    );
}

#[tokio::test]
async fn unknown_plant_is_treated_like_any_failure() {
    // GIVEN: A plant with no ideal temperature
    let h = Harness::new("kale", Some("20")).await;

    // WHEN: One pass runs
    let outcome = h.reconcile().await;

    // THEN: The error names the plant and the conditions are Unknown/False
    let message = outcome.error.as_ref().map(ToString::to_string);
    assert_eq!(message.as_deref(), Some("unknown plant type: kale"));
    assert_eq!(outcome.result.requeue_after, Duration::from_secs(5));
    assert_eq!(
        h.statuses().await,
        (Some(ConditionStatus::Unknown), Some(ConditionStatus::False))
    );
    let temp_ready = h.condition(TEMP_READY).await.map(|c| c.message);
    assert_eq!(
        temp_ready.as_deref(),
        Some("Error: unknown plant type: kale")
    );
}

#[tokio::test]
async fn non_integer_reading_is_a_parse_failure() {
    let h = Harness::new("basil", Some("24.5")).await;

    let outcome = h.reconcile().await;

    assert!(matches!(
        outcome.error,
        Some(Error::InvalidTemperature { ref value, .. }) if value == "24.5"
    ));
    assert_eq!(outcome.result.requeue_after, Duration::from_secs(5));
}

#[tokio::test]
async fn repeated_passes_are_idempotent() {
    // GIVEN: An object that converged once
    let h = Harness::new("basil", Some("24")).await;
    let _ = h.reconcile().await;
    let first_temp = h.condition(TEMP_READY).await;
    let first_ready = h.condition(READY).await;

    // WHEN: The pass runs again with nothing changed
    tokio::time::sleep(Duration::from_millis(5)).await;
    let outcome = h.reconcile().await;

    // THEN: Conditions are identical, transition times included
    assert!(outcome.error.is_none());
    assert_eq!(h.condition(TEMP_READY).await, first_temp);
    assert_eq!(h.condition(READY).await, first_ready);
}

#[tokio::test]
async fn transition_time_moves_only_on_status_change() {
    // GIVEN: An adjusting object
    let h = Harness::new("spinach", Some("21")).await;
    let _ = h.reconcile().await;
    let adjusting = h.condition(TEMP_READY).await.map(|c| c.last_transition_time);

    // WHEN: The reading changes but stays off target
    h.sensors.set_temperature(NAMESPACE, "19").await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let _ = h.reconcile().await;

    // THEN: Status is still False and the time is untouched
    let still_adjusting = h.condition(TEMP_READY).await.map(|c| c.last_transition_time);
    assert_eq!(still_adjusting, adjusting);

    // WHEN: The reading reaches the ideal
    h.sensors.set_temperature(NAMESPACE, "18").await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let _ = h.reconcile().await;

    // THEN: The transition time moves forward
    let converged = h.condition(TEMP_READY).await.map(|c| c.last_transition_time);
    assert!(converged > adjusting);
}

#[tokio::test]
async fn recovered_object_drops_error_message() {
    // GIVEN: An object whose last pass failed
    let h = Harness::new("lettuce", Some("warm")).await;
    let _ = h.reconcile().await;

    // WHEN: The sensor recovers at the ideal temperature
    h.sensors.set_temperature(NAMESPACE, "20").await;
    let outcome = h.reconcile().await;

    // THEN: The steady-state message replaces the error text
    assert!(outcome.error.is_none());
    let message = h.condition(TEMP_READY).await.map(|c| c.message);
    assert_eq!(message.as_deref(), Some("Temperature matches desired state"));
}

#[tokio::test]
async fn deleted_object_ends_pass_without_write() {
    // GIVEN: An object that has been deleted
    let h = Harness::new("basil", Some("24")).await;
    let _ = h.store.inner.delete(&h.key).await;

    // WHEN: A pass runs for it
    let outcome = h.reconcile().await;

    // THEN: No error, no requeue, no status write
    assert!(outcome.error.is_none());
    assert!(!outcome.result.is_requeue());
    assert_eq!(h.store.writes(), 0);
}

#[tokio::test]
async fn fetch_failure_retries_without_write() {
    // GIVEN: A store that cannot be reached
    let h = Harness::new("basil", Some("24")).await;
    h.store.fail_get.store(true, Ordering::SeqCst);

    // WHEN: A pass runs
    let outcome = h.reconcile().await;

    // THEN: The pass fails with the error delay and nothing is written
    assert!(matches!(outcome.error, Some(Error::Fetch(_))));
    assert_eq!(outcome.result.requeue_after, Duration::from_secs(5));
    assert_eq!(h.store.writes(), 0);
}

#[tokio::test]
async fn status_write_failure_keeps_computed_delay() {
    // GIVEN: A converging object whose status writes are rejected
    let h = Harness::new("basil", Some("24")).await;
    h.store.fail_writes.store(true, Ordering::SeqCst);

    // WHEN: A pass runs
    let outcome = h.reconcile().await;

    // THEN: The write error surfaces but the converged delay stands
    assert!(matches!(outcome.error, Some(Error::StatusUpdate(_))));
    assert_eq!(outcome.result.requeue_after, Duration::from_secs(10));
    assert_eq!(h.store.writes(), 1);
}

#[tokio::test]
async fn status_write_failure_is_joined_onto_pass_error() {
    // GIVEN: An unknown plant and a store rejecting status writes
    let h = Harness::new("kale", Some("20")).await;
    h.store.fail_writes.store(true, Ordering::SeqCst);

    // WHEN: A pass runs
    let outcome = h.reconcile().await;

    // THEN: Both errors are kept, in order
    let errors = outcome
        .error
        .as_ref()
        .map(|e| e.errors().into_iter().cloned().collect::<Vec<_>>())
        .unwrap_or_default();
    assert_eq!(errors.len(), 2);
    assert!(matches!(errors.first(), Some(Error::UnknownPlant { .. })));
    assert!(matches!(errors.get(1), Some(Error::StatusUpdate(_))));
    assert_eq!(outcome.result.requeue_after, Duration::from_secs(5));
}

#[tokio::test]
async fn cancelled_context_fails_at_first_call_boundary() {
    // GIVEN: A context that is already cancelled
    let h = Harness::new("basil", Some("24")).await;
    let (tx, rx) = watch::channel(false);
    let _ = tx.send(true);

    // WHEN: A pass runs under it
    let outcome = h
        .reconciler
        .reconcile(&ReconcileContext::new(rx), &h.key)
        .await;

    // THEN: The pass reports cancellation and never reaches the store
    assert!(matches!(outcome.error, Some(Error::Cancelled)));
    assert_eq!(outcome.result.requeue_after, Duration::from_secs(5));
    assert_eq!(h.store.writes(), 0);
}

fn runtime() -> Option<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .ok()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn conditions_follow_reading(plant in prop::sample::select(Plant::ALL.to_vec()), reading in -10i32..40) {
        let Some(rt) = runtime() else {
            return Err(TestCaseError::fail("runtime"));
        };

        let (outcome, statuses) = rt.block_on(async {
            let h = Harness::new(plant.as_str(), Some(&reading.to_string())).await;
            let outcome = h.reconcile().await;
            (outcome, h.statuses().await)
        });

        prop_assert!(outcome.error.is_none());
        if reading == plant.ideal_temperature() {
            prop_assert_eq!(outcome.result.requeue_after, Duration::from_secs(10));
            prop_assert_eq!(statuses, (Some(ConditionStatus::True), Some(ConditionStatus::True)));
        } else {
            prop_assert_eq!(outcome.result.requeue_after, Duration::from_secs(1));
            prop_assert_eq!(statuses, (Some(ConditionStatus::False), Some(ConditionStatus::False)));
        }
    }
}
