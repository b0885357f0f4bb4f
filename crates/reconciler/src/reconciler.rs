//! Reconciler implementation.

use std::sync::Arc;

use hydroculture_core::condition::{
    READY_ERROR, READY_FALSE, READY_TRUE, TEMP_READY_FALSE, TEMP_READY_TRUE, TEMP_READY_UNKNOWN,
};
use hydroculture_core::{ideal_temperature, set_status_condition, Herbs, NamespacedName};
use hydroculture_store::{HerbsStore, SensorSource};
use tracing::{debug, error, info, info_span, Instrument};

use crate::config::ReconcilerConfig;
use crate::error::{Error, Result};
use crate::types::{
    Convergence, Drift, Observation, ReconcileContext, ReconcileResult, Reconciled,
};

/// Level-triggered reconciler for `Herbs` objects.
///
/// Holds no state between passes: every pass fetches the object and the
/// sensor record again and re-derives the conditions from scratch, so a
/// pass can be repeated any number of times. The dispatcher must not run
/// two passes for the same object at once.
pub struct HerbsReconciler {
    /// Object store.
    store: Arc<dyn HerbsStore>,
    /// Sensor record source.
    sensors: Arc<dyn SensorSource>,
    /// Configuration.
    config: ReconcilerConfig,
}

impl HerbsReconciler {
    /// Create a new reconciler.
    pub fn new(
        store: Arc<dyn HerbsStore>,
        sensors: Arc<dyn SensorSource>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            store,
            sensors,
            config,
        }
    }

    /// Run one pass for the object identified by `key`.
    ///
    /// Once the object has been fetched, its conditions are written back on
    /// every exit path and the returned delay comes from that final step.
    /// A deleted object ends the pass with no error and no requeue.
    pub async fn reconcile(&self, ctx: &ReconcileContext, key: &NamespacedName) -> Reconciled {
        let span = info_span!("reconcile", namespace = %key.namespace, name = %key.name);
        self.reconcile_inner(ctx, key).instrument(span).await
    }

    async fn reconcile_inner(&self, ctx: &ReconcileContext, key: &NamespacedName) -> Reconciled {
        let mut herbs = match self.fetch(ctx, key).await {
            Ok(Some(herbs)) => herbs,
            Ok(None) => {
                info!("Herbs resource not found, ignoring since object must be deleted");
                return Reconciled::done();
            }
            Err(e) => {
                error!(error = %e, "Failed to get Herbs resource");
                let delay = self.config.requeue_after(Convergence::Failed);
                return Reconciled::failed(ReconcileResult::requeue_after(delay), e);
            }
        };

        let observed = self.observe(ctx, &mut herbs).await;
        self.finalize(ctx, &mut herbs, observed).await
    }

    /// Fetch the object, mapping absence to `None`.
    async fn fetch(&self, ctx: &ReconcileContext, key: &NamespacedName) -> Result<Option<Herbs>> {
        ctx.check()?;
        match self.store.get(key).await {
            Ok(herbs) => Ok(Some(herbs)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(Error::Fetch(e)),
        }
    }

    /// Compare the sensor reading with the plant's ideal temperature.
    ///
    /// On success the reading is stored in the status. On failure the status
    /// temperature keeps whatever the last successful pass wrote.
    async fn observe(&self, ctx: &ReconcileContext, herbs: &mut Herbs) -> Result<Observation> {
        let plant = herbs.spec.plant.clone();

        let Some(ideal) = ideal_temperature(&plant) else {
            let err = Error::unknown_plant(plant);
            error!(error = %err, "Invalid plant type");
            return Err(err);
        };

        let current = self
            .read_temperature(ctx, &herbs.metadata.namespace)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to get temperature from sensor record"))?;

        herbs.status.temperature = current;

        let observation = Observation {
            plant,
            ideal,
            current,
        };

        // Actuation is out of scope: only the intent is logged.
        match observation.drift() {
            Drift::NeedsHeating => info!(
                plant = %observation.plant,
                current,
                ideal,
                "Temperature below ideal, heating needed"
            ),
            Drift::NeedsCooling => info!(
                plant = %observation.plant,
                current,
                ideal,
                "Temperature above ideal, cooling needed"
            ),
            Drift::Optimal => info!(
                plant = %observation.plant,
                temperature = current,
                "Temperature is optimal"
            ),
        }

        Ok(observation)
    }

    /// Read the integer temperature from the namespace's sensor record.
    async fn read_temperature(&self, ctx: &ReconcileContext, namespace: &str) -> Result<i32> {
        ctx.check()?;

        let record = self
            .sensors
            .get_record(namespace, &self.config.sensor_record)
            .await
            .map_err(Error::SensorRead)?;

        let text = record
            .get(&self.config.sensor_value_key)
            .ok_or_else(|| Error::missing_temperature(self.config.sensor_value_key.clone()))?;

        let temperature = text
            .parse::<i32>()
            .map_err(|e| Error::invalid_temperature(text, e.to_string()))?;

        debug!(temperature, "Read temperature from sensor record");
        Ok(temperature)
    }

    /// Final step of every pass that fetched the object.
    ///
    /// A failed status write is joined onto the pass error; it does not
    /// change the delay.
    async fn finalize(
        &self,
        ctx: &ReconcileContext,
        herbs: &mut Herbs,
        observed: Result<Observation>,
    ) -> Reconciled {
        let (result, written) = self.update_conditions(ctx, herbs, observed.as_ref()).await;

        let mut error = observed.err();
        if let Err(e) = written {
            error = Some(Error::join(error, e));
        }

        Reconciled { result, error }
    }

    /// Derive both conditions from the pass outcome and write the status.
    async fn update_conditions(
        &self,
        ctx: &ReconcileContext,
        herbs: &mut Herbs,
        observed: std::result::Result<&Observation, &Error>,
    ) -> (ReconcileResult, Result<()>) {
        let generation = herbs.metadata.generation;
        let convergence = Convergence::of(observed);

        let (temp_ready, ready) = match observed {
            Err(e) => (
                TEMP_READY_UNKNOWN
                    .observed(generation)
                    .with_message(format!("Error: {}", e.sanitized())),
                READY_ERROR.observed(generation),
            ),
            Ok(observation) if convergence == Convergence::Converged => {
                debug!(
                    plant = %observation.plant,
                    temperature = observation.current,
                    "Temperature is optimal"
                );
                (
                    TEMP_READY_TRUE.observed(generation),
                    READY_TRUE.observed(generation),
                )
            }
            Ok(observation) => {
                debug!(
                    plant = %observation.plant,
                    current = observation.current,
                    ideal = observation.ideal,
                    "Temperature adjustment in progress"
                );
                (
                    TEMP_READY_FALSE.observed(generation),
                    READY_FALSE.observed(generation),
                )
            }
        };

        let result = ReconcileResult::requeue_after(self.config.requeue_after(convergence));

        set_status_condition(&mut herbs.status.conditions, temp_ready);
        set_status_condition(&mut herbs.status.conditions, ready);

        (result, self.write_status(ctx, herbs).await)
    }

    /// Persist the status. Failures are logged here and never retried.
    async fn write_status(&self, ctx: &ReconcileContext, herbs: &Herbs) -> Result<()> {
        let written = match ctx.check() {
            Ok(()) => self
                .store
                .update_status(herbs)
                .await
                .map(|_| ())
                .map_err(Error::StatusUpdate),
            Err(e) => Err(e),
        };
        written.inspect_err(|e| error!(error = %e, "Failed to update Herbs status"))
    }

    /// Get the configuration.
    pub const fn config(&self) -> &ReconcilerConfig {
        &self.config
    }
}

/// Builder for [`HerbsReconciler`].
pub struct ReconcilerBuilder {
    store: Option<Arc<dyn HerbsStore>>,
    sensors: Option<Arc<dyn SensorSource>>,
    config: ReconcilerConfig,
}

impl ReconcilerBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            store: None,
            sensors: None,
            config: ReconcilerConfig::default(),
        }
    }

    /// Set the object store.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn HerbsStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the sensor source.
    #[must_use]
    pub fn with_sensors(mut self, sensors: Arc<dyn SensorSource>) -> Self {
        self.sensors = Some(sensors);
        self
    }

    /// Set the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ReconcilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the reconciler.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when a collaborator is missing or
    /// the configuration does not validate.
    pub fn build(self) -> Result<HerbsReconciler> {
        let store = self
            .store
            .ok_or_else(|| Error::invalid_config("object store is required"))?;

        let sensors = self
            .sensors
            .ok_or_else(|| Error::invalid_config("sensor source is required"))?;

        self.config.validate()?;

        Ok(HerbsReconciler::new(store, sensors, self.config))
    }
}

impl Default for ReconcilerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
