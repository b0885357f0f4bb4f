//! Configuration for the reconciler and its controller.

use std::path::Path;
use std::time::Duration;

use hydroculture_store::{TEMPERATURE_RECORD, VALUE_KEY};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Convergence;

/// Configuration for a single reconcile pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Delay before re-checking an object whose temperature matches.
    #[serde(default = "default_converged_requeue_secs")]
    pub converged_requeue_secs: u64,

    /// Delay before re-checking an object whose temperature is off.
    #[serde(default = "default_adjusting_requeue_secs")]
    pub adjusting_requeue_secs: u64,

    /// Delay before retrying a failed pass.
    #[serde(default = "default_error_requeue_secs")]
    pub error_requeue_secs: u64,

    /// Name of the sensor record read in each namespace.
    #[serde(default = "default_sensor_record")]
    pub sensor_record: String,

    /// Entry of the sensor record holding the temperature.
    #[serde(default = "default_sensor_value_key")]
    pub sensor_value_key: String,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            converged_requeue_secs: default_converged_requeue_secs(),
            adjusting_requeue_secs: default_adjusting_requeue_secs(),
            error_requeue_secs: default_error_requeue_secs(),
            sensor_record: default_sensor_record(),
            sensor_value_key: default_sensor_value_key(),
        }
    }
}

impl ReconcilerConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns error if a delay is zero or a sensor name is empty.
    pub fn validate(&self) -> Result<()> {
        if self.converged_requeue_secs == 0 {
            return Err(Error::invalid_config(
                "converged_requeue_secs must be greater than 0",
            ));
        }

        if self.adjusting_requeue_secs == 0 {
            return Err(Error::invalid_config(
                "adjusting_requeue_secs must be greater than 0",
            ));
        }

        if self.error_requeue_secs == 0 {
            return Err(Error::invalid_config(
                "error_requeue_secs must be greater than 0",
            ));
        }

        if self.sensor_record.is_empty() {
            return Err(Error::invalid_config("sensor_record must not be empty"));
        }

        if self.sensor_value_key.is_empty() {
            return Err(Error::invalid_config("sensor_value_key must not be empty"));
        }

        Ok(())
    }

    /// Delay before the next pass for an object in the given state.
    #[must_use]
    pub const fn requeue_after(&self, convergence: Convergence) -> Duration {
        match convergence {
            Convergence::Converged => Duration::from_secs(self.converged_requeue_secs),
            Convergence::Adjusting => Duration::from_secs(self.adjusting_requeue_secs),
            Convergence::Failed => Duration::from_secs(self.error_requeue_secs),
        }
    }
}

/// Configuration for the controller driving reconcile passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Controller name, used in logs.
    #[serde(default = "default_name")]
    pub name: String,

    /// Maximum number of passes running at once.
    #[serde(default = "default_max_concurrent_reconciles")]
    pub max_concurrent_reconciles: usize,

    /// Per-pass configuration.
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            max_concurrent_reconciles: default_max_concurrent_reconciles(),
            reconciler: ReconcilerConfig::default(),
        }
    }
}

impl ControllerConfig {
    /// Create a controller config with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when the text does not parse or
    /// fails validation.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when the file cannot be read or its
    /// contents are invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::invalid_config(format!("failed to read '{}': {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::invalid_config("name must not be empty"));
        }

        if self.max_concurrent_reconciles == 0 {
            return Err(Error::invalid_config(
                "max_concurrent_reconciles must be greater than 0",
            ));
        }

        self.reconciler.validate()
    }
}

fn default_converged_requeue_secs() -> u64 {
    10
}

fn default_adjusting_requeue_secs() -> u64 {
    1
}

fn default_error_requeue_secs() -> u64 {
    5
}

fn default_sensor_record() -> String {
    TEMPERATURE_RECORD.to_string()
}

fn default_sensor_value_key() -> String {
    VALUE_KEY.to_string()
}

fn default_name() -> String {
    "herbs".to_string()
}

fn default_max_concurrent_reconciles() -> usize {
    1
}
