//! Error types for the reconciler crate.

use hydroculture_store::Error as StoreError;
use itertools::Itertools;
use thiserror::Error;

/// Result type alias for reconciler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Reconciler error types.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The object could not be fetched for a reason other than absence.
    #[error("failed to get herbs: {0}")]
    Fetch(#[source] StoreError),

    /// The desired plant is not in the temperature table.
    #[error("unknown plant type: {plant}")]
    UnknownPlant { plant: String },

    /// The sensor record could not be read.
    #[error("failed to read sensor record: {0}")]
    SensorRead(#[source] StoreError),

    /// The sensor record has no temperature entry.
    #[error("temperature value '{key}' not found in sensor record")]
    MissingTemperature { key: String },

    /// The temperature entry is not an integer.
    #[error("invalid temperature value '{value}': {reason}")]
    InvalidTemperature { value: String, reason: String },

    /// The status write was rejected.
    #[error("failed to update herbs status: {0}")]
    StatusUpdate(#[source] StoreError),

    /// Listing or watching objects failed.
    #[error("watch failed: {0}")]
    Watch(#[source] StoreError),

    /// The pass observed a cancellation signal.
    #[error("reconciliation cancelled")]
    Cancelled,

    /// Invalid configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Several errors from one pass, in the order they happened.
    #[error("{}", .0.iter().join("\n"))]
    Joined(Vec<Error>),
}

impl Error {
    /// Create an unknown plant error.
    pub fn unknown_plant(plant: impl Into<String>) -> Self {
        Self::UnknownPlant {
            plant: plant.into(),
        }
    }

    /// Create a missing temperature error.
    pub fn missing_temperature(key: impl Into<String>) -> Self {
        Self::MissingTemperature { key: key.into() }
    }

    /// Create an invalid temperature error.
    pub fn invalid_temperature(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTemperature {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid config error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Join a secondary error onto an optional primary one.
    ///
    /// Neither error is dropped: the result is `secondary` alone when there
    /// is no primary, otherwise a [`Error::Joined`] holding both.
    #[must_use]
    pub fn join(primary: Option<Self>, secondary: Self) -> Self {
        match primary {
            None => secondary,
            Some(Self::Joined(mut errors)) => {
                errors.push(secondary);
                Self::Joined(errors)
            }
            Some(primary) => Self::Joined(vec![primary, secondary]),
        }
    }

    /// The individual errors, flattening [`Error::Joined`].
    pub fn errors(&self) -> Vec<&Self> {
        match self {
            Self::Joined(errors) => errors.iter().flat_map(Self::errors).collect(),
            other => vec![other],
        }
    }

    /// Single-line rendering for status messages.
    pub fn sanitized(&self) -> String {
        self.to_string()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .join("; ")
    }
}
