//! Core error types for the hydroculture resource model.
//!
//! All errors are explicit, typed, and recoverable - no panics allowed.

use thiserror::Error;

/// Result type alias for resource model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for resource model operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The desired plant is outside the supported enumeration.
    #[error("unknown plant type: {plant}")]
    UnknownPlant { plant: String },

    /// An object identity could not be parsed.
    #[error("invalid object name '{input}': {reason}")]
    InvalidName { input: String, reason: String },
}

impl Error {
    /// Create an unknown plant error.
    pub fn unknown_plant(plant: impl Into<String>) -> Self {
        Self::UnknownPlant {
            plant: plant.into(),
        }
    }

    /// Create an invalid name error.
    pub fn invalid_name(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            input: input.into(),
            reason: reason.into(),
        }
    }
}
