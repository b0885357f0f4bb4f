//! Status conditions.
//!
//! Conditions are kept in an ordered list keyed by their type, with at most
//! one entry per type. Merging a condition replaces the entry of the same
//! type in place; the transition time moves only when the status does.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Condition type tracking whether the temperature matches the plant.
pub const TEMP_READY: &str = "TempReady";

/// Condition type summarizing overall readiness.
pub const READY: &str = "Ready";

/// Reason shared by both conditions when a pass fails.
pub const REASON_RECONCILIATION_ERROR: &str = "ReconciliationError";

/// Tri-state condition status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl ConditionStatus {
    /// Get the wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::True => "True",
            Self::False => "False",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single observed condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: ConditionStatus,
    pub reason: String,
    pub message: String,
    #[serde(default)]
    pub observed_generation: i64,
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    /// Replace the human-readable message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

/// A canned condition reused verbatim across objects.
///
/// Only the observed generation (and, for the error case, the message) is
/// filled in per pass, so condition text stays identical across the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionTemplate {
    pub type_: &'static str,
    pub status: ConditionStatus,
    pub reason: &'static str,
    pub message: &'static str,
}

impl ConditionTemplate {
    /// Instantiate the template for the given object generation.
    pub fn observed(&self, generation: i64) -> Condition {
        Condition {
            type_: self.type_.to_string(),
            status: self.status,
            reason: self.reason.to_string(),
            message: self.message.to_string(),
            observed_generation: generation,
            last_transition_time: Utc::now(),
        }
    }
}

pub const TEMP_READY_TRUE: ConditionTemplate = ConditionTemplate {
    type_: TEMP_READY,
    status: ConditionStatus::True,
    reason: "TemperatureMatches",
    message: "Temperature matches desired state",
};

pub const TEMP_READY_FALSE: ConditionTemplate = ConditionTemplate {
    type_: TEMP_READY,
    status: ConditionStatus::False,
    reason: "TemperatureMismatch",
    message: "Temperature does not match desired state",
};

pub const TEMP_READY_UNKNOWN: ConditionTemplate = ConditionTemplate {
    type_: TEMP_READY,
    status: ConditionStatus::Unknown,
    reason: REASON_RECONCILIATION_ERROR,
    message: "Cannot read temperature due to error",
};

pub const READY_TRUE: ConditionTemplate = ConditionTemplate {
    type_: READY,
    status: ConditionStatus::True,
    reason: "AllConditionsReady",
    message: "All conditions are ready",
};

pub const READY_FALSE: ConditionTemplate = ConditionTemplate {
    type_: READY,
    status: ConditionStatus::False,
    reason: "NotReady",
    message: "Not all conditions are ready",
};

pub const READY_ERROR: ConditionTemplate = ConditionTemplate {
    type_: READY,
    status: ConditionStatus::False,
    reason: REASON_RECONCILIATION_ERROR,
    message: "Cannot determine readiness due to reconciliation error",
};

/// Merge a condition into the list by type.
///
/// An existing entry of the same type is updated in place and keeps its
/// position. Its `last_transition_time` is taken from `new` only when the
/// status changes. Returns whether anything changed.
pub fn set_status_condition(conditions: &mut Vec<Condition>, new: Condition) -> bool {
    let Some(existing) = conditions.iter_mut().find(|c| c.type_ == new.type_) else {
        conditions.push(new);
        return true;
    };

    let mut changed = false;

    if existing.status != new.status {
        existing.status = new.status;
        existing.last_transition_time = new.last_transition_time;
        changed = true;
    }
    if existing.reason != new.reason {
        existing.reason = new.reason;
        changed = true;
    }
    if existing.message != new.message {
        existing.message = new.message;
        changed = true;
    }
    if existing.observed_generation != new.observed_generation {
        existing.observed_generation = new.observed_generation;
        changed = true;
    }

    changed
}

/// Find the condition of the given type.
pub fn find_status_condition<'a>(conditions: &'a [Condition], type_: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.type_ == type_)
}

/// Check whether the condition of the given type is present and `True`.
pub fn is_status_condition_true(conditions: &[Condition], type_: &str) -> bool {
    find_status_condition(conditions, type_).is_some_and(|c| c.status == ConditionStatus::True)
}
