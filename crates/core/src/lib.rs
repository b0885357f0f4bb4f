//! Resource model for the hydroculture controller.
//!
//! A `Herbs` object declares which plant grows in a namespace. Its status
//! carries the last observed temperature and two conditions:
//!
//! - **TempReady**: whether the temperature matches the plant's ideal
//! - **Ready**: overall readiness of the environment
//!
//! Conditions are built from a fixed set of templates so that their text is
//! identical across objects, and are merged by type so that transition
//! times only move when a status actually changes.

#![forbid(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(clippy::panic)]

pub mod condition;
pub mod error;
pub mod herbs;
pub mod meta;

// Re-export main types
pub use condition::{
    find_status_condition, is_status_condition_true, set_status_condition, Condition,
    ConditionStatus, ConditionTemplate, READY, REASON_RECONCILIATION_ERROR, TEMP_READY,
};
pub use error::{Error, Result};
pub use herbs::{
    ideal_temperature, Herbs, HerbsList, HerbsSpec, HerbsStatus, Plant, PrintRow, API_VERSION,
    KIND, LIST_KIND,
};
pub use meta::{NamespacedName, ObjectMeta, DEFAULT_NAMESPACE};
