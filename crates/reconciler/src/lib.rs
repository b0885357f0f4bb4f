//! Level-triggered reconciliation loop for `Herbs` objects.
//!
//! Every pass is computed from scratch:
//!
//! 1. Fetch the object (absent objects end the pass quietly)
//! 2. Look up the plant's ideal temperature
//! 3. Read the namespace's temperature sensor record
//! 4. Derive `TempReady` and `Ready`, write the status, and pick a delay
//!
//! Step 4 runs on every exit path once the object was fetched, so a failed
//! pass still leaves `TempReady=Unknown` and `Ready=False` behind.
//!
//! | Outcome    | TempReady | Ready | Requeue |
//! |------------|-----------|-------|---------|
//! | converged  | True      | True  | 10s     |
//! | adjusting  | False     | False | 1s      |
//! | failed     | Unknown   | False | 5s      |
//!
//! The [`Controller`] feeds passes from watch events and requeue timers,
//! never running two passes for one object at once.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use hydroculture_reconciler::{Controller, ControllerConfig, HerbsReconciler};
//! use hydroculture_store::{InMemoryHerbsStore, InMemorySensorSource};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(InMemoryHerbsStore::new());
//!     let sensors = Arc::new(InMemorySensorSource::new());
//!     let config = ControllerConfig::default();
//!
//!     let reconciler = Arc::new(HerbsReconciler::new(
//!         store.clone(),
//!         sensors,
//!         config.reconciler.clone(),
//!     ));
//!     let controller = Controller::new(reconciler, store, config);
//!
//!     // Run until stopped
//!     // controller.run().await;
//! }
//! ```

#![forbid(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(clippy::panic)]

pub mod config;
pub mod error;
pub mod r#loop;
pub mod queue;
pub mod reconciler;
pub mod types;

// Re-export main types
pub use config::{ControllerConfig, ReconcilerConfig};
pub use error::{Error, Result};
pub use queue::WorkQueue;
pub use r#loop::{Controller, ControllerStopper};
pub use reconciler::{HerbsReconciler, ReconcilerBuilder};
pub use types::{
    Convergence, Drift, Observation, ReconcileContext, ReconcileResult, Reconciled,
};
