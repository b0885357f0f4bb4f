//! Collaborators of the hydroculture reconciler.
//!
//! This crate provides the declarative side of the system:
//!
//! - **Object store**: holds `Herbs` objects, owns generations and resource
//!   versions, and accepts status-only writes
//! - **Watch bus**: broadcasts create, update and delete events
//! - **Sensor records**: key-value records read by the reconciler
//! - **Manifests**: YAML files that seed the in-memory implementations
//!
//! # Example
//!
//! ```ignore
//! use hydroculture_core::{Herbs, NamespacedName};
//! use hydroculture_store::{HerbsStore, InMemoryHerbsStore, InMemorySensorSource};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = InMemoryHerbsStore::new();
//!     let sensors = InMemorySensorSource::new();
//!
//!     store.create(Herbs::new("greenhouse", "basil-tray", "basil")).await?;
//!     sensors.set_temperature("greenhouse", "24").await;
//!
//!     let herbs = store.get(&NamespacedName::new("greenhouse", "basil-tray")).await?;
//!     println!("generation {}", herbs.metadata.generation);
//! }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(clippy::panic)]

pub mod bus;
pub mod error;
pub mod manifest;
pub mod sensor;
pub mod store;

// Re-export main types
pub use bus::{WatchBus, WatchEvent, WatchEventType, WatchSubscription, DEFAULT_WATCH_CAPACITY};
pub use error::{Error, Result};
pub use manifest::Manifest;
pub use sensor::{InMemorySensorSource, SensorRecord, SensorSource, TEMPERATURE_RECORD, VALUE_KEY};
pub use store::{HerbsStore, HerbsWatch, InMemoryHerbsStore};
