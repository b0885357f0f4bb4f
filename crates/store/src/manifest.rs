//! YAML manifests seeding the in-memory collaborators.
//!
//! ```yaml
//! herbs:
//!   - metadata:
//!       name: basil-tray
//!       namespace: greenhouse
//!     spec:
//!       plant: basil
//! sensors:
//!   - namespace: greenhouse
//!     data:
//!       value: "24"
//! ```

use std::path::Path;

use hydroculture_core::Herbs;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::sensor::{InMemorySensorSource, SensorRecord};
use crate::store::InMemoryHerbsStore;

/// Desired objects and sensor records to load at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub herbs: Vec<Herbs>,

    #[serde(default)]
    pub sensors: Vec<SensorRecord>,
}

impl Manifest {
    /// Parse a manifest from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidManifest`] when the text is not a manifest.
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| Error::invalid_manifest(e.to_string()))
    }

    /// Read and parse a manifest file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be read, and
    /// [`Error::InvalidManifest`] when it cannot be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e.to_string()))?;
        Self::from_yaml(&text)
    }

    /// Apply every object and record.
    ///
    /// Objects go through [`InMemoryHerbsStore::apply`], so loading the same
    /// manifest twice leaves generations untouched.
    ///
    /// # Errors
    ///
    /// Returns the first store error.
    pub async fn apply(
        &self,
        store: &InMemoryHerbsStore,
        sensors: &InMemorySensorSource,
    ) -> Result<()> {
        for herbs in &self.herbs {
            store.apply(herbs.clone()).await?;
        }
        for record in &self.sensors {
            sensors.put(record.clone()).await;
        }

        info!(
            herbs = self.herbs.len(),
            sensors = self.sensors.len(),
            "Applied manifest"
        );
        Ok(())
    }
}
