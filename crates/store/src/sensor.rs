//! Sensor records.
//!
//! A sensor record is a flat string map stored under a well-known name in
//! each namespace. The temperature lives in the `value` entry of the
//! `temperature` record.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use hydroculture_core::{NamespacedName, DEFAULT_NAMESPACE};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{Error, Result};

/// Name of the record holding the temperature reading.
pub const TEMPERATURE_RECORD: &str = "temperature";

/// Entry of the temperature record holding the reading.
pub const VALUE_KEY: &str = "value";

const KIND: &str = "sensor record";

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_record_name() -> String {
    TEMPERATURE_RECORD.to_string()
}

/// A key-value sensor record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorRecord {
    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default = "default_record_name")]
    pub name: String,

    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

impl SensorRecord {
    /// Create an empty record.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            data: BTreeMap::new(),
        }
    }

    /// Create a temperature record holding `value` as text.
    pub fn temperature(namespace: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(namespace, TEMPERATURE_RECORD).with_entry(VALUE_KEY, value)
    }

    /// Add an entry.
    #[must_use]
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Look up an entry.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    /// Identity of this record.
    pub fn key(&self) -> NamespacedName {
        NamespacedName::new(self.namespace.clone(), self.name.clone())
    }
}

/// Source of sensor records.
#[async_trait]
pub trait SensorSource: Send + Sync {
    /// Read a record by namespace and name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the record does not exist.
    async fn get_record(&self, namespace: &str, name: &str) -> Result<SensorRecord>;
}

/// In-memory sensor records.
#[derive(Default)]
pub struct InMemorySensorSource {
    records: RwLock<HashMap<NamespacedName, SensorRecord>>,
}

impl InMemorySensorSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record.
    pub async fn put(&self, record: SensorRecord) {
        debug!(key = %record.key(), entries = record.data.len(), "Stored sensor record");
        self.records.write().await.insert(record.key(), record);
    }

    /// Set the temperature reading for a namespace.
    pub async fn set_temperature(&self, namespace: &str, value: impl Into<String>) {
        self.put(SensorRecord::temperature(namespace, value)).await;
    }

    /// Remove a record.
    pub async fn remove(&self, namespace: &str, name: &str) -> Option<SensorRecord> {
        self.records
            .write()
            .await
            .remove(&NamespacedName::new(namespace, name))
    }
}

#[async_trait]
impl SensorSource for InMemorySensorSource {
    async fn get_record(&self, namespace: &str, name: &str) -> Result<SensorRecord> {
        let key = NamespacedName::new(namespace, name);
        self.records
            .read()
            .await
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::not_found(KIND, &key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_temperature_is_readable() {
        let sensors = InMemorySensorSource::new();
        sensors.set_temperature("greenhouse", "24").await;

        let record = sensors
            .get_record("greenhouse", TEMPERATURE_RECORD)
            .await
            .ok();
        assert_eq!(
            record.as_ref().and_then(|r| r.get(VALUE_KEY)),
            Some("24")
        );
    }

    #[tokio::test]
    async fn test_records_are_scoped_by_namespace() {
        let sensors = InMemorySensorSource::new();
        sensors.set_temperature("greenhouse", "24").await;

        let other = sensors.get_record("shed", TEMPERATURE_RECORD).await;
        assert!(other.is_err_and(|e| e.is_not_found()));
    }

    #[tokio::test]
    async fn test_remove_record() {
        let sensors = InMemorySensorSource::new();
        sensors.set_temperature("greenhouse", "24").await;

        assert!(sensors
            .remove("greenhouse", TEMPERATURE_RECORD)
            .await
            .is_some());
        assert!(sensors
            .get_record("greenhouse", TEMPERATURE_RECORD)
            .await
            .is_err());
    }

    #[test]
    fn test_record_defaults_when_deserialized() {
        let record: Option<SensorRecord> = serde_yaml::from_str("data:\n  value: \"18\"\n").ok();
        assert_eq!(
            record.map(|r| r.key()),
            Some(NamespacedName::new(DEFAULT_NAMESPACE, TEMPERATURE_RECORD))
        );
    }
}
