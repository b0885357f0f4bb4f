//! Object store traits and the in-memory implementation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use hydroculture_core::{Herbs, HerbsStatus, NamespacedName};
use tokio::sync::RwLock;
use tracing::debug;
use ulid::Ulid;

use crate::bus::{WatchBus, WatchEvent, WatchEventType, WatchSubscription};
use crate::error::{Error, Result};

const KIND: &str = "herbs";

/// Read and status-write access to `Herbs` objects.
///
/// This is everything a single reconcile pass needs from the store.
#[async_trait]
pub trait HerbsStore: Send + Sync {
    /// Fetch a fresh copy of an object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the object does not exist.
    async fn get(&self, key: &NamespacedName) -> Result<Herbs>;

    /// Persist the status of an object, leaving its desired state alone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] when `herbs` was read before the latest
    /// write, and [`Error::NotFound`] when the object is gone.
    async fn update_status(&self, herbs: &Herbs) -> Result<Herbs>;
}

/// Listing and change notifications, used by the dispatcher.
#[async_trait]
pub trait HerbsWatch: Send + Sync {
    /// Identities of every stored object.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot be listed.
    async fn list(&self) -> Result<Vec<NamespacedName>>;

    /// Subscribe to create, update and delete events.
    fn subscribe(&self) -> WatchSubscription;
}

#[derive(Default)]
struct State {
    objects: BTreeMap<NamespacedName, Herbs>,
    resource_version: u64,
}

impl State {
    fn next_resource_version(&mut self) -> u64 {
        self.resource_version = self.resource_version.saturating_add(1);
        self.resource_version
    }
}

/// In-memory object store.
///
/// Spec writes bump the generation when the desired state changes and emit
/// watch events. Status writes never emit events and only bump the resource
/// version when the status actually changes.
#[derive(Default)]
pub struct InMemoryHerbsStore {
    state: RwLock<State>,
    bus: WatchBus,
}

impl InMemoryHerbsStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new object.
    ///
    /// Any status on `herbs` is discarded; the store assigns uid, generation
    /// and resource version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyExists`] when the identity is taken.
    pub async fn create(&self, herbs: Herbs) -> Result<Herbs> {
        let key = herbs.key();
        let mut state = self.state.write().await;

        if state.objects.contains_key(&key) {
            return Err(Error::already_exists(KIND, &key));
        }

        let mut stored = herbs;
        stored.metadata.uid = Some(Ulid::new());
        stored.metadata.generation = 1;
        stored.metadata.resource_version = state.next_resource_version();
        stored.metadata.creation_timestamp = Some(Utc::now());
        stored.status = HerbsStatus::default();

        state.objects.insert(key.clone(), stored.clone());
        drop(state);

        debug!(key = %key, plant = %stored.spec.plant, "Created herbs");
        self.bus.publish(WatchEvent::new(WatchEventType::Added, key, 1));
        Ok(stored)
    }

    /// Create an object, or update the desired state of an existing one.
    ///
    /// The generation moves only when the desired state differs.
    ///
    /// # Errors
    ///
    /// Never fails for the in-memory backend; the signature matches the
    /// other write operations.
    pub async fn apply(&self, herbs: Herbs) -> Result<Herbs> {
        let key = herbs.key();
        let mut state = self.state.write().await;

        let Some(existing) = state.objects.get(&key).cloned() else {
            drop(state);
            return self.create(herbs).await;
        };

        if existing.spec == herbs.spec {
            return Ok(existing);
        }

        let mut updated = existing;
        updated.spec = herbs.spec;
        updated.metadata.generation = updated.metadata.generation.saturating_add(1);
        updated.metadata.resource_version = state.next_resource_version();

        state.objects.insert(key.clone(), updated.clone());
        drop(state);

        debug!(
            key = %key,
            plant = %updated.spec.plant,
            generation = updated.metadata.generation,
            "Updated herbs spec"
        );
        self.bus.publish(WatchEvent::new(
            WatchEventType::Modified,
            key,
            updated.metadata.generation,
        ));
        Ok(updated)
    }

    /// Delete an object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the object does not exist.
    pub async fn delete(&self, key: &NamespacedName) -> Result<Herbs> {
        let removed = self
            .state
            .write()
            .await
            .objects
            .remove(key)
            .ok_or_else(|| Error::not_found(KIND, key))?;

        debug!(key = %key, "Deleted herbs");
        self.bus.publish(WatchEvent::new(
            WatchEventType::Deleted,
            key.clone(),
            removed.metadata.generation,
        ));
        Ok(removed)
    }

    /// Snapshot of every stored object, ordered by identity.
    pub async fn objects(&self) -> Vec<Herbs> {
        self.state.read().await.objects.values().cloned().collect()
    }
}

#[async_trait]
impl HerbsStore for InMemoryHerbsStore {
    async fn get(&self, key: &NamespacedName) -> Result<Herbs> {
        self.state
            .read()
            .await
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| Error::not_found(KIND, key))
    }

    async fn update_status(&self, herbs: &Herbs) -> Result<Herbs> {
        let key = herbs.key();
        let mut state = self.state.write().await;
        let State {
            objects,
            resource_version,
        } = &mut *state;

        let stored = objects
            .get_mut(&key)
            .ok_or_else(|| Error::not_found(KIND, &key))?;

        if stored.metadata.resource_version != herbs.metadata.resource_version {
            return Err(Error::conflict(
                &key,
                herbs.metadata.resource_version,
                stored.metadata.resource_version,
            ));
        }

        if stored.status != herbs.status {
            *resource_version = resource_version.saturating_add(1);
            stored.status = herbs.status.clone();
            stored.metadata.resource_version = *resource_version;

            debug!(
                key = %key,
                temperature = stored.status.temperature,
                resource_version = *resource_version,
                "Updated herbs status"
            );
        }

        Ok(stored.clone())
    }
}

#[async_trait]
impl HerbsWatch for InMemoryHerbsStore {
    async fn list(&self) -> Result<Vec<NamespacedName>> {
        Ok(self.state.read().await.objects.keys().cloned().collect())
    }

    fn subscribe(&self) -> WatchSubscription {
        self.bus.subscribe()
    }
}
