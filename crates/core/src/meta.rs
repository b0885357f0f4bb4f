//! Object identity and metadata.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::{Error, Result};

/// Namespace used when an identity omits one.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Namespace-qualified object name.
///
/// This is the identity the dispatcher hands to the reconciler. It is
/// assigned by whoever creates the object and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NamespacedName {
    pub namespace: String,
    pub name: String,
}

impl NamespacedName {
    /// Create a new namespaced name.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for NamespacedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for NamespacedName {
    type Err = Error;

    /// Parse `namespace/name`, or a bare `name` in the default namespace.
    fn from_str(input: &str) -> Result<Self> {
        let mut parts = input.split('/');
        let (namespace, name) = match (parts.next(), parts.next(), parts.next()) {
            (Some(name), None, None) => (DEFAULT_NAMESPACE, name),
            (Some(namespace), Some(name), None) => (namespace, name),
            _ => return Err(Error::invalid_name(input, "too many separators")),
        };

        if namespace.is_empty() {
            return Err(Error::invalid_name(input, "namespace is empty"));
        }
        if name.is_empty() {
            return Err(Error::invalid_name(input, "name is empty"));
        }

        Ok(Self::new(namespace, name))
    }
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

/// Standard object metadata.
///
/// `generation` and `resource_version` belong to the store: the generation
/// moves only when the desired state changes, the resource version moves on
/// every persisted write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,

    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<Ulid>,

    #[serde(default)]
    pub generation: i64,

    #[serde(default)]
    pub resource_version: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
}

impl ObjectMeta {
    /// Create metadata for an object that has not been stored yet.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            uid: None,
            generation: 0,
            resource_version: 0,
            creation_timestamp: None,
        }
    }

    /// Identity of the object this metadata describes.
    pub fn key(&self) -> NamespacedName {
        NamespacedName::new(self.namespace.clone(), self.name.clone())
    }
}
