//! The `Herbs` resource: desired plant, observed temperature, conditions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::condition::{find_status_condition, Condition, READY, TEMP_READY};
use crate::error::{Error, Result};
use crate::meta::{NamespacedName, ObjectMeta};

/// API group and version of the resource.
pub const API_VERSION: &str = "hydroculture.containerdays.io/v1";

/// Kind of a single object.
pub const KIND: &str = "Herbs";

/// Kind of a list of objects.
pub const LIST_KIND: &str = "HerbsList";

/// Supported plants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plant {
    Basil,
    Lettuce,
    Spinach,
}

impl Plant {
    /// Every supported plant.
    pub const ALL: [Self; 3] = [Self::Basil, Self::Lettuce, Self::Spinach];

    /// Ideal growing temperature in degrees Celsius.
    pub const fn ideal_temperature(self) -> i32 {
        match self {
            Self::Basil => 24,
            Self::Lettuce => 20,
            Self::Spinach => 18,
        }
    }

    /// Get the name used in the desired state.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basil => "basil",
            Self::Lettuce => "lettuce",
            Self::Spinach => "spinach",
        }
    }
}

impl fmt::Display for Plant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|plant| plant.as_str() == s)
            .ok_or_else(|| Error::unknown_plant(s))
    }
}

/// Look up the ideal temperature for a plant name.
///
/// Returns `None` for names outside the enumeration. Callers must treat that
/// as an error rather than defaulting to zero.
pub fn ideal_temperature(plant: &str) -> Option<i32> {
    plant.parse::<Plant>().ok().map(Plant::ideal_temperature)
}

/// Desired state of a `Herbs` object.
///
/// The plant is kept as text: schema validation happens upstream, and the
/// reconciler still has to cope with a value it does not recognize.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HerbsSpec {
    #[serde(default)]
    pub plant: String,
}

const fn is_zero(value: &i32) -> bool {
    *value == 0
}

/// Observed state of a `Herbs` object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HerbsStatus {
    /// Last temperature read from the sensor record.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub temperature: i32,

    /// Conditions keyed by type.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

fn default_api_version() -> String {
    API_VERSION.to_string()
}

fn default_kind() -> String {
    KIND.to_string()
}

fn default_list_kind() -> String {
    LIST_KIND.to_string()
}

/// A managed plant environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Herbs {
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_kind")]
    pub kind: String,

    pub metadata: ObjectMeta,

    pub spec: HerbsSpec,

    #[serde(default)]
    pub status: HerbsStatus,
}

impl Herbs {
    /// Create a new object declaring the given plant.
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        plant: impl Into<String>,
    ) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            metadata: ObjectMeta::new(namespace, name),
            spec: HerbsSpec {
                plant: plant.into(),
            },
            status: HerbsStatus::default(),
        }
    }

    /// Identity of this object.
    pub fn key(&self) -> NamespacedName {
        self.metadata.key()
    }

    /// Columns shown when listing objects.
    pub fn print_row(&self) -> PrintRow {
        let status_of = |type_: &str| {
            find_status_condition(&self.status.conditions, type_)
                .map(|c| c.status.to_string())
                .unwrap_or_default()
        };

        PrintRow {
            name: self.metadata.name.clone(),
            plant: self.spec.plant.clone(),
            temperature: self.status.temperature,
            temp_ready: status_of(TEMP_READY),
            ready: status_of(READY),
        }
    }
}

/// A list of `Herbs` objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HerbsList {
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_list_kind")]
    pub kind: String,

    #[serde(default)]
    pub items: Vec<Herbs>,
}

impl HerbsList {
    /// Wrap a set of objects.
    pub fn new(items: Vec<Herbs>) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_list_kind(),
            items,
        }
    }
}

/// One printed line for a `Herbs` object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintRow {
    pub name: String,
    pub plant: String,
    pub temperature: i32,
    pub temp_ready: String,
    pub ready: String,
}

impl PrintRow {
    /// Column headers, in the order of [`PrintRow::cells`].
    pub const HEADERS: [&'static str; 5] = ["NAME", "PLANT", "TEMPERATURE", "TEMPREADY", "READY"];

    /// Cell values for this row.
    pub fn cells(&self) -> [String; 5] {
        [
            self.name.clone(),
            self.plant.clone(),
            self.temperature.to_string(),
            self.temp_ready.clone(),
            self.ready.clone(),
        ]
    }
}
