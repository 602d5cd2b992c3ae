//! Inventory type definitions

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::InventoryError;

// ============================================================================
// Resource kinds
// ============================================================================

/// Kind of resource the remote system advertises as available
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// OS image variant
    Image,
    /// Host class
    MachineSize,
    /// Volume flavor
    VolumeFlavor,
    /// Placement location
    Location,
    /// SSH key registered with the project
    SshKey,
}

impl ResourceKind {
    /// All kinds, in snapshot order
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Image,
        ResourceKind::MachineSize,
        ResourceKind::VolumeFlavor,
        ResourceKind::Location,
        ResourceKind::SshKey,
    ];

    /// Attribute names that can be filtered on for this kind
    #[must_use]
    pub fn attributes(self) -> &'static [&'static str] {
        match self {
            ResourceKind::Image => &["id", "flavor", "category", "version"],
            ResourceKind::MachineSize => &["id", "name", "details", "cpu_cores", "memory_gib"],
            ResourceKind::VolumeFlavor => &["id", "name", "description"],
            ResourceKind::Location => &["id", "country", "region", "data_center"],
            ResourceKind::SshKey => &["id", "name"],
        }
    }

    /// Whether `name` is an attribute of this kind
    #[must_use]
    pub fn has_attribute(self, name: &str) -> bool {
        self.attributes().contains(&name)
    }

    /// Canonical snake_case name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Image => "image",
            ResourceKind::MachineSize => "machine_size",
            ResourceKind::VolumeFlavor => "volume_flavor",
            ResourceKind::Location => "location",
            ResourceKind::SshKey => "ssh_key",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        let singular = normalized.strip_suffix('s').unwrap_or(&normalized);
        ResourceKind::ALL
            .into_iter()
            .find(|k| k.as_str() == normalized || k.as_str() == singular)
            .ok_or_else(|| InventoryError::UnknownKind(s.to_string()))
    }
}

// ============================================================================
// Descriptors
// ============================================================================

/// OS image variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Image ID
    pub id: String,
    /// Image flavor (e.g. `ubuntu`, `gpu`)
    pub flavor: String,
    /// Image category (e.g. `linux`, `compute`)
    pub category: String,
    /// Image version
    pub version: String,
}

/// Host class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSize {
    /// Machine size ID
    pub id: String,
    /// Display name
    pub name: String,
    /// Free-form hardware description
    #[serde(default)]
    pub details: String,
    /// CPU core count
    #[serde(default)]
    pub cpu_cores: u32,
    /// Memory in GiB
    #[serde(default)]
    pub memory_gib: u32,
}

/// Volume flavor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeFlavor {
    /// Volume flavor ID
    pub id: String,
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
}

/// Placement location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Location ID
    pub id: String,
    /// Country
    pub country: String,
    /// Region
    pub region: String,
    /// Data center
    #[serde(rename = "dataCenter", alias = "data_center")]
    pub data_center: String,
}

/// SSH key registered with the project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshKey {
    /// Key ID
    pub id: String,
    /// Key name
    pub name: String,
}

/// One available resource of any kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceDescriptor {
    Image(Image),
    MachineSize(MachineSize),
    VolumeFlavor(VolumeFlavor),
    Location(Location),
    SshKey(SshKey),
}

impl ResourceDescriptor {
    /// Kind of this descriptor
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceDescriptor::Image(_) => ResourceKind::Image,
            ResourceDescriptor::MachineSize(_) => ResourceKind::MachineSize,
            ResourceDescriptor::VolumeFlavor(_) => ResourceKind::VolumeFlavor,
            ResourceDescriptor::Location(_) => ResourceKind::Location,
            ResourceDescriptor::SshKey(_) => ResourceKind::SshKey,
        }
    }

    /// Identifier of this descriptor
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            ResourceDescriptor::Image(i) => &i.id,
            ResourceDescriptor::MachineSize(m) => &m.id,
            ResourceDescriptor::VolumeFlavor(v) => &v.id,
            ResourceDescriptor::Location(l) => &l.id,
            ResourceDescriptor::SshKey(k) => &k.id,
        }
    }

    /// Value of a named attribute
    ///
    /// Returns `None` only when `name` is not an attribute of this kind.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<Cow<'_, str>> {
        let value = match (self, name) {
            (_, "id") => Cow::Borrowed(self.id()),
            (ResourceDescriptor::Image(i), "flavor") => Cow::Borrowed(i.flavor.as_str()),
            (ResourceDescriptor::Image(i), "category") => Cow::Borrowed(i.category.as_str()),
            (ResourceDescriptor::Image(i), "version") => Cow::Borrowed(i.version.as_str()),
            (ResourceDescriptor::MachineSize(m), "name") => Cow::Borrowed(m.name.as_str()),
            (ResourceDescriptor::MachineSize(m), "details") => Cow::Borrowed(m.details.as_str()),
            (ResourceDescriptor::MachineSize(m), "cpu_cores") => Cow::Owned(m.cpu_cores.to_string()),
            (ResourceDescriptor::MachineSize(m), "memory_gib") => {
                Cow::Owned(m.memory_gib.to_string())
            }
            (ResourceDescriptor::VolumeFlavor(v), "name") => Cow::Borrowed(v.name.as_str()),
            (ResourceDescriptor::VolumeFlavor(v), "description") => {
                Cow::Borrowed(v.description.as_str())
            }
            (ResourceDescriptor::Location(l), "country") => Cow::Borrowed(l.country.as_str()),
            (ResourceDescriptor::Location(l), "region") => Cow::Borrowed(l.region.as_str()),
            (ResourceDescriptor::Location(l), "data_center") => {
                Cow::Borrowed(l.data_center.as_str())
            }
            (ResourceDescriptor::SshKey(k), "name") => Cow::Borrowed(k.name.as_str()),
            _ => return None,
        };
        Some(value)
    }

    /// All attributes as ordered name/value pairs
    #[must_use]
    pub fn attributes(&self) -> Vec<(&'static str, Cow<'_, str>)> {
        self.kind()
            .attributes()
            .iter()
            .filter_map(|name| self.attribute(name).map(|v| (*name, v)))
            .collect()
    }
}

// ============================================================================
// Wire payload
// ============================================================================

/// Capacity limits of the current project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectLimits {
    /// Maximum number of hosts
    pub hosts: Option<u32>,
    /// Maximum number of volumes
    pub volumes: Option<u32>,
    /// Total volume capacity in GiB
    #[serde(rename = "volumeCapacity", alias = "volume_capacity")]
    pub volume_capacity: Option<f64>,
    /// Maximum number of private networks
    #[serde(rename = "privateNetworks", alias = "private_networks")]
    pub private_networks: Option<u32>,
}

/// Resources the current project already consumes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectUsage {
    /// Hosts in use
    pub hosts: u32,
    /// Volumes in use
    pub volumes: u32,
    /// Allocated volume capacity in GiB
    #[serde(rename = "volumeCapacity", alias = "volume_capacity")]
    pub volume_capacity: f64,
    /// Private networks in use
    #[serde(rename = "privateNetworks", alias = "private_networks")]
    pub private_networks: u32,
}

/// Payload of one remote inventory fetch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvailableResources {
    pub images: Vec<Image>,
    #[serde(rename = "machineSizes", alias = "machine_sizes")]
    pub machine_sizes: Vec<MachineSize>,
    #[serde(rename = "volumeFlavors", alias = "volume_flavors")]
    pub volume_flavors: Vec<VolumeFlavor>,
    pub locations: Vec<Location>,
    #[serde(rename = "sshKeys", alias = "ssh_keys")]
    pub ssh_keys: Vec<SshKey>,
    pub limits: Option<ProjectLimits>,
    pub usage: Option<ProjectUsage>,
}

// ============================================================================
// Snapshot
// ============================================================================

/// Materialized view of a single remote inventory fetch
///
/// Built once from one [`AvailableResources`] payload and never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct InventorySnapshot {
    entries: BTreeMap<ResourceKind, Vec<ResourceDescriptor>>,
    limits: Option<ProjectLimits>,
    usage: Option<ProjectUsage>,
    generation: u64,
    fetched_at: DateTime<Utc>,
}

impl InventorySnapshot {
    /// Build a snapshot from a fetched payload
    #[must_use]
    pub fn from_payload(payload: AvailableResources, generation: u64) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            ResourceKind::Image,
            payload.images.into_iter().map(ResourceDescriptor::Image).collect(),
        );
        entries.insert(
            ResourceKind::MachineSize,
            payload
                .machine_sizes
                .into_iter()
                .map(ResourceDescriptor::MachineSize)
                .collect(),
        );
        entries.insert(
            ResourceKind::VolumeFlavor,
            payload
                .volume_flavors
                .into_iter()
                .map(ResourceDescriptor::VolumeFlavor)
                .collect(),
        );
        entries.insert(
            ResourceKind::Location,
            payload.locations.into_iter().map(ResourceDescriptor::Location).collect(),
        );
        entries.insert(
            ResourceKind::SshKey,
            payload.ssh_keys.into_iter().map(ResourceDescriptor::SshKey).collect(),
        );

        Self {
            entries,
            limits: payload.limits,
            usage: payload.usage,
            generation,
            fetched_at: Utc::now(),
        }
    }

    /// Descriptors of one kind, in the order the remote reported them
    #[must_use]
    pub fn entries(&self, kind: ResourceKind) -> &[ResourceDescriptor] {
        self.entries.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of descriptors of one kind
    #[must_use]
    pub fn len(&self, kind: ResourceKind) -> usize {
        self.entries(kind).len()
    }

    /// Check if the snapshot holds no descriptors at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }

    /// Descriptor count per kind
    #[must_use]
    pub fn counts(&self) -> BTreeMap<ResourceKind, usize> {
        ResourceKind::ALL.into_iter().map(|k| (k, self.len(k))).collect()
    }

    /// Project limits, if the remote reported them
    #[must_use]
    pub fn limits(&self) -> Option<&ProjectLimits> {
        self.limits.as_ref()
    }

    /// Project usage, if the remote reported it
    #[must_use]
    pub fn usage(&self) -> Option<&ProjectUsage> {
        self.usage.as_ref()
    }

    /// Refresh sequence number that produced this snapshot
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// When the payload was installed
    #[must_use]
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Compare descriptor sets, limits and usage, ignoring generation and timestamp
    #[must_use]
    pub fn same_contents(&self, other: &InventorySnapshot) -> bool {
        self.entries == other.entries && self.limits == other.limits && self.usage == other.usage
    }
}
