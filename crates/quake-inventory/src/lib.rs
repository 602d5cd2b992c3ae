//! quake-inventory: available-resource cache and filter queries
//!
//! Keeps a snapshot of everything the quake provisioning API reports as
//! available (images, machine sizes, volume flavors, locations, ssh keys,
//! project limits) and answers filtered queries against it.

pub mod cache;
pub mod context;
pub mod error;
pub mod filter;
pub mod query;
pub mod source;
pub mod types;

pub use cache::InventoryCache;
pub use context::{Mutation, ProviderContext};
pub use error::{FetchError, InventoryError};
pub use filter::{FilterPredicate, FilterSet, MatchMode};
pub use query::QueryEngine;
pub use source::RemoteInventorySource;
pub use types::{
    AvailableResources, Image, InventorySnapshot, Location, MachineSize, ProjectLimits,
    ProjectUsage, ResourceDescriptor, ResourceKind, SshKey, VolumeFlavor,
};
