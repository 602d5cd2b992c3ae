//! Query evaluation against inventory snapshots

use tracing::{debug, instrument};

use crate::cache::InventoryCache;
use crate::error::InventoryError;
use crate::filter::{FilterSet, matches_groups};
use crate::types::{InventorySnapshot, ResourceDescriptor, ResourceKind};

/// Evaluates filter sets against snapshots
///
/// Stateless; results keep the snapshot's ordering.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryEngine;

impl QueryEngine {
    /// Select the descriptors of `kind` that match `filters`
    ///
    /// # Errors
    /// Returns `InvalidFilter` if a predicate names an attribute `kind` does
    /// not define. Validation happens before any matching.
    #[instrument(skip(snapshot, filters), fields(generation = snapshot.generation(), predicates = filters.predicates().len()))]
    pub fn evaluate<'a>(
        snapshot: &'a InventorySnapshot,
        kind: ResourceKind,
        filters: &FilterSet,
    ) -> Result<Vec<&'a ResourceDescriptor>, InventoryError> {
        filters.validate(kind)?;

        let entries = snapshot.entries(kind);
        if filters.is_empty() {
            return Ok(entries.iter().collect());
        }

        let groups = filters.groups();
        let matched: Vec<&ResourceDescriptor> = entries
            .iter()
            .filter(|d| matches_groups(&groups, d))
            .collect();

        debug!(total = entries.len(), matched = matched.len(), "query evaluated");

        Ok(matched)
    }

    /// Read the cache and evaluate in one step
    ///
    /// # Errors
    /// Returns `Uninitialized` if the cache was never refreshed, or any
    /// error from [`QueryEngine::evaluate`].
    pub fn evaluate_cache(
        cache: &InventoryCache,
        kind: ResourceKind,
        filters: &FilterSet,
    ) -> Result<Vec<ResourceDescriptor>, InventoryError> {
        let snapshot = cache.read()?;
        let matched = Self::evaluate(&snapshot, kind, filters)?;
        Ok(matched.into_iter().cloned().collect())
    }
}
