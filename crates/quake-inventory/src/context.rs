//! Provider context
//!
//! Owns the inventory cache for one provider configuration and is passed
//! explicitly to every operation that needs it.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::cache::InventoryCache;
use crate::error::{FetchError, InventoryError};
use crate::filter::FilterSet;
use crate::query::QueryEngine;
use crate::source::RemoteInventorySource;
use crate::types::{InventorySnapshot, ResourceDescriptor, ResourceKind};

/// Mutations that change what the remote reports as available
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    SshKeyCreated,
    SshKeyDeleted,
    HostCreated,
    HostDeleted,
    VolumeCreated,
    VolumeDeleted,
    NetworkCreated,
    NetworkDeleted,
    ProjectCreated,
    ProjectDeleted,
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mutation::SshKeyCreated => "ssh_key created",
            Mutation::SshKeyDeleted => "ssh_key deleted",
            Mutation::HostCreated => "host created",
            Mutation::HostDeleted => "host deleted",
            Mutation::VolumeCreated => "volume created",
            Mutation::VolumeDeleted => "volume deleted",
            Mutation::NetworkCreated => "network created",
            Mutation::NetworkDeleted => "network deleted",
            Mutation::ProjectCreated => "project created",
            Mutation::ProjectDeleted => "project deleted",
        };
        f.write_str(s)
    }
}

/// Configured provider session
#[derive(Debug)]
pub struct ProviderContext {
    cache: InventoryCache,
    cancel: CancellationToken,
}

impl ProviderContext {
    /// Build the context and perform the mandatory first refresh
    ///
    /// # Errors
    /// A failed initial fetch aborts configuration and is returned as is.
    #[instrument(skip(source), fields(source = source.source_name()))]
    pub async fn configure(source: Arc<dyn RemoteInventorySource>) -> Result<Self, FetchError> {
        let context = Self {
            cache: InventoryCache::new(source),
            cancel: CancellationToken::new(),
        };

        if let Err(e) = context.cache.refresh(&context.cancel).await {
            error!(error = %e, "provider configuration aborted: inventory unavailable");
            return Err(e);
        }

        info!("provider configured");
        Ok(context)
    }

    /// Refresh after a successful remote mutation
    ///
    /// The mutation itself is not undone on failure; the error is returned so
    /// the caller can report that the cache is no longer current.
    ///
    /// # Errors
    /// Returns the refresh's `FetchError`.
    #[instrument(skip(self))]
    pub async fn after_mutation(&self, mutation: Mutation) -> Result<(), FetchError> {
        self.cache.refresh(&self.cancel).await.inspect_err(|e| {
            error!(%mutation, error = %e, "inventory is stale after mutation");
        })
    }

    /// Explicit refresh, racing against `cancel` and the context's own token
    ///
    /// # Errors
    /// Returns the refresh's `FetchError`.
    pub async fn refresh_with(&self, cancel: &CancellationToken) -> Result<(), FetchError> {
        let linked = self.cancel.child_token();
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(FetchError::Cancelled),
            result = self.cache.refresh(&linked) => result,
        }
    }

    /// Current snapshot
    ///
    /// # Errors
    /// Returns `Uninitialized` if no refresh ever succeeded.
    pub fn snapshot(&self) -> Result<Arc<InventorySnapshot>, InventoryError> {
        self.cache.read()
    }

    /// Query any kind
    ///
    /// # Errors
    /// Returns `InvalidFilter` for unknown attributes.
    pub fn query(
        &self,
        kind: ResourceKind,
        filters: &FilterSet,
    ) -> Result<Vec<ResourceDescriptor>, InventoryError> {
        QueryEngine::evaluate_cache(&self.cache, kind, filters)
    }

    /// Query available images
    ///
    /// # Errors
    /// Returns `InvalidFilter` for unknown attributes.
    pub fn images(&self, filters: &FilterSet) -> Result<Vec<ResourceDescriptor>, InventoryError> {
        self.query(ResourceKind::Image, filters)
    }

    /// Cache backing this context
    #[must_use]
    pub fn cache(&self) -> &InventoryCache {
        &self.cache
    }

    /// Abandon any in-flight refresh
    ///
    /// Permanent: later refreshes through this context fail with `Cancelled`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}
