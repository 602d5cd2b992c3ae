//! Process-wide inventory cache
//!
//! Holds exactly one [`InventorySnapshot`] handle. Refresh builds a complete
//! replacement off-lock and publishes it with a single pointer swap, so a
//! reader either sees the old snapshot or the new one, never a mix.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::{FetchError, InventoryError};
use crate::source::RemoteInventorySource;
use crate::types::InventorySnapshot;

/// Inventory cache
///
/// Starts unrefreshed; [`InventoryCache::read`] fails with
/// [`InventoryError::Uninitialized`] until the first successful refresh.
pub struct InventoryCache {
    /// Remote source queried on refresh
    source: Arc<dyn RemoteInventorySource>,
    /// Currently published snapshot
    current: RwLock<Option<Arc<InventorySnapshot>>>,
    /// Last refresh ticket handed out
    tickets: AtomicU64,
}

impl InventoryCache {
    /// Create an unrefreshed cache over `source`
    pub fn new(source: Arc<dyn RemoteInventorySource>) -> Self {
        Self {
            source,
            current: RwLock::new(None),
            tickets: AtomicU64::new(0),
        }
    }

    /// Fetch from the source and publish the result
    ///
    /// On failure the installed snapshot is left untouched. No retries are
    /// attempted. Cancelling `cancel` abandons the in-flight fetch.
    ///
    /// A fetch that started before the currently installed snapshot's fetch
    /// is discarded instead of published.
    ///
    /// # Errors
    /// Returns the source's `FetchError`, or `FetchError::Cancelled`.
    #[instrument(skip(self, cancel), fields(source = self.source.source_name()))]
    pub async fn refresh(&self, cancel: &CancellationToken) -> Result<(), FetchError> {
        let ticket = self.tickets.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(ticket, "refreshing inventory");

        let payload = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                warn!(ticket, "inventory refresh cancelled");
                return Err(FetchError::Cancelled);
            }
            result = self.source.fetch() => match result {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(ticket, error = %e, "inventory refresh failed, keeping previous snapshot");
                    return Err(e);
                }
            },
        };

        let snapshot = Arc::new(InventorySnapshot::from_payload(payload, ticket));

        let mut current = self.current.write();
        if let Some(installed) = current.as_ref()
            && installed.generation() > ticket
        {
            warn!(
                ticket,
                installed = installed.generation(),
                "discarding stale inventory fetch"
            );
            return Ok(());
        }
        *current = Some(snapshot);
        drop(current);

        info!(generation = ticket, "inventory snapshot published");
        Ok(())
    }

    /// Current snapshot
    ///
    /// Holds the lock only long enough to clone the handle. The returned
    /// snapshot stays valid across later refreshes.
    ///
    /// # Errors
    /// Returns `Uninitialized` before the first successful refresh.
    pub fn read(&self) -> Result<Arc<InventorySnapshot>, InventoryError> {
        self.current.read().clone().ok_or(InventoryError::Uninitialized)
    }

    /// Check if a snapshot has been published
    #[must_use]
    pub fn is_populated(&self) -> bool {
        self.current.read().is_some()
    }

    /// Generation of the published snapshot, if any
    #[must_use]
    pub fn generation(&self) -> Option<u64> {
        self.current.read().as_ref().map(|s| s.generation())
    }

    /// Name of the backing source
    #[must_use]
    pub fn source_name(&self) -> &'static str {
        self.source.source_name()
    }
}

impl std::fmt::Debug for InventoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryCache")
            .field("source", &self.source.source_name())
            .field("generation", &self.generation())
            .finish()
    }
}
