//! Remote inventory source trait

use async_trait::async_trait;

use crate::error::FetchError;
use crate::types::AvailableResources;

/// Capability to fetch the full set of available resources
///
/// One call returns one complete payload. Implementations must not retry;
/// retry policy belongs to whoever triggered the refresh.
#[async_trait]
pub trait RemoteInventorySource: Send + Sync {
    async fn fetch(&self) -> Result<AvailableResources, FetchError>;

    fn source_name(&self) -> &'static str;
}
