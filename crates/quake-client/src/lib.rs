//! quake-client: HTTP transport for the quake provisioning API
//!
//! Provides [`HttpInventorySource`], the [`RemoteInventorySource`] used by
//! the inventory cache in production.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use quake_client::HttpInventorySource;
//! use quake_inventory::{FilterSet, ProviderContext};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = HttpInventorySource::new("https://quake.example.com/rest/v1", Duration::from_secs(30))?
//!     .with_token("secret");
//! let context = ProviderContext::configure(Arc::new(source)).await?;
//!
//! let gpu_images = context.images(&FilterSet::parse_all(["flavor=gpu"])?)?;
//! println!("{} gpu images", gpu_images.len());
//! # Ok(())
//! # }
//! ```
//!
//! [`RemoteInventorySource`]: quake_inventory::RemoteInventorySource

pub mod error;
pub mod http;

pub use error::{ClientError, Result};
pub use http::HttpInventorySource;
