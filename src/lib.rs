//! # paged-fetch
//!
//! Fetches every page of a paginated remote listing into a local
//! key-addressed store.
//!
//! ## How a run works
//!
//! - **Probe** - page 1 is fetched alone and stored, then read back to learn
//!   the total page count
//! - **Fan-out** - the remaining pages are fetched with bounded concurrency;
//!   each completed page admits one more fetch
//! - **Single writer** - all store writes happen on the coordinating task, in
//!   arrival order, under the page's decimal key
//! - **First error wins** - any failure cancels outstanding fetches and ends
//!   the run; pages already stored are kept
//!
//! ## Quick Start
//!
//! ```no_run
//! use paged_fetch::{Config, MediaKind, Paginator, ResourceKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.storage.store_root = "pages".into();
//!
//!     let paginator = Paginator::new(config)?;
//!
//!     let mut events = paginator.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let summary = paginator
//!         .fetch_all_pages(ResourceKind::StoreProducts, MediaKind::Game)
//!         .await?;
//!     println!("{} pages stored", summary.total_pages);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Total page count decoding
pub mod decode;
/// Error types
pub mod error;
/// Two-phase pagination engine
pub mod pagination;
/// Listing address resolution
pub mod resolver;
/// Key-addressed page storage
pub mod store;
/// HTTP page transport
pub mod transport;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{Config, FetchConfig, HttpConfig, StorageConfig};
pub use decode::{JsonTotalPages, PageCountDecoder};
pub use error::{Error, Result};
pub use pagination::{PageFetcher, Paginator, PaginatorBuilder, fetch_all_pages};
pub use resolver::{AddressResolver, MediaParam, PageUrlTemplate, UrlResolver};
pub use store::{LocalStore, LocalStoreProvider, PageStore, StoreProvider};
pub use transport::{HttpTransport, PageTransport};
pub use types::{
    Event, FetchSummary, MediaKind, PageBody, PageCount, PageIndex, Phase, ResourceKind,
};
