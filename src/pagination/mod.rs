//! Two-phase pagination engine -- probe for the page count, then fan out.
//!
//! Split into focused submodules:
//! - [`context`] - Per-run shared state and the fetch outcome message
//! - [`fetcher`] - One network fetch for one page
//! - [`dispatcher`] - Bounded fan-out loop over a page range
//! - [`collector`] - Single writer into the page store
//! - [`controller`] - Probe / decode / fan-out state machine

mod collector;
mod context;
mod controller;
mod dispatcher;
mod fetcher;


pub use controller::{Paginator, PaginatorBuilder, fetch_all_pages};
pub use fetcher::PageFetcher;
