//! Core types and events for paged-fetch

use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::pin::Pin;

use crate::error::{Error, Result};

/// Owned, readable page content positioned at the start of the body.
///
/// Dropping the body releases the underlying connection or file handle.
pub type PageBody = Pin<Box<dyn tokio::io::AsyncRead + Send>>;

/// 1-based position of a page in a paginated listing
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PageIndex(NonZeroU32);

impl PageIndex {
    /// The probe page
    pub const FIRST: PageIndex = PageIndex(NonZeroU32::MIN);

    /// Create a page index, rejecting 0
    pub fn new(page: u32) -> Result<Self> {
        NonZeroU32::new(page).map(Self).ok_or(Error::InvalidPage(page))
    }

    /// Get the inner value
    pub fn get(&self) -> u32 {
        self.0.get()
    }

    /// Store key for this page (its decimal form)
    pub fn key(&self) -> String {
        self.0.to_string()
    }

    /// The following page, or `None` on overflow
    pub fn next(&self) -> Option<PageIndex> {
        self.0.checked_add(1).map(Self)
    }
}

impl std::fmt::Display for PageIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PageIndex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let n: u32 = s
            .parse()
            .map_err(|_| Error::Decode(format!("not a page index: {s:?}")))?;
        Self::new(n)
    }
}

/// Total number of pages in a listing, known only after the probe
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCount(NonZeroU32);

impl PageCount {
    /// Create a page count, rejecting 0
    pub fn new(count: u32) -> Result<Self> {
        NonZeroU32::new(count)
            .map(Self)
            .ok_or_else(|| Error::Decode("total page count must be at least 1".to_string()))
    }

    /// Get the inner value
    pub fn get(&self) -> u32 {
        self.0.get()
    }

    /// Index of the last page
    pub fn last_page(&self) -> PageIndex {
        PageIndex(self.0)
    }
}

impl std::fmt::Display for PageCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of remote resource being listed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// Public store catalog
    StoreProducts,
    /// Products owned by the signed-in account
    AccountProducts,
    /// The account's wishlist
    Wishlist,
    /// Per-product detail documents (not a paginated listing)
    Details,
    /// Per-product API documents (not a paginated listing)
    ApiProducts,
}

impl ResourceKind {
    /// All resource kinds
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::StoreProducts,
        ResourceKind::AccountProducts,
        ResourceKind::Wishlist,
        ResourceKind::Details,
        ResourceKind::ApiProducts,
    ];

    /// Stable name, also used as the store directory name
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::StoreProducts => "store-products",
            ResourceKind::AccountProducts => "account-products",
            ResourceKind::Wishlist => "wishlist",
            ResourceKind::Details => "details",
            ResourceKind::ApiProducts => "api-products",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| Error::config(format!("unknown resource kind {s:?}"), "resource_kind"))
    }
}

/// Media filter applied to a listing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Games
    #[default]
    Game,
    /// Movies
    Movie,
}

impl MediaKind {
    /// Stable name, also used as the store directory name
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Game => "game",
            MediaKind::Movie => "movie",
        }
    }

    /// Numeric media type used by account-scoped listings
    pub fn numeric_code(&self) -> u8 {
        match self {
            MediaKind::Game => 1,
            MediaKind::Movie => 2,
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MediaKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "game" => Ok(MediaKind::Game),
            "movie" => Ok(MediaKind::Movie),
            other => Err(Error::config(
                format!("unknown media kind {other:?}"),
                "media_kind",
            )),
        }
    }
}

/// Pagination run state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing started yet
    Idle,
    /// Fetching page 1 alone
    Probing,
    /// Total page count known
    ProbeDecoded,
    /// Fanning out over the remaining pages
    FullFetch,
    /// All pages stored
    Done,
    /// Terminated by an error
    Failed,
}

/// Events emitted during a pagination run
///
/// Subscribe via [`Paginator::subscribe`](crate::Paginator::subscribe).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Run moved to a new phase
    PhaseChanged {
        /// Resource being listed
        kind: ResourceKind,
        /// Media filter
        media: MediaKind,
        /// New phase
        phase: Phase,
    },

    /// The probe page revealed the total page count
    TotalPagesDiscovered {
        /// Resource being listed
        kind: ResourceKind,
        /// Media filter
        media: MediaKind,
        /// Total number of pages
        total: PageCount,
    },

    /// A fetch for this page was dispatched
    PageScheduled {
        /// Resource being listed
        kind: ResourceKind,
        /// Page index
        page: PageIndex,
    },

    /// This page was written to the store
    PageStored {
        /// Resource being listed
        kind: ResourceKind,
        /// Page index
        page: PageIndex,
        /// Bytes written
        bytes: u64,
    },

    /// A page failed and the run is terminating
    PageFailed {
        /// Resource being listed
        kind: ResourceKind,
        /// Page index, if the failure is tied to one
        #[serde(skip_serializing_if = "Option::is_none")]
        page: Option<PageIndex>,
        /// Error message
        error: String,
    },
}

/// Outcome of a successful run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchSummary {
    /// Resource that was listed
    pub kind: ResourceKind,
    /// Media filter
    pub media: MediaKind,
    /// Total number of pages
    pub total_pages: PageCount,
    /// Number of page requests issued, including the probe
    pub requests: u32,
}
