//! Single-page fetch: resolve the address, issue the request.

use std::sync::Arc;

use crate::error::Result;
use crate::resolver::AddressResolver;
use crate::transport::PageTransport;
use crate::types::{MediaKind, PageBody, PageIndex, ResourceKind};

use super::context::FetchOutcome;

/// Fetches individual listing pages.
///
/// Cheap to clone; every clone shares the same resolver and transport, and
/// fetches hold no mutable state so any number may run concurrently.
#[derive(Clone)]
pub struct PageFetcher {
    resolver: Arc<dyn AddressResolver>,
    transport: Arc<dyn PageTransport>,
}

impl PageFetcher {
    /// Create a fetcher from a resolver and a transport
    pub fn new(resolver: Arc<dyn AddressResolver>, transport: Arc<dyn PageTransport>) -> Self {
        Self {
            resolver,
            transport,
        }
    }

    /// Fetch one page, returning its body on success.
    ///
    /// The caller owns the returned body and releases it by dropping it.
    pub async fn fetch_page(
        &self,
        page: PageIndex,
        kind: ResourceKind,
        media: MediaKind,
    ) -> Result<PageBody> {
        let template = self.resolver.resolve(kind)?;
        let url = self.resolver.page_url(&template, page, media);
        tracing::debug!(%kind, %media, %page, %url, "Fetching page");
        self.transport.get(&url).await
    }

    /// Fetch one page and wrap the result as exactly one outcome.
    pub(super) async fn fetch(
        &self,
        page: PageIndex,
        kind: ResourceKind,
        media: MediaKind,
    ) -> FetchOutcome {
        match self.fetch_page(page, kind, media).await {
            Ok(body) => FetchOutcome::Fetched { page, body },
            Err(error) => FetchOutcome::Failed { page, error },
        }
    }
}
