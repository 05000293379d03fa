//! Single writer into the page store, tracking which pages are still pending.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::Result;
use crate::store::PageStore;
use crate::types::{Event, PageBody, PageIndex};

use super::context::RunContext;

/// Stores fetched pages and tracks the pending set for one dispatcher pass.
///
/// Only the dispatcher's own loop calls [`Collector::collect`], so store
/// writes are serialized without locking.
///
/// The pending set is kept as the lowest unstored page plus the pages stored
/// ahead of it. Pages arrive at most one budget ahead of that mark, so memory
/// stays bounded by the concurrency no matter how many pages the listing
/// claims to have.
pub(super) struct Collector {
    store: Arc<dyn PageStore>,
    /// One past the last page of the range
    end: u64,
    /// Every page below this one is stored
    next_unstored: u64,
    /// Stored pages above `next_unstored`
    ahead: BTreeSet<u64>,
}

impl Collector {
    /// Collector expecting every page in `first..=last`.
    pub(super) fn new(store: Arc<dyn PageStore>, first: PageIndex, last: PageIndex) -> Self {
        let next_unstored = u64::from(first.get());
        let end = u64::from(last.get()).max(next_unstored - 1) + 1;
        Self {
            store,
            end,
            next_unstored,
            ahead: BTreeSet::new(),
        }
    }

    /// Write one page under its decimal key, then drop the body.
    pub(super) async fn collect(
        &mut self,
        ctx: &RunContext,
        page: PageIndex,
        body: PageBody,
    ) -> Result<u64> {
        let bytes = self.store.put(&page.key(), body).await?;
        self.mark_stored(page);

        tracing::debug!(kind = %ctx.kind, %page, bytes, remaining = self.remaining(), "Stored page");
        ctx.emit(Event::PageStored {
            kind: ctx.kind,
            page,
            bytes,
        });
        Ok(bytes)
    }

    fn mark_stored(&mut self, page: PageIndex) {
        let n = u64::from(page.get());
        if n < self.next_unstored || n >= self.end {
            return;
        }
        if n != self.next_unstored {
            self.ahead.insert(n);
            return;
        }
        self.next_unstored += 1;
        while self.ahead.remove(&self.next_unstored) {
            self.next_unstored += 1;
        }
    }

    /// Number of pages not yet stored
    pub(super) fn remaining(&self) -> u64 {
        self.end - self.next_unstored - self.ahead.len() as u64
    }

    /// Whether `page` is in range and not yet stored
    #[cfg(test)]
    pub(super) fn is_pending(&self, page: PageIndex) -> bool {
        let n = u64::from(page.get());
        n >= self.next_unstored && n < self.end && !self.ahead.contains(&n)
    }
}
