//! Per-run shared state and the message workers send back to the dispatcher.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

use crate::error::Error;
use crate::types::{Event, MediaKind, PageBody, PageIndex, ResourceKind};

use super::fetcher::PageFetcher;

/// Result of one dispatched fetch, sent from a worker to the dispatcher.
pub(super) enum FetchOutcome {
    /// Response body ready to be stored
    Fetched { page: PageIndex, body: PageBody },
    /// The fetch failed; the run ends with this error
    Failed { page: PageIndex, error: Error },
}

/// Shared context for one pagination run, reducing parameter passing between phases.
pub(super) struct RunContext {
    pub(super) kind: ResourceKind,
    pub(super) media: MediaKind,
    pub(super) fetcher: PageFetcher,
    pub(super) event_tx: broadcast::Sender<Event>,
    pub(super) failure_reported: AtomicBool,
}

impl RunContext {
    /// Emit an event; having no subscribers is not an error.
    pub(super) fn emit(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Emit `PageFailed` for the run's first error only.
    pub(super) fn report_failure(&self, page: Option<PageIndex>, error: &Error) {
        if self.failure_reported.swap(true, Ordering::SeqCst) {
            return;
        }
        self.emit(Event::PageFailed {
            kind: self.kind,
            page,
            error: error.to_string(),
        });
    }
}
