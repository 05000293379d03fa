//! Bounded fan-out over a page range.
//!
//! Up to `budget` fetches are launched, then the budget drops to zero and is
//! refilled one unit per page the collector stores. In-flight work therefore
//! never exceeds the initial budget, and every store write happens on this
//! loop.
//!
//! Workers report over a single channel whose capacity equals the budget, so
//! a send never waits for room. The first failure cancels the pass token;
//! workers still fetching drop out without sending, and any late send onto
//! the closed channel fails immediately and is discarded.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::types::{Event, PageIndex};

use super::collector::Collector;
use super::context::{FetchOutcome, RunContext};

/// Fetch and store every page in `first..=last` with at most `budget` fetches in flight.
///
/// Returns the number of fetches issued. On the first error the pass stops,
/// outstanding workers are cancelled, and the error is returned; pages already
/// stored stay stored.
pub(super) async fn dispatch(
    ctx: &RunContext,
    collector: &mut Collector,
    first: PageIndex,
    last: PageIndex,
    budget: usize,
) -> Result<u32> {
    let mut budget = budget.max(1);
    let (tx, mut rx) = mpsc::channel::<FetchOutcome>(budget);
    let cancel = CancellationToken::new();
    // Cancels workers on every exit path, including the caller dropping this future.
    let _cancel_on_exit = cancel.clone().drop_guard();

    let mut next_page = Some(first);
    let mut issued = 0u32;

    while collector.remaining() > 0 {
        for _ in 0..budget {
            let Some(page) = next_page.filter(|p| *p <= last) else {
                break;
            };
            spawn_fetch(ctx, page, tx.clone(), cancel.child_token());
            issued += 1;
            next_page = page.next();
        }
        budget = 0;

        // `tx` is held here, so the channel cannot close while we wait.
        let Some(outcome) = rx.recv().await else {
            return Err(Error::Cancelled);
        };

        match outcome {
            FetchOutcome::Fetched { page, body } => {
                if let Err(error) = collector.collect(ctx, page, body).await {
                    return Err(abort(ctx, &cancel, page, error));
                }
                budget += 1;
            }
            FetchOutcome::Failed { page, error } => {
                return Err(abort(ctx, &cancel, page, error));
            }
        }
    }

    Ok(issued)
}

/// Launch one worker for `page`.
fn spawn_fetch(
    ctx: &RunContext,
    page: PageIndex,
    tx: mpsc::Sender<FetchOutcome>,
    cancel: CancellationToken,
) {
    let fetcher = ctx.fetcher.clone();
    let (kind, media) = (ctx.kind, ctx.media);
    ctx.emit(Event::PageScheduled { kind, page });

    tokio::spawn(async move {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(%kind, %page, "Fetch cancelled");
                return;
            }
            outcome = fetcher.fetch(page, kind, media) => outcome,
        };

        if tx.send(outcome).await.is_err() {
            tracing::warn!(%kind, %page, "Pagination run already finished, discarding page");
        }
    });
}

/// Stop the pass: cancel outstanding workers and report the failure.
fn abort(
    ctx: &RunContext,
    cancel: &CancellationToken,
    page: PageIndex,
    error: Error,
) -> Error {
    cancel.cancel();
    ctx.report_failure(Some(page), &error);
    error
}
