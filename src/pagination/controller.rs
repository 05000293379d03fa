//! Pagination controller -- probe, decode, fan out.
//!
//! Phases:
//! 1. `Probing`: open the store, fetch page 1 alone
//! 2. `ProbeDecoded`: read page 1 back and decode the total page count
//! 3. `FullFetch`: fetch the remaining pages at full concurrency
//! 4. `Done`, or `Failed` from any phase

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tokio::sync::broadcast;

use crate::config::Config;
use crate::decode::{JsonTotalPages, PageCountDecoder};
use crate::error::Result;
use crate::resolver::{AddressResolver, UrlResolver};
use crate::store::{LocalStoreProvider, PageStore, StoreProvider};
use crate::transport::{HttpTransport, PageTransport};
use crate::types::{Event, FetchSummary, MediaKind, PageCount, PageIndex, Phase, ResourceKind};

use super::collector::Collector;
use super::context::RunContext;
use super::dispatcher::dispatch;
use super::fetcher::PageFetcher;

/// Fetch every page of a listing with a caller-supplied HTTP client.
///
/// Uses the default resolver, local store and decoder from `config`. Success
/// means pages `1..=N` are all in the store.
///
/// # Example
///
/// ```no_run
/// use paged_fetch::{Config, MediaKind, ResourceKind, fetch_all_pages};
///
/// # async fn run() -> paged_fetch::Result<()> {
/// let client = reqwest::Client::new();
/// let summary = fetch_all_pages(
///     client,
///     &Config::default(),
///     ResourceKind::StoreProducts,
///     MediaKind::Game,
/// )
/// .await?;
/// println!("stored {} pages", summary.total_pages);
/// # Ok(())
/// # }
/// ```
pub async fn fetch_all_pages(
    client: reqwest::Client,
    config: &Config,
    kind: ResourceKind,
    media: MediaKind,
) -> Result<FetchSummary> {
    Paginator::builder(config.clone())
        .transport(Arc::new(HttpTransport::new(client)))
        .build()?
        .fetch_all_pages(kind, media)
        .await
}

/// Builder for [`Paginator`]; every collaborator defaults to the crate's own.
pub struct PaginatorBuilder {
    config: Config,
    resolver: Option<Arc<dyn AddressResolver>>,
    transport: Option<Arc<dyn PageTransport>>,
    stores: Option<Arc<dyn StoreProvider>>,
    decoder: Option<Arc<dyn PageCountDecoder>>,
}

impl PaginatorBuilder {
    /// Override address resolution
    pub fn resolver(mut self, resolver: Arc<dyn AddressResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Override the page transport
    pub fn transport(mut self, transport: Arc<dyn PageTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Override the page store
    pub fn stores(mut self, stores: Arc<dyn StoreProvider>) -> Self {
        self.stores = Some(stores);
        self
    }

    /// Override total page count decoding
    pub fn decoder(mut self, decoder: Arc<dyn PageCountDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Validate the configuration and build the paginator
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or the HTTP client cannot be created
    pub fn build(self) -> Result<Paginator> {
        self.config.validate()?;

        let resolver: Arc<dyn AddressResolver> = match self.resolver {
            Some(r) => r,
            None => Arc::new(UrlResolver::from_config(&self.config.http)?),
        };
        let transport: Arc<dyn PageTransport> = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::from_config(&self.config.http)?),
        };
        let stores: Arc<dyn StoreProvider> = self.stores.unwrap_or_else(|| {
            Arc::new(LocalStoreProvider::new(&self.config.storage.store_root))
        });
        let decoder: Arc<dyn PageCountDecoder> = self.decoder.unwrap_or_else(|| {
            Arc::new(JsonTotalPages::new(&self.config.fetch.total_pages_field))
        });

        let (event_tx, _) = broadcast::channel(self.config.fetch.event_buffer);

        Ok(Paginator {
            config: Arc::new(self.config),
            fetcher: PageFetcher::new(resolver, transport),
            stores,
            decoder,
            event_tx,
        })
    }
}

/// Fetches paginated listings into the page store.
///
/// Runs are independent; concurrent runs for different resource/media pairs
/// are fine, but two runs writing the same pair are not supported.
pub struct Paginator {
    config: Arc<Config>,
    fetcher: PageFetcher,
    stores: Arc<dyn StoreProvider>,
    decoder: Arc<dyn PageCountDecoder>,
    event_tx: broadcast::Sender<Event>,
}

impl Paginator {
    /// Paginator with default collaborators
    pub fn new(config: Config) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Start building a paginator with custom collaborators
    pub fn builder(config: Config) -> PaginatorBuilder {
        PaginatorBuilder {
            config,
            resolver: None,
            transport: None,
            stores: None,
            decoder: None,
        }
    }

    /// Subscribe to run events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Probe page 1 for the total page count, then fetch every page.
    pub async fn fetch_all_pages(
        &self,
        kind: ResourceKind,
        media: MediaKind,
    ) -> Result<FetchSummary> {
        let ctx = self.context(kind, media);
        let result = self.probe_and_fan_out(&ctx).await;
        self.finish(&ctx, result)
    }

    /// Fetch pages `1..=total` at full concurrency, skipping the probe.
    pub async fn fetch_known_pages(
        &self,
        kind: ResourceKind,
        media: MediaKind,
        total: PageCount,
    ) -> Result<FetchSummary> {
        let ctx = self.context(kind, media);
        let result = self.fan_out_known(&ctx, total).await;
        self.finish(&ctx, result)
    }

    fn context(&self, kind: ResourceKind, media: MediaKind) -> RunContext {
        RunContext {
            kind,
            media,
            fetcher: self.fetcher.clone(),
            event_tx: self.event_tx.clone(),
            failure_reported: AtomicBool::new(false),
        }
    }

    async fn probe_and_fan_out(&self, ctx: &RunContext) -> Result<FetchSummary> {
        let (kind, media) = (ctx.kind, ctx.media);

        set_phase(ctx, Phase::Probing);
        let store = self.stores.open(kind, media).await?;
        let mut probe = Collector::new(Arc::clone(&store), PageIndex::FIRST, PageIndex::FIRST);
        let mut requests =
            dispatch(ctx, &mut probe, PageIndex::FIRST, PageIndex::FIRST, 1).await?;

        let first_page = store.get(&PageIndex::FIRST.key()).await?;
        let total = self.decoder.decode(first_page).await?;
        tracing::info!(%kind, %media, total_pages = total.get(), "Discovered total page count");
        ctx.emit(Event::TotalPagesDiscovered { kind, media, total });
        set_phase(ctx, Phase::ProbeDecoded);

        set_phase(ctx, Phase::FullFetch);
        if total.get() > 1 {
            let first = if self.config.fetch.refetch_probe_page {
                Some(PageIndex::FIRST)
            } else {
                PageIndex::FIRST.next()
            };
            if let Some(first) = first {
                requests += self.fan_out(ctx, &store, first, total).await?;
            }
        }

        Ok(FetchSummary {
            kind,
            media,
            total_pages: total,
            requests,
        })
    }

    async fn fan_out_known(&self, ctx: &RunContext, total: PageCount) -> Result<FetchSummary> {
        let store = self.stores.open(ctx.kind, ctx.media).await?;
        set_phase(ctx, Phase::FullFetch);
        let requests = self.fan_out(ctx, &store, PageIndex::FIRST, total).await?;
        Ok(FetchSummary {
            kind: ctx.kind,
            media: ctx.media,
            total_pages: total,
            requests,
        })
    }

    async fn fan_out(
        &self,
        ctx: &RunContext,
        store: &Arc<dyn PageStore>,
        first: PageIndex,
        total: PageCount,
    ) -> Result<u32> {
        let last = total.last_page();
        let concurrency = self.config.fetch.concurrency;
        tracing::info!(
            kind = %ctx.kind,
            media = %ctx.media,
            first = %first,
            last = %last,
            concurrency,
            "Fetching pages"
        );
        let mut collector = Collector::new(Arc::clone(store), first, last);
        dispatch(ctx, &mut collector, first, last, concurrency).await
    }

    /// Single exit point for every run: log and report the outcome.
    fn finish(&self, ctx: &RunContext, result: Result<FetchSummary>) -> Result<FetchSummary> {
        match &result {
            Ok(summary) => {
                tracing::info!(
                    kind = %ctx.kind,
                    media = %ctx.media,
                    total_pages = summary.total_pages.get(),
                    requests = summary.requests,
                    "All pages stored"
                );
                set_phase(ctx, Phase::Done);
            }
            Err(e) => {
                tracing::error!(
                    kind = %ctx.kind,
                    media = %ctx.media,
                    error = %e,
                    "Pagination run failed"
                );
                ctx.report_failure(None, e);
                set_phase(ctx, Phase::Failed);
            }
        }
        result
    }
}

fn set_phase(ctx: &RunContext, phase: Phase) {
    tracing::debug!(kind = %ctx.kind, media = %ctx.media, ?phase, "Pagination phase");
    ctx.emit(Event::PhaseChanged {
        kind: ctx.kind,
        media: ctx.media,
        phase,
    });
}
