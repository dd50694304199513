use std::time::Duration;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::AssetCache;
use crate::domain::{Asset, AssetId};
use crate::error::GalleryError;
use crate::indexer::{AccountIndexerClient, AssetStub};
use crate::metadata::MetadataClient;

/// Bounds the whole loading phase. Prefer showing partial data over an
/// indefinitely spinning consumer.
pub const SAFETY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Uninitialized,
    Loading,
    Ready,
    Refreshing,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub percent: u8,
    pub message: String,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct NullSink;

impl ProgressSink for NullSink {
    fn event(&self, _event: ProgressEvent) {}
}

/// Monotone progress: a reported percentage never decreases, whatever order
/// the underlying fetches settle in.
struct Reporter<'a> {
    sink: &'a dyn ProgressSink,
    last: u8,
}

impl<'a> Reporter<'a> {
    fn new(sink: &'a dyn ProgressSink) -> Self {
        Self { sink, last: 0 }
    }

    fn report(&mut self, percent: u8, message: impl Into<String>) {
        let percent = percent.min(100).max(self.last);
        self.last = percent;
        self.sink.event(ProgressEvent {
            percent,
            message: message.into(),
        });
    }
}

/// Aggregation orchestrator: lists the collection's assets, enriches each
/// one concurrently, and exposes the merged collection plus a coarse
/// progress indicator.
///
/// State machine: `Uninitialized -> Loading -> Ready`, with `Refreshing`
/// re-entered from `Ready` on an explicit cache-bypassing refresh. Every
/// fully-settled load writes the collection to the persistent cache as a
/// full replacement; listing failures and safety timeouts still end in
/// `Ready` (fail-open) but leave the cache untouched.
pub struct Orchestrator<L, M> {
    lister: L,
    metadata: M,
    cache: AssetCache,
    safety_timeout: Duration,
    state: PipelineState,
    assets: Vec<Asset>,
    progress: u8,
}

impl<L: AccountIndexerClient, M: MetadataClient> Orchestrator<L, M> {
    pub fn new(lister: L, metadata: M, cache: AssetCache) -> Self {
        Self {
            lister,
            metadata,
            cache,
            safety_timeout: SAFETY_TIMEOUT,
            state: PipelineState::Uninitialized,
            assets: Vec::new(),
            progress: 0,
        }
    }

    pub fn with_safety_timeout(mut self, timeout: Duration) -> Self {
        self.safety_timeout = timeout;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Immutable snapshot of the aggregated collection.
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn has_initial_load(&self) -> bool {
        self.cache.has_initial_load()
    }

    /// First transition out of `Uninitialized`. A fresh, non-empty cache
    /// entry short-circuits straight to `Ready` without touching the
    /// network.
    pub async fn start(&mut self, cancel: &CancellationToken, sink: &dyn ProgressSink) {
        if self.state != PipelineState::Uninitialized {
            debug!(state = ?self.state, "start ignored; pipeline already initialized");
            return;
        }

        if let Some(cached) = self.cache.get_fresh() {
            if !cached.is_empty() {
                info!(count = cached.len(), "serving asset collection from cache");
                self.assets = cached;
                self.state = PipelineState::Ready;
                self.progress = 100;
                let mut reporter = Reporter::new(sink);
                reporter.report(100, "loaded from cache");
                return;
            }
        }

        self.state = PipelineState::Loading;
        self.run(cancel, sink).await;
    }

    /// Cache-bypassing re-fetch. Previous data stays visible while the
    /// refresh is in flight; there is no flush-to-empty.
    pub async fn refresh(&mut self, cancel: &CancellationToken, sink: &dyn ProgressSink) {
        if self.state != PipelineState::Ready {
            warn!(state = ?self.state, "refresh ignored; pipeline not ready");
            return;
        }
        self.state = PipelineState::Refreshing;
        self.run(cancel, sink).await;
    }

    async fn run(&mut self, cancel: &CancellationToken, sink: &dyn ProgressSink) {
        let deadline = tokio::time::Instant::now() + self.safety_timeout;
        let mut reporter = Reporter::new(sink);

        enum Listing {
            Cancelled,
            TimedOut,
            Done(Result<Vec<AssetStub>, GalleryError>),
        }

        let listing = tokio::select! {
            _ = cancel.cancelled() => Listing::Cancelled,
            _ = tokio::time::sleep_until(deadline) => Listing::TimedOut,
            result = self.lister.list_created_assets() => Listing::Done(result),
        };
        let stubs = match listing {
            Listing::Cancelled => {
                debug!("load cancelled during asset listing");
                return;
            }
            Listing::TimedOut => {
                warn!("safety timeout elapsed during asset listing");
                self.finish(Vec::new(), false, &mut reporter);
                return;
            }
            Listing::Done(Err(err)) => {
                warn!(error = %err, "asset listing failed; degrading to empty collection");
                self.finish(Vec::new(), false, &mut reporter);
                return;
            }
            Listing::Done(Ok(stubs)) => stubs,
        };
        reporter.report(10, format!("listed {} assets", stubs.len()));

        if stubs.is_empty() {
            self.finish(Vec::new(), true, &mut reporter);
            return;
        }

        let total = stubs.len();
        reporter.report(50, format!("enriching {total} assets"));

        // Fan-out: every metadata future is created before any is awaited,
        // so aggregate latency tracks the slowest fetch. Results land in
        // index-addressed slots; the merged collection keeps listing order
        // no matter the settlement order.
        let mut slots: Vec<Option<Asset>> = vec![None; total];
        let mut complete = true;
        {
            let metadata = &self.metadata;
            let mut pending: FuturesUnordered<_> = stubs
                .iter()
                .enumerate()
                .map(|(idx, stub)| {
                    let id = AssetId::new(stub.index);
                    async move { (idx, metadata.fetch(id).await) }
                })
                .collect();

            let mut settled = 0usize;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("load cancelled during enrichment");
                        return;
                    }
                    _ = tokio::time::sleep_until(deadline) => {
                        warn!(settled, total, "safety timeout elapsed; continuing with partial data");
                        complete = false;
                        break;
                    }
                    next = pending.next() => match next {
                        Some((idx, Ok(asset))) => {
                            slots[idx] = Some(asset);
                            settled += 1;
                            reporter.report(
                                (50 + settled * 50 / total) as u8,
                                format!("enriched {settled}/{total}"),
                            );
                        }
                        Some((idx, Err(err))) => {
                            warn!(
                                asset = stubs[idx].index,
                                error = %err,
                                "metadata fetch failed; dropping asset"
                            );
                            settled += 1;
                            reporter.report(
                                (50 + settled * 50 / total) as u8,
                                format!("enriched {settled}/{total}"),
                            );
                        }
                        None => break,
                    }
                }
            }
        }

        if cancel.is_cancelled() {
            debug!("load cancelled; discarding settled results");
            return;
        }

        let assets: Vec<Asset> = slots.into_iter().flatten().collect();
        self.finish(assets, complete, &mut reporter);
    }

    fn finish(&mut self, assets: Vec<Asset>, fully_settled: bool, reporter: &mut Reporter<'_>) {
        if fully_settled {
            if let Err(err) = self.cache.set(&assets) {
                warn!(error = %err, "failed to write asset cache");
            }
            if let Err(err) = self.cache.mark_initial_load() {
                warn!(error = %err, "failed to write initial-load marker");
            }
        }
        info!(count = assets.len(), fully_settled, "asset collection ready");
        self.assets = assets;
        self.state = PipelineState::Ready;
        self.progress = 100;
        reporter.report(100, "ready");
    }
}
