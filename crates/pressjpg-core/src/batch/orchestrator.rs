//! The batch orchestrator.
//!
//! Owns every [`Item`] and is the only code that mutates them. Compression
//! runs execute on the tokio blocking pool and report back over an unbounded
//! channel; the orchestrator applies those reports when the embedding loop
//! calls [`Orchestrator::next_update`], [`Orchestrator::settle`] or
//! [`Orchestrator::try_drain`].
//!
//! Each run is tagged with the item's generation at dispatch. Changing the
//! tier bumps every item's generation, so reports from superseded runs (and
//! from removed items) are dropped on arrival.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::runtime::{Handle, TryCurrentError};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, trace, warn};

use crate::codec::{DefaultHeicConverter, HeicConverter, ImageCodec, NativeCodec};
use crate::config::CompressorConfig;
use crate::engine::{CompressedImage, CompressionEngine, EngineError, PROGRESS_DONE};
use crate::source::{SourceImage, ValidationError};
use crate::tier::Tier;

use super::delivery::DeliverySink;
use super::event::{EngineEvent, EventKind};
use super::item::{BatchProgress, Item, ItemId, ItemResult, ItemSnapshot, ItemStatus};

/// Outcome of [`Orchestrator::submit`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitReport {
    /// Ids of the files that were queued, in submission order.
    pub accepted: Vec<ItemId>,
    /// One entry per file that was turned away.
    pub rejected: Vec<ValidationError>,
}

/// Why "download all" refused to deliver anything.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownloadError {
    #[error("Not ready to download: {running} still compressing, {failed} failed")]
    NotReady { running: usize, failed: usize },

    #[error("Nothing to download")]
    Empty,
}

/// Why an orchestrator could not be built.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("No tokio runtime to run compressions on: {0}")]
    NoRuntime(#[from] TryCurrentError),
}

/// Tracks a batch of images and keeps every one compressed for the current
/// tier.
pub struct Orchestrator<C = NativeCodec, H = DefaultHeicConverter> {
    engine: Arc<CompressionEngine<C, H>>,
    config: CompressorConfig,
    items: BTreeMap<ItemId, Item>,
    next_id: u64,
    /// Items already handed to the sink automatically.
    delivered: HashSet<ItemId>,
    events_tx: UnboundedSender<EngineEvent>,
    events_rx: UnboundedReceiver<EngineEvent>,
    sink: Arc<dyn DeliverySink>,
    runtime: Handle,
}

impl Orchestrator {
    /// Orchestrator over the native engine.
    ///
    /// # Errors
    ///
    /// `NoRuntime` when called outside a tokio runtime.
    pub fn new(
        config: CompressorConfig,
        sink: impl DeliverySink + 'static,
    ) -> Result<Self, OrchestratorError> {
        let engine = CompressionEngine::new().with_heic_quality(config.heic_quality());
        Self::with_engine(engine, config, sink)
    }
}

impl<C, H> Orchestrator<C, H>
where
    C: ImageCodec + Send + Sync + 'static,
    H: HeicConverter + Send + Sync + 'static,
{
    /// Orchestrator over a caller-built engine. The engine's HEIC quality is
    /// used as is.
    ///
    /// # Errors
    ///
    /// `NoRuntime` when called outside a tokio runtime.
    pub fn with_engine(
        engine: CompressionEngine<C, H>,
        config: CompressorConfig,
        sink: impl DeliverySink + 'static,
    ) -> Result<Self, OrchestratorError> {
        let runtime = Handle::try_current()?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Ok(Self {
            engine: Arc::new(engine),
            config,
            items: BTreeMap::new(),
            next_id: 1,
            delivered: HashSet::new(),
            events_tx,
            events_rx,
            sink: Arc::new(sink),
            runtime,
        })
    }

    /// Validate and queue files, starting a run for each accepted one at the
    /// current tier. Rejected files never reach the engine.
    pub fn submit<I>(&mut self, files: I) -> SubmitReport
    where
        I: IntoIterator<Item = SourceImage>,
    {
        let mut report = SubmitReport::default();
        for source in files {
            let format = match source.compression_format() {
                Ok(format) => format,
                Err(err) => {
                    warn!(name = source.name(), %err, "Rejected file");
                    report.rejected.push(err);
                    continue;
                }
            };

            let id = ItemId::new(self.next_id);
            self.next_id += 1;
            self.items
                .insert(id, Item::new(id, source, format, self.config.tier));
            self.start_run(id);
            report.accepted.push(id);
        }

        info!(
            accepted = report.accepted.len(),
            rejected = report.rejected.len(),
            tier = %self.config.tier,
            "Files submitted"
        );
        report
    }

    /// Switch tier and recompress every item. Returns false (and does
    /// nothing) when `tier` is already current.
    pub fn set_tier(&mut self, tier: Tier) -> bool {
        if tier == self.config.tier {
            return false;
        }
        info!(from = %self.config.tier, to = %tier, items = self.items.len(), "Tier changed");
        self.config.tier = tier;

        let ids: Vec<ItemId> = self.items.keys().copied().collect();
        for id in ids {
            self.start_run(id);
        }
        true
    }

    /// Drop an item. Any run still working on it finishes unobserved.
    pub fn remove(&mut self, id: ItemId) -> bool {
        self.delivered.remove(&id);
        match self.items.remove(&id) {
            Some(item) => {
                debug!(%id, name = item.source.name(), "Removed item");
                true
            }
            None => false,
        }
    }

    pub fn set_auto_download(&mut self, enabled: bool) {
        self.config.auto_download = enabled;
    }

    fn start_run(&mut self, id: ItemId) {
        let tier = self.config.tier;
        let Some(item) = self.items.get_mut(&id) else {
            return;
        };
        let generation = item.begin_run(tier);
        let bytes = item.source.shared_bytes();
        let format = item.format;
        debug!(%id, generation, %tier, %format, name = item.source.name(), "Starting run");

        let engine = Arc::clone(&self.engine);
        let events = self.events_tx.clone();
        let run = self.runtime.spawn_blocking(move || {
            let result = engine.compress(&bytes, format, tier, |percent| {
                // Send only fails once the orchestrator is gone
                let _ = events.send(EngineEvent::progress(id, generation, percent));
            });
            let _ = events.send(EngineEvent::finished(id, generation, result));
        });

        // A panicking run never reports, so report for it
        let events = self.events_tx.clone();
        self.runtime.spawn(async move {
            if let Err(err) = run.await {
                warn!(%id, generation, %err, "Compression run aborted");
                let aborted = Err(EngineError::Aborted(err.to_string()));
                let _ = events.send(EngineEvent::finished(id, generation, aborted));
            }
        });
    }

    /// The item if `generation` is its current run.
    fn current_run(&mut self, id: ItemId, generation: u64) -> Option<&mut Item> {
        match self.items.get_mut(&id) {
            Some(item) if item.generation == generation && item.status == ItemStatus::Running => {
                Some(item)
            }
            Some(item) => {
                trace!(%id, generation, current = item.generation, "Dropping stale event");
                None
            }
            None => {
                trace!(%id, generation, "Dropping event for removed item");
                None
            }
        }
    }

    /// Apply a progress report. Returns false when the report was stale.
    ///
    /// Progress never moves backwards within a run.
    pub fn on_engine_progress(&mut self, id: ItemId, generation: u64, percent: u8) -> bool {
        let Some(item) = self.current_run(id, generation) else {
            return false;
        };
        item.progress = item.progress.max(percent.min(PROGRESS_DONE));
        true
    }

    /// Apply a run's terminal result. Returns false when it was stale.
    pub fn on_engine_result(
        &mut self,
        id: ItemId,
        generation: u64,
        result: Result<CompressedImage, EngineError>,
    ) -> bool {
        let Some(item) = self.current_run(id, generation) else {
            return false;
        };

        match result {
            Ok(compressed) => {
                info!(
                    %id,
                    name = item.source.name(),
                    original = item.source.len(),
                    compressed = compressed.bytes.len(),
                    quality = %compressed.quality,
                    tier = %compressed.tier,
                    "Compressed"
                );
                item.progress = PROGRESS_DONE;
                item.status = ItemStatus::Succeeded;
                item.result = ItemResult::Success(compressed);
            }
            Err(err) => {
                warn!(%id, name = item.source.name(), kind = err.kind(), %err, "Compression failed");
                item.status = ItemStatus::Failed;
                item.result = ItemResult::Failure(err);
            }
        }

        self.auto_deliver(id);
        true
    }

    /// Hand a fresh success to the sink, at most once per item.
    fn auto_deliver(&mut self, id: ItemId) {
        if !self.config.auto_download || self.delivered.contains(&id) {
            return;
        }
        let Some(item) = self.items.get(&id) else {
            return;
        };
        let Some(compressed) = item.compressed() else {
            return;
        };
        let file_name = item.output_name();
        debug!(%id, file_name, "Auto-delivering");
        self.sink.deliver(&compressed.bytes, &file_name);
        self.delivered.insert(id);
    }

    fn apply(&mut self, event: EngineEvent) -> bool {
        match event.kind {
            EventKind::Progress(percent) => self.on_engine_progress(event.id, event.generation, percent),
            EventKind::Finished(result) => self.on_engine_result(event.id, event.generation, result),
        }
    }

    /// Wait for the next report that changes an item and return that item's
    /// id. Returns `None` once nothing is running.
    pub async fn next_update(&mut self) -> Option<ItemId> {
        while !self.is_settled() {
            let event = self.events_rx.recv().await?;
            let id = event.id;
            if self.apply(event) {
                return Some(id);
            }
        }
        None
    }

    /// Wait until every item has finished.
    pub async fn settle(&mut self) {
        while self.next_update().await.is_some() {}
    }

    /// Apply whatever reports have already arrived without waiting. Returns
    /// how many were received, stale ones included.
    pub fn try_drain(&mut self) -> usize {
        let mut received = 0;
        loop {
            match self.events_rx.try_recv() {
                Ok(event) => {
                    received += 1;
                    self.apply(event);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        received
    }

    /// Deliver every result in submission order, pausing between files.
    ///
    /// Refuses unless every item has succeeded.
    pub async fn download_all(&mut self) -> Result<usize, DownloadError> {
        let progress = self.progress();
        if progress.running > 0 || progress.failed > 0 {
            warn!(running = progress.running, failed = progress.failed, "Download all refused");
            return Err(DownloadError::NotReady {
                running: progress.running,
                failed: progress.failed,
            });
        }
        if self.items.is_empty() {
            return Err(DownloadError::Empty);
        }

        let stagger = self.config.download_stagger();
        let mut delivered = 0;
        for item in self.items.values() {
            let Some(compressed) = item.compressed() else {
                continue;
            };
            if delivered > 0 && !stagger.is_zero() {
                tokio::time::sleep(stagger).await;
            }
            self.sink.deliver(&compressed.bytes, &item.output_name());
            delivered += 1;
        }

        info!(delivered, "Downloaded all results");
        Ok(delivered)
    }
}

impl<C, H> Orchestrator<C, H> {
    pub fn tier(&self) -> Tier {
        self.config.tier
    }

    pub fn config(&self) -> &CompressorConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Views of every item, in submission order.
    pub fn snapshot(&self) -> Vec<ItemSnapshot> {
        self.items.values().map(Item::snapshot).collect()
    }

    pub fn item(&self, id: ItemId) -> Option<ItemSnapshot> {
        self.items.get(&id).map(Item::snapshot)
    }

    /// Compressed bytes of a succeeded item.
    pub fn result_bytes(&self, id: ItemId) -> Option<&[u8]> {
        self.items
            .get(&id)
            .and_then(Item::compressed)
            .map(|c| c.bytes.as_slice())
    }

    pub fn progress(&self) -> BatchProgress {
        BatchProgress::from_items(self.items.values())
    }

    /// True when no item is waiting on a run.
    pub fn is_settled(&self) -> bool {
        self.items.values().all(|item| item.status.is_finished())
    }
}

impl<C, H> fmt::Debug for Orchestrator<C, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("items", &self.items.len())
            .field("delivered", &self.delivered.len())
            .finish_non_exhaustive()
    }
}
