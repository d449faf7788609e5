//! Batch orchestration.
//!
//! Tracks every submitted image, keeps each one compressed for the current
//! tier, and hands results to a [`DeliverySink`]. Runs execute concurrently
//! on the tokio blocking pool; all state changes happen on the orchestrator.
//!
//! ```ignore
//! use pressjpg_core::batch::{MemorySink, Orchestrator};
//! use pressjpg_core::{CompressorConfig, SourceImage, Tier};
//!
//! let sink = MemorySink::new();
//! let mut batch = Orchestrator::new(CompressorConfig::default(), sink.clone())?;
//! batch.submit(vec![SourceImage::new("cat.png", "image/png", bytes)]);
//! batch.set_tier(Tier::Small);
//! batch.settle().await;
//! ```

mod delivery;
mod event;
mod item;
mod orchestrator;

pub use delivery::{Delivery, DeliverySink, MemorySink};
pub use event::{EngineEvent, EventKind};
pub use item::{BatchProgress, ItemId, ItemResult, ItemSnapshot, ItemStatus};
pub use orchestrator::{DownloadError, Orchestrator, OrchestratorError, SubmitReport};
