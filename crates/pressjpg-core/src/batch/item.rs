//! Tracked items and the read-only views handed to the presentation layer.

use std::fmt;

use serde::Serialize;

use crate::engine::{savings_percent, CompressedImage, EngineError};
use crate::source::{output_file_name, ImageFormat, SourceImage};
use crate::tier::Tier;

/// Opaque handle for one tracked image. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Numeric value, for presentation layers that key on integers.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state of an item.
///
/// `Queued -> Running -> Succeeded | Failed`; finished items go back to
/// `Running` only when the tier changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl ItemStatus {
    /// True once the current run has produced a terminal result.
    pub fn is_finished(self) -> bool {
        matches!(self, ItemStatus::Succeeded | ItemStatus::Failed)
    }
}

/// Outcome of the item's current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemResult {
    Pending,
    Success(CompressedImage),
    Failure(EngineError),
}

/// One image's full state inside the batch.
#[derive(Debug)]
pub(crate) struct Item {
    pub(crate) id: ItemId,
    pub(crate) source: SourceImage,
    pub(crate) format: ImageFormat,
    pub(crate) is_heic_origin: bool,
    pub(crate) status: ItemStatus,
    pub(crate) progress: u8,
    pub(crate) result: ItemResult,
    /// Generation of the current run; events tagged otherwise are stale.
    pub(crate) generation: u64,
    /// Tier of the current run.
    pub(crate) tier: Tier,
}

impl Item {
    pub(crate) fn new(id: ItemId, source: SourceImage, format: ImageFormat, tier: Tier) -> Self {
        let is_heic_origin = source.is_heic();
        Self {
            id,
            source,
            format,
            is_heic_origin,
            status: ItemStatus::Queued,
            progress: 0,
            result: ItemResult::Pending,
            generation: 0,
            tier,
        }
    }

    /// Reset for a fresh run and return its generation.
    pub(crate) fn begin_run(&mut self, tier: Tier) -> u64 {
        self.generation += 1;
        self.tier = tier;
        self.progress = 0;
        self.result = ItemResult::Pending;
        self.status = ItemStatus::Running;
        self.generation
    }

    pub(crate) fn output_name(&self) -> String {
        output_file_name(self.source.name(), self.tier)
    }

    pub(crate) fn compressed(&self) -> Option<&CompressedImage> {
        match &self.result {
            ItemResult::Success(compressed) => Some(compressed),
            _ => None,
        }
    }

    pub(crate) fn snapshot(&self) -> ItemSnapshot {
        let original_size = self.source.len();
        let compressed = self.compressed();
        let error = match &self.result {
            ItemResult::Failure(err) => Some(err),
            _ => None,
        };

        ItemSnapshot {
            id: self.id,
            name: self.source.name().to_string(),
            status: self.status,
            progress: self.progress,
            tier: self.tier,
            is_heic_origin: self.is_heic_origin,
            original_size,
            compressed_size: compressed.map(|c| c.bytes.len()),
            quality: compressed.map(|c| c.quality.as_fraction()),
            savings_percent: compressed.and_then(|c| savings_percent(original_size, c.bytes.len())),
            error_kind: error.map(|e| e.kind().to_string()),
            error: error.map(ToString::to_string),
            output_name: self.output_name(),
        }
    }
}

/// Read-only view of one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSnapshot {
    pub id: ItemId,
    pub name: String,
    pub status: ItemStatus,
    pub progress: u8,
    pub tier: Tier,
    pub is_heic_origin: bool,
    pub original_size: usize,
    pub compressed_size: Option<usize>,
    pub quality: Option<f32>,
    pub savings_percent: Option<i64>,
    pub error_kind: Option<String>,
    pub error: Option<String>,
    /// File name the result is delivered under.
    pub output_name: String,
}

/// Aggregate progress across the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgress {
    pub total: usize,
    pub running: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Mean item progress, 0-100.
    pub percentage: u8,
}

impl BatchProgress {
    pub(crate) fn from_items<'a>(items: impl Iterator<Item = &'a Item>) -> Self {
        let mut progress = BatchProgress::default();
        let mut sum = 0usize;
        for item in items {
            progress.total += 1;
            sum += usize::from(item.progress);
            match item.status {
                ItemStatus::Queued | ItemStatus::Running => progress.running += 1,
                ItemStatus::Succeeded => progress.succeeded += 1,
                ItemStatus::Failed => progress.failed += 1,
            }
        }
        if progress.total > 0 {
            progress.percentage = (sum / progress.total) as u8;
        }
        progress
    }

    /// True when every item has finished, successfully or not.
    pub fn is_settled(&self) -> bool {
        self.running == 0
    }
}
