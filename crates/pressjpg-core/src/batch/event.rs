//! Messages sent from compression runs back to the orchestrator.

use crate::engine::{CompressedImage, EngineError};

use super::item::ItemId;

/// What a run reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Progress(u8),
    Finished(Result<CompressedImage, EngineError>),
}

/// One report from a run, tagged with the item and run generation it
/// belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEvent {
    pub id: ItemId,
    pub generation: u64,
    pub kind: EventKind,
}

impl EngineEvent {
    pub fn progress(id: ItemId, generation: u64, percent: u8) -> Self {
        Self {
            id,
            generation,
            kind: EventKind::Progress(percent),
        }
    }

    pub fn finished(
        id: ItemId,
        generation: u64,
        result: Result<CompressedImage, EngineError>,
    ) -> Self {
        Self {
            id,
            generation,
            kind: EventKind::Finished(result),
        }
    }
}
