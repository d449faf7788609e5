//! Where finished JPEGs are handed off.
//!
//! In the browser this is a download trigger; natively it can be a directory
//! writer or an archive. Delivery is fire-and-forget: the orchestrator does
//! not wait for or inspect the outcome.

use std::sync::{Arc, Mutex};

use tracing::warn;

/// Receives finished files.
pub trait DeliverySink: Send + Sync {
    fn deliver(&self, bytes: &[u8], file_name: &str);
}

impl<F> DeliverySink for F
where
    F: Fn(&[u8], &str) + Send + Sync,
{
    fn deliver(&self, bytes: &[u8], file_name: &str) {
        self(bytes, file_name)
    }
}

/// A delivered file, as recorded by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Sink that keeps every delivery in memory, in order.
///
/// Clones share the same record, so one clone can be handed to the
/// orchestrator while another is inspected.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    deliveries: Arc<Mutex<Vec<Delivery>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far.
    pub fn deliveries(&self) -> Vec<Delivery> {
        match self.deliveries.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// File names delivered so far.
    pub fn file_names(&self) -> Vec<String> {
        self.deliveries().into_iter().map(|d| d.file_name).collect()
    }

    pub fn len(&self) -> usize {
        self.deliveries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DeliverySink for MemorySink {
    fn deliver(&self, bytes: &[u8], file_name: &str) {
        let delivery = Delivery {
            file_name: file_name.to_string(),
            bytes: bytes.to_vec(),
        };
        match self.deliveries.lock() {
            Ok(mut guard) => guard.push(delivery),
            Err(poisoned) => {
                warn!(file_name, "Delivery record was poisoned; recovering");
                poisoned.into_inner().push(delivery);
            }
        }
    }
}
