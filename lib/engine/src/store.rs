//! Live unified snapshot
//!
//! Readers clone the current `Arc` and keep a complete snapshot for as long
//! as they hold it; a publish swaps the whole `Arc` in one write.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;
use unicat_core::{Error, Result, UnifiedRecord};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnifiedSnapshot {
    pub records: Vec<UnifiedRecord>,
    pub processed_at: Option<DateTime<Utc>>,
    pub batch_id: Option<Uuid>,
    /// Batch order; the empty snapshot is 0
    pub sequence: u64,
    /// Source keys that contributed records
    pub sources: Vec<String>,
}

impl UnifiedSnapshot {
    /// The snapshot before the first batch
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            processed_at: None,
            batch_id: None,
            sequence: 0,
            sources: Vec::new(),
        }
    }

    pub fn new(records: Vec<UnifiedRecord>, sources: Vec<String>, batch_id: Uuid, sequence: u64) -> Self {
        Self {
            records,
            processed_at: Some(Utc::now()),
            batch_id: Some(batch_id),
            sequence,
            sources,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub struct SnapshotStore {
    current: RwLock<Arc<UnifiedSnapshot>>,
    sequence: AtomicU64,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(UnifiedSnapshot::empty())),
            sequence: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn load(&self) -> Arc<UnifiedSnapshot> {
        self.current.read().clone()
    }

    /// Reserve the sequence number for the next batch. Starts at 1.
    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Swap in a new snapshot.
    ///
    /// Snapshots are ordered by batch sequence, not by wall clock. One whose
    /// sequence is not past the live one is refused and the live snapshot
    /// is kept.
    pub fn publish(&self, snapshot: UnifiedSnapshot) -> Result<Arc<UnifiedSnapshot>> {
        if snapshot.processed_at.is_none() {
            return Err(Error::PublishFailure("snapshot has no processing time".to_string()));
        }

        let snapshot = Arc::new(snapshot);
        let mut current = self.current.write();
        if snapshot.sequence <= current.sequence {
            return Err(Error::PublishFailure(format!(
                "snapshot #{} is not newer than live snapshot #{}",
                snapshot.sequence, current.sequence
            )));
        }

        *current = snapshot.clone();
        drop(current);

        info!(
            sequence = snapshot.sequence,
            records = snapshot.len(),
            sources = snapshot.sources.len(),
            "unified snapshot published"
        );
        Ok(snapshot)
    }

    pub fn last_processed_time(&self) -> Option<DateTime<Utc>> {
        self.current.read().processed_at
    }
}
