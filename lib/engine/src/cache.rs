use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use unicat_schema::SchemaSnapshot;

/// Live schema snapshot per source key.
///
/// Written only by the ETL engine, one slot per source; federation reads.
#[derive(Debug, Default)]
pub struct SchemaCache {
    snapshots: RwLock<HashMap<String, Arc<SchemaSnapshot>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, source_key: &str) -> Option<Arc<SchemaSnapshot>> {
        self.snapshots.read().get(source_key).cloned()
    }

    /// Replace the slot for the snapshot's source
    pub fn insert(&self, snapshot: SchemaSnapshot) -> Arc<SchemaSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.snapshots
            .write()
            .insert(snapshot.source_key.clone(), snapshot.clone());
        snapshot
    }

    pub fn remove(&self, source_key: &str) -> Option<Arc<SchemaSnapshot>> {
        self.snapshots.write().remove(source_key)
    }

    pub fn clear(&self) {
        self.snapshots.write().clear();
    }

    /// Cached source keys, sorted
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.snapshots.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// All cached snapshots, sorted by source key
    #[must_use]
    pub fn snapshots(&self) -> Vec<Arc<SchemaSnapshot>> {
        let mut all: Vec<Arc<SchemaSnapshot>> = self.snapshots.read().values().cloned().collect();
        all.sort_by(|a, b| a.source_key.cmp(&b.source_key));
        all
    }

    pub fn len(&self) -> usize {
        self.snapshots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.read().is_empty()
    }
}
