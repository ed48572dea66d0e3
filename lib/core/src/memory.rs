use crate::connector::{Dialect, Sample, SourceConnector, SourcePredicate};
use crate::error::{Error, Result};
use crate::filter::{Filter, RecordFilter};
use crate::record::Record;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// In-process catalog store.
///
/// Holds its records behind a lock so tests and demos can reshape the
/// data (and thereby the schema) between batches.
pub struct MemoryConnector {
    source_key: String,
    brand_label: String,
    dialect: Dialect,
    available: Arc<AtomicBool>,
    records: Arc<RwLock<Vec<Record>>>,
}

impl MemoryConnector {
    pub fn new(
        source_key: impl Into<String>,
        brand_label: impl Into<String>,
        dialect: Dialect,
        records: Vec<Record>,
    ) -> Self {
        Self {
            source_key: source_key.into(),
            brand_label: brand_label.into(),
            dialect,
            available: Arc::new(AtomicBool::new(true)),
            records: Arc::new(RwLock::new(records)),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }

    /// Replace the stored records wholesale
    pub fn replace_records(&self, records: Vec<Record>) {
        *self.records.write() = records;
    }

    pub fn count(&self) -> usize {
        self.records.read().len()
    }

    fn compile(&self, predicate: &SourcePredicate) -> Result<RecordFilter> {
        match (self.dialect, predicate) {
            (Dialect::Structured, SourcePredicate::Structured(doc)) => RecordFilter::from_document(doc),
            (Dialect::Text, SourcePredicate::Text(text)) => RecordFilter::parse_where(text),
            (expected, other) => Err(Error::InvalidPredicate(format!(
                "{} expects a {} predicate, got {}",
                self.source_key,
                expected,
                other.dialect()
            ))),
        }
    }
}

#[async_trait]
impl SourceConnector for MemoryConnector {
    fn source_key(&self) -> &str {
        &self.source_key
    }

    fn brand_label(&self) -> &str {
        &self.brand_label
    }

    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    async fn fetch_sample(&self, limit: usize) -> Result<Sample> {
        if !self.is_available() {
            return Err(Error::SourceUnavailable(self.source_key.clone()));
        }
        let rows: Vec<Record> = self.records.read().iter().take(limit).cloned().collect();
        Ok(Sample::from_rows(rows))
    }

    async fn execute_query(&self, predicate: &SourcePredicate) -> Result<Vec<Record>> {
        if !self.is_available() {
            return Err(Error::SourceUnavailable(self.source_key.clone()));
        }
        let filter = self.compile(predicate)?;
        let limit = filter.limit().unwrap_or(usize::MAX);

        let rows: Vec<Record> = self
            .records
            .read()
            .iter()
            .filter(|row| filter.matches(row))
            .take(limit)
            .cloned()
            .collect();

        debug!(source = %self.source_key, matched = rows.len(), "executed predicate");
        Ok(rows)
    }
}
