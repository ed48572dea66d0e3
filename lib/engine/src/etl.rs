//! Extract-transform-load engine
//!
//! One batch pulls a bounded sample from every configured source, reuses or
//! re-detects the source's schema mapping, transforms the rows into the
//! unified schema and publishes the concatenation as the new live snapshot.
//!
//! ```text
//! Idle ─> Extracting(source) ─┬─ cache hit ────────┬─> Transforming ─> Idle
//!                             └─ DetectingSchema ──┘
//!                       (every source) ─> Publishing
//! ```

use crate::cache::SchemaCache;
use crate::query::UnifiedQuery;
use crate::store::{SnapshotStore, UnifiedSnapshot};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use unicat_core::{CatalogConfig, Error, Result, Sample, SourceConnector, UnifiedRecord};
use unicat_schema::{unified_schema, SchemaDetector, SchemaSnapshot, UnifiedSchemaReport};
use uuid::Uuid;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_SAMPLE_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EtlConfig {
    pub interval: Duration,
    /// Maximum rows pulled per source per batch
    pub sample_limit: usize,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            sample_limit: DEFAULT_SAMPLE_LIMIT,
        }
    }
}

impl From<&CatalogConfig> for EtlConfig {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_minutes * 60),
            sample_limit: config.sample_limit,
        }
    }
}

/// Outcome of one source within a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceBatchResult {
    pub source_key: String,
    pub original_count: usize,
    pub transformed_count: usize,
    /// True when the mapping was (re)detected in this batch
    pub schema_detected: bool,
    pub schema: SchemaSnapshot,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub total_records: usize,
    /// Successful sources only, in configured order
    pub results: Vec<SourceBatchResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtlStats {
    pub last_processed_time: Option<DateTime<Utc>>,
    pub total_unified_records: usize,
    pub cached_source_keys: Vec<String>,
    pub interval_minutes: u64,
    pub source_availability: BTreeMap<String, bool>,
}

struct SourceOutput {
    result: SourceBatchResult,
    records: Vec<UnifiedRecord>,
}

pub struct EtlEngine {
    connectors: Vec<Arc<dyn SourceConnector>>,
    detector: SchemaDetector,
    cache: Arc<SchemaCache>,
    store: SnapshotStore,
    config: EtlConfig,
    /// Serializes batches; a second refresh waits for the running one
    batch_lock: Mutex<()>,
}

impl EtlEngine {
    pub fn new(connectors: Vec<Arc<dyn SourceConnector>>, config: EtlConfig) -> Self {
        Self {
            connectors,
            detector: SchemaDetector::new(),
            cache: Arc::new(SchemaCache::new()),
            store: SnapshotStore::new(),
            config,
            batch_lock: Mutex::new(()),
        }
    }

    #[inline]
    pub fn config(&self) -> &EtlConfig {
        &self.config
    }

    pub fn connectors(&self) -> &[Arc<dyn SourceConnector>] {
        &self.connectors
    }

    pub fn schema_cache(&self) -> &Arc<SchemaCache> {
        &self.cache
    }

    /// Current live snapshot
    #[inline]
    pub fn snapshot(&self) -> Arc<UnifiedSnapshot> {
        self.store.load()
    }

    pub async fn run_batch(&self) -> Result<BatchReport> {
        let _guard = self.batch_lock.lock().await;
        self.run_batch_locked().await
    }

    /// Drop every cached mapping and run one batch.
    pub async fn force_refresh(&self) -> Result<BatchReport> {
        let _guard = self.batch_lock.lock().await;
        info!("forced refresh: clearing schema cache");
        self.cache.clear();
        self.run_batch_locked().await
    }

    async fn run_batch_locked(&self) -> Result<BatchReport> {
        let batch_id = Uuid::new_v4();
        let sequence = self.store.next_sequence();
        let started_at = Utc::now();
        let timer = Instant::now();
        info!(%batch_id, sequence, sources = self.connectors.len(), "ETL batch started");

        let outcomes = join_all(
            self.connectors
                .iter()
                .map(|connector| self.process_source(connector.as_ref())),
        )
        .await;

        let mut results = Vec::with_capacity(outcomes.len());
        let mut records = Vec::new();
        for (connector, outcome) in self.connectors.iter().zip(outcomes) {
            match outcome {
                Ok(Some(output)) => {
                    records.extend(output.records);
                    results.push(output.result);
                }
                Ok(None) => {}
                Err(e) => {
                    error!(source = connector.source_key(), error = %e, "source failed, skipping");
                }
            }
        }

        let sources: Vec<String> = results.iter().map(|r| r.source_key.clone()).collect();
        let total_records = records.len();
        self.store
            .publish(UnifiedSnapshot::new(records, sources, batch_id, sequence))
            .map_err(|e| {
                error!(%batch_id, error = %e, "publish failed, keeping previous snapshot");
                e
            })?;

        let duration_ms = timer.elapsed().as_millis() as u64;
        info!(
            %batch_id,
            total_records,
            succeeded = results.len(),
            duration_ms,
            "ETL batch complete"
        );

        Ok(BatchReport {
            batch_id,
            started_at,
            duration_ms,
            total_records,
            results,
        })
    }

    /// `Ok(None)` means the source was skipped this batch.
    async fn process_source(&self, connector: &dyn SourceConnector) -> Result<Option<SourceOutput>> {
        let key = connector.source_key();

        if !connector.is_available() {
            warn!(source = key, "source unavailable, skipping");
            return Ok(None);
        }

        let sample = connector.fetch_sample(self.config.sample_limit).await?;
        if sample.is_empty() {
            warn!(source = key, "empty sample, skipping");
            return Ok(None);
        }

        let (schema, schema_detected) = match self.cache.get(key) {
            Some(cached) => {
                let drift = self.detector.detect_drift(&cached, &sample.fields, key);
                if drift.has_changes {
                    info!(
                        source = key,
                        mapped = drift.new_snapshot.mapped_fields,
                        total = drift.new_snapshot.total_fields,
                        "schema re-detected after drift"
                    );
                    let snapshot = self.detector.with_sample(drift.new_snapshot, &sample);
                    (self.cache.insert(snapshot), true)
                } else {
                    debug!(source = key, "schema cache hit");
                    (cached, false)
                }
            }
            None => (self.cache.insert(self.detect_schema(&sample, key)), true),
        };

        let records = self.detector.transform_to_unified(&sample.rows, &schema);
        debug!(
            source = key,
            original = sample.len(),
            transformed = records.len(),
            "source transformed"
        );

        Ok(Some(SourceOutput {
            result: SourceBatchResult {
                source_key: key.to_string(),
                original_count: sample.len(),
                transformed_count: records.len(),
                schema_detected,
                schema: (*schema).clone(),
                processed_at: Utc::now(),
            },
            records,
        }))
    }

    // A failed detection degrades to an empty mapping: records still load,
    // every field under its provenance key.
    fn detect_schema(&self, sample: &Sample, key: &str) -> SchemaSnapshot {
        match self.detector.analyze(sample, key) {
            Ok(snapshot) => {
                info!(
                    source = key,
                    mapped = snapshot.mapped_fields,
                    total = snapshot.total_fields,
                    "schema detected"
                );
                snapshot
            }
            Err(e) => {
                let failure = Error::MappingFailure {
                    source_key: key.to_string(),
                    reason: e.to_string(),
                };
                warn!(error = %failure, "falling back to unmapped schema");
                SchemaSnapshot::unmapped(key, sample.fields.clone(), sample.len())
            }
        }
    }

    pub fn query(&self, query: &UnifiedQuery) -> Vec<UnifiedRecord> {
        let snapshot = self.store.load();
        query.apply(&snapshot.records)
    }

    #[must_use]
    pub fn stats(&self) -> EtlStats {
        let snapshot = self.store.load();
        EtlStats {
            last_processed_time: snapshot.processed_at,
            total_unified_records: snapshot.len(),
            cached_source_keys: self.cache.keys(),
            interval_minutes: self.config.interval.as_secs() / 60,
            source_availability: self
                .connectors
                .iter()
                .map(|c| (c.source_key().to_string(), c.is_available()))
                .collect(),
        }
    }

    pub fn unified_schema(&self) -> UnifiedSchemaReport {
        let snapshots = self.cache.snapshots();
        unified_schema(snapshots.iter().map(Arc::as_ref))
    }
}
