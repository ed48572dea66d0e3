//! # UniCat Engine
//!
//! Runtime side of the catalog: the periodic ETL loop that keeps an
//! in-memory unified snapshot fresh, and query federation that pushes
//! canonical predicates down to the sources.
//!
//! - [`EtlEngine`] - batches, schema cache, unified queries, stats
//! - [`SnapshotStore`] - copy-on-write live snapshot
//! - [`SchedulerHandle`] - cancellable periodic batch task
//! - [`QueryFederation`] - predicate translation and fan-out

pub mod cache;
pub mod etl;
pub mod federation;
pub mod query;
pub mod scheduler;
pub mod store;

pub use cache::SchemaCache;
pub use etl::{BatchReport, EtlConfig, EtlEngine, EtlStats, SourceBatchResult};
pub use federation::{translate_document, translate_predicate, translate_text, FederatedResults, QueryFederation};
pub use query::UnifiedQuery;
pub use scheduler::{SchedulerHandle, MIN_INTERVAL};
pub use store::{SnapshotStore, UnifiedSnapshot};
