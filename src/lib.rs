//! # UniCat
//!
//! One query API over several independently-structured catalog stores.
//!
//! UniCat discovers each store's field names at runtime, maps them onto a
//! fixed canonical product vocabulary with fuzzy matching, keeps a unified
//! in-memory snapshot fresh with a scheduled ETL loop, and federates
//! canonical predicates back down to the stores.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! unicat --config catalog.json --http-port 5000
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use unicat::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<()> {
//! let rows = vec![serde_json::json!({"item_id": "PE001", "retail_price": "1899"})
//!     .as_object()
//!     .cloned()
//!     .unwrap_or_default()];
//! let store = Arc::new(MemoryConnector::new("peter_england", "Peter England", Dialect::Text, rows));
//!
//! let engine = EtlEngine::new(vec![store], EtlConfig::default());
//! engine.run_batch().await?;
//!
//! let hits = engine.query(&UnifiedQuery::new().price_range(Some(1000.0), None));
//! assert_eq!(hits.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Structure
//!
//! - `unicat-core` - canonical vocabulary, records, connectors, config, errors
//! - `unicat-schema` - fuzzy matching, schema detection, drift, transforms
//! - `unicat-engine` - ETL engine, snapshot store, scheduler, federation
//! - `unicat-api` - REST API

// Re-export core types
pub use unicat_core::{
    connector_from_config, CanonicalField, CatalogConfig, Dialect, Error, FieldKind, Filter,
    FilterCondition, MemoryConnector, Record, RecordFilter, Result, Sample, SourceConfig,
    SourceConnector, SourcePredicate, UnifiedRecord,
};

// Re-export schema detection
pub use unicat_schema::{
    find_best_match, unified_schema, FieldMapping, FieldMatch, SchemaDetector, SchemaDrift,
    SchemaSnapshot, UnifiedSchemaReport,
};

// Re-export engine
pub use unicat_engine::{
    BatchReport, EtlConfig, EtlEngine, EtlStats, FederatedResults, QueryFederation,
    SchedulerHandle, UnifiedQuery, UnifiedSnapshot,
};

// Re-export API
pub use unicat_api::{AppState, RestApi};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        CanonicalField, CatalogConfig, Dialect, Error, EtlConfig, EtlEngine, MemoryConnector,
        QueryFederation, Record, Result, SchemaDetector, SourceConnector, SourcePredicate,
        UnifiedQuery, UnifiedRecord,
    };
}
