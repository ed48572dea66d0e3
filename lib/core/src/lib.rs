//! # UniCat Core
//!
//! Shared vocabulary for the UniCat catalog federation workspace.
//!
//! - [`CanonicalField`] - the fixed unified-schema attributes and their synonyms
//! - [`Record`] / [`UnifiedRecord`] - raw source rows and unified rows
//! - [`SourceConnector`] - the capability every catalog store implements
//! - [`MemoryConnector`] - in-process store, selectable through [`CatalogConfig`]
//! - [`RecordFilter`] - predicate evaluation shared by in-process stores
//!
//! ## Example
//!
//! ```rust
//! use unicat_core::{CanonicalField, FieldKind};
//!
//! assert_eq!(CanonicalField::Price.kind(), FieldKind::Number);
//! assert!(CanonicalField::Color.synonyms().contains(&"colour"));
//! ```

pub mod config;
pub mod connector;
pub mod error;
pub mod field;
pub mod filter;
pub mod memory;
pub mod record;

pub use config::{connector_from_config, CatalogConfig, ConnectorKind, SourceConfig};
pub use connector::{Dialect, Sample, SourceConnector, SourcePredicate};
pub use error::{Error, Result};
pub use field::{CanonicalField, FieldKind};
pub use filter::{Filter, FilterCondition, RecordFilter};
pub use memory::MemoryConnector;
pub use record::{provenance_key, Record, UnifiedRecord, PROVENANCE_PREFIX, SOURCE_BRAND_KEY};
