//! # UniCat Schema
//!
//! Runtime schema discovery for heterogeneous catalog stores.
//!
//! ## Features
//!
//! - **Fuzzy matching**: raw field names scored against canonical synonyms
//! - **Mapping detection**: deterministic, injective raw → canonical mapping
//! - **Drift detection**: added / removed / reassigned fields between samples
//! - **Unified transform**: type coercion plus provenance for unmapped fields
//!
//! ## Example
//!
//! ```rust
//! use unicat_schema::SchemaDetector;
//! use unicat_core::CanonicalField;
//!
//! let detector = SchemaDetector::new();
//! let fields = vec!["item_id".to_string(), "retail_price".to_string()];
//! let snapshot = detector.detect_mapping(&fields, "peter_england");
//!
//! assert_eq!(snapshot.mapping.canonical_for("retail_price"), Some(CanonicalField::Price));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Matcher   │────>│  Detector   │────>│  Snapshot   │
//! │ (synonyms)  │     │ (mapping)   │     │  (cached)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │                   │
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │    Drift    │     │  Transform  │
//!                     │ (fields Δ)  │     │ (unified)   │
//!                     └─────────────┘     └─────────────┘
//! ```

pub mod coverage;
pub mod detector;
pub mod drift;
pub mod matcher;
pub mod transform;

pub use coverage::{unified_schema, CanonicalCoverage, SourceFieldRef, UnifiedSchemaReport};
pub use detector::{FieldAnalysis, FieldMapping, InferredType, SchemaDetector, SchemaSnapshot};
pub use drift::{MappingChange, SchemaDrift};
pub use matcher::{find_best_match, score, FieldMatch, CONFIDENCE_THRESHOLD};
pub use transform::coerce;
