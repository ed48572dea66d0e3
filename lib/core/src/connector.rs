//! Source connector capability
//!
//! One implementation per catalog store. The ETL engine pulls samples
//! through it and query federation dispatches translated predicates to it.

use crate::error::Result;
use crate::record::Record;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Map;
use std::fmt;

/// Query dialect spoken by a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// SQL-like textual predicate (relational stores)
    Text,
    /// JSON filter document (document stores)
    Structured,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Text => f.write_str("text"),
            Dialect::Structured => f.write_str("structured"),
        }
    }
}

/// A predicate in either dialect.
///
/// Deserializes from a JSON string (text) or a JSON object (structured).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourcePredicate {
    Text(String),
    Structured(Map<String, serde_json::Value>),
}

impl SourcePredicate {
    pub fn dialect(&self) -> Dialect {
        match self {
            SourcePredicate::Text(_) => Dialect::Text,
            SourcePredicate::Structured(_) => Dialect::Structured,
        }
    }
}

/// Bounded sample pulled from a source
#[derive(Debug, Clone, Default)]
pub struct Sample {
    pub rows: Vec<Record>,
    /// Field names in source order
    pub fields: Vec<String>,
}

impl Sample {
    /// Build a sample whose field list is taken from the first row.
    pub fn from_rows(rows: Vec<Record>) -> Self {
        let fields = rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default();
        Self { rows, fields }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

#[async_trait]
pub trait SourceConnector: Send + Sync {
    /// Stable key identifying the source (used as the provenance tag)
    fn source_key(&self) -> &str;

    /// Human-readable label stamped on federated rows
    fn brand_label(&self) -> &str;

    fn dialect(&self) -> Dialect;

    fn is_available(&self) -> bool;

    /// Pull at most `limit` records
    async fn fetch_sample(&self, limit: usize) -> Result<Sample>;

    /// Run a predicate already expressed in this source's field vocabulary
    async fn execute_query(&self, predicate: &SourcePredicate) -> Result<Vec<Record>>;
}
