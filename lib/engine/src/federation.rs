//! Query federation
//!
//! Canonical-vocabulary predicates are rewritten into each source's own
//! field names using the cached mapping, dispatched concurrently, and the
//! returned rows are tagged with the source's brand label. A source that
//! fails (translation or execution) yields `None` without affecting the
//! others.

use crate::cache::SchemaCache;
use crate::etl::EtlEngine;
use futures::future::join_all;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, warn};
use unicat_core::{
    CanonicalField, Dialect, Error, Record, Result, SourceConnector, SourcePredicate,
    SOURCE_BRAND_KEY,
};
use unicat_schema::FieldMapping;

/// Per-source results; `None` marks a skipped or failed source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FederatedResults {
    pub by_source: BTreeMap<String, Option<Vec<Record>>>,
}

impl FederatedResults {
    pub fn get(&self, source_key: &str) -> Option<&Vec<Record>> {
        self.by_source.get(source_key).and_then(Option::as_ref)
    }

    /// Every successful source's rows, in source-key order
    pub fn combined(&self) -> Vec<Record> {
        self.by_source.values().flatten().flatten().cloned().collect()
    }

    pub fn total_count(&self) -> usize {
        self.by_source.values().flatten().map(Vec::len).sum()
    }
}

pub struct QueryFederation {
    connectors: Vec<Arc<dyn SourceConnector>>,
    cache: Arc<SchemaCache>,
}

impl QueryFederation {
    pub fn new(connectors: Vec<Arc<dyn SourceConnector>>, cache: Arc<SchemaCache>) -> Self {
        Self { connectors, cache }
    }

    /// Federation over the engine's sources and schema cache
    pub fn from_engine(engine: &EtlEngine) -> Self {
        Self::new(engine.connectors().to_vec(), engine.schema_cache().clone())
    }

    fn connector(&self, source_key: &str) -> Option<&Arc<dyn SourceConnector>> {
        self.connectors.iter().find(|c| c.source_key() == source_key)
    }

    pub async fn execute_federated(
        &self,
        predicates: &BTreeMap<String, Option<SourcePredicate>>,
    ) -> FederatedResults {
        let outcomes = join_all(predicates.iter().map(|(key, predicate)| async move {
            let rows = match predicate {
                None => {
                    debug!(source = %key, "no predicate, skipping");
                    None
                }
                Some(predicate) => match self.execute_one(key, predicate).await {
                    Ok(rows) => rows,
                    Err(e) => {
                        error!(source = %key, error = %e, "federated query failed");
                        None
                    }
                },
            };
            (key.clone(), rows)
        }))
        .await;

        FederatedResults {
            by_source: outcomes.into_iter().collect(),
        }
    }

    /// `Ok(None)` when the source is down.
    async fn execute_one(&self, key: &str, predicate: &SourcePredicate) -> Result<Option<Vec<Record>>> {
        let connector = self
            .connector(key)
            .ok_or_else(|| Error::SourceNotFound(key.to_string()))?;

        if !connector.is_available() {
            warn!(source = key, "source unavailable, skipping");
            return Ok(None);
        }

        let schema = self.cache.get(key);
        let translated = translate_predicate(
            predicate,
            connector.dialect(),
            schema.as_ref().map(|s| &s.mapping),
            key,
        )?;
        debug!(source = key, predicate = ?translated, "translated predicate");

        let mut rows = connector.execute_query(&translated).await?;
        let label = Value::String(connector.brand_label().to_string());
        for row in &mut rows {
            row.insert(SOURCE_BRAND_KEY.to_string(), label.clone());
        }
        Ok(Some(rows))
    }
}

/// Rewrite a canonical predicate into the source's vocabulary.
///
/// Without a mapping the predicate passes through unchanged.
pub fn translate_predicate(
    predicate: &SourcePredicate,
    dialect: Dialect,
    mapping: Option<&FieldMapping>,
    source_key: &str,
) -> Result<SourcePredicate> {
    if predicate.dialect() != dialect {
        return Err(Error::translation(
            source_key,
            format!("{} predicate sent to a {} source", predicate.dialect(), dialect),
        ));
    }
    let Some(mapping) = mapping else {
        return Ok(predicate.clone());
    };

    Ok(match predicate {
        SourcePredicate::Text(text) => SourcePredicate::Text(translate_text(text, mapping)),
        SourcePredicate::Structured(doc) => {
            SourcePredicate::Structured(translate_document(doc, mapping, source_key)?)
        }
    })
}

fn vocabulary_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let words: Vec<&str> = CanonicalField::ALL.iter().map(|f| f.as_str()).collect();
        Regex::new(&format!(r"\b(?:{})\b", words.join("|"))).expect("valid regex")
    })
}

/// Whole-word substitution of canonical names with raw field names.
///
/// Literals that happen to equal a canonical name are rewritten too.
pub fn translate_text(text: &str, mapping: &FieldMapping) -> String {
    vocabulary_regex()
        .replace_all(text, |caps: &Captures| {
            let word = &caps[0];
            canonical_named(word)
                .and_then(|field| mapping.raw_for(field))
                .unwrap_or(word)
                .to_string()
        })
        .into_owned()
}

/// Key-by-key rename, descending into `$and` / `$or`.
pub fn translate_document(
    doc: &Map<String, Value>,
    mapping: &FieldMapping,
    source_key: &str,
) -> Result<Map<String, Value>> {
    let mut out = Map::with_capacity(doc.len());

    for (key, value) in doc {
        if key == "$and" || key == "$or" {
            let Value::Array(items) = value else {
                return Err(Error::translation(source_key, format!("{} expects an array", key)));
            };
            let mut translated = Vec::with_capacity(items.len());
            for item in items {
                let Value::Object(sub) = item else {
                    return Err(Error::translation(
                        source_key,
                        format!("{} items must be objects", key),
                    ));
                };
                translated.push(Value::Object(translate_document(sub, mapping, source_key)?));
            }
            out.insert(key.clone(), Value::Array(translated));
            continue;
        }

        let target = canonical_named(key)
            .and_then(|field| mapping.raw_for(field))
            .unwrap_or(key.as_str());
        out.insert(target.to_string(), value.clone());
    }

    Ok(out)
}

fn canonical_named(word: &str) -> Option<CanonicalField> {
    CanonicalField::ALL.into_iter().find(|f| f.as_str() == word)
}
