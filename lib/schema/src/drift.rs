//! Schema drift detection.
//!
//! Compares the field set a source reports now against the cached
//! snapshot. Any difference invalidates the cached mapping.

use crate::detector::{SchemaDetector, SchemaSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;
use unicat_core::CanonicalField;

/// A raw field whose canonical target changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingChange {
    pub field: String,
    pub old_mapping: CanonicalField,
    pub new_mapping: CanonicalField,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDrift {
    pub has_changes: bool,
    /// Present now, absent before (source order)
    pub added: Vec<String>,
    /// Present before, absent now (old source order)
    pub removed: Vec<String>,
    pub modified: Vec<MappingChange>,
    /// Mapping recomputed from the new field list
    pub new_snapshot: SchemaSnapshot,
}

impl SchemaDetector {
    pub fn detect_drift(
        &self,
        old: &SchemaSnapshot,
        new_fields: &[String],
        source_key: &str,
    ) -> SchemaDrift {
        let old_set: HashSet<&str> = old.fields.iter().map(String::as_str).collect();
        let new_set: HashSet<&str> = new_fields.iter().map(String::as_str).collect();

        let added: Vec<String> = new_fields
            .iter()
            .filter(|f| !old_set.contains(f.as_str()))
            .cloned()
            .collect();
        let removed: Vec<String> = old
            .fields
            .iter()
            .filter(|f| !new_set.contains(f.as_str()))
            .cloned()
            .collect();

        let new_snapshot = self.detect_mapping(new_fields, source_key);

        let modified: Vec<MappingChange> = new_snapshot
            .mapping
            .forward()
            .iter()
            .filter_map(|(field, &new_mapping)| {
                let old_mapping = old.mapping.canonical_for(field)?;
                (old_mapping != new_mapping).then(|| MappingChange {
                    field: field.clone(),
                    old_mapping,
                    new_mapping,
                })
            })
            .collect();

        let has_changes = !added.is_empty() || !removed.is_empty() || !modified.is_empty();
        if has_changes {
            info!(
                source = source_key,
                added = added.len(),
                removed = removed.len(),
                modified = modified.len(),
                "schema drift detected"
            );
        }

        SchemaDrift {
            has_changes,
            added,
            removed,
            modified,
            new_snapshot,
        }
    }
}
