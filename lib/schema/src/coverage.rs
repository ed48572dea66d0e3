//! Unified schema coverage: which sources feed each canonical field

use crate::detector::SchemaSnapshot;
use serde::{Deserialize, Serialize};
use unicat_core::{CanonicalField, FieldKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFieldRef {
    pub source: String,
    pub original_field: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalCoverage {
    pub field: CanonicalField,
    pub kind: FieldKind,
    pub required: bool,
    pub sources: Vec<SourceFieldRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedSchemaReport {
    pub fields: Vec<CanonicalCoverage>,
    /// Required canonical fields no source currently feeds
    pub missing_required: Vec<CanonicalField>,
}

/// Build the coverage report from the live snapshots.
///
/// `brand` is always covered by the provenance tag, so it never counts as
/// missing.
pub fn unified_schema<'a, I>(snapshots: I) -> UnifiedSchemaReport
where
    I: IntoIterator<Item = &'a SchemaSnapshot>,
{
    let snapshots: Vec<&SchemaSnapshot> = snapshots.into_iter().collect();

    let fields: Vec<CanonicalCoverage> = CanonicalField::ALL
        .iter()
        .map(|&field| CanonicalCoverage {
            field,
            kind: field.kind(),
            required: field.required(),
            sources: snapshots
                .iter()
                .filter_map(|snapshot| {
                    let raw = snapshot.mapping.raw_for(field)?;
                    Some(SourceFieldRef {
                        source: snapshot.source_key.clone(),
                        original_field: raw.to_string(),
                        confidence: snapshot.mapping.confidence(field).unwrap_or(0.0),
                    })
                })
                .collect(),
        })
        .collect();

    let missing_required = fields
        .iter()
        .filter(|c| c.required && c.sources.is_empty() && c.field != CanonicalField::Brand)
        .map(|c| c.field)
        .collect();

    UnifiedSchemaReport {
        fields,
        missing_required,
    }
}
