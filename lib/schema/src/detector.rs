//! Schema detection
//!
//! Builds a [`SchemaSnapshot`] for one source: which raw field feeds each
//! canonical field, how confident the match is, and per-field diagnostics
//! inferred from a sample.

use crate::matcher::{find_best_match, FieldMatch};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;
use tracing::debug;
use unicat_core::{CanonicalField, Error, Record, Result, Sample};

/// Raw-to-canonical field mapping for one source.
///
/// Partial and injective: each canonical field has at most one raw field
/// and each raw field feeds at most one canonical field. The inverse table
/// is kept in step with the forward one so federation can translate
/// canonical predicates back into source vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    mappings: BTreeMap<String, CanonicalField>,
    inverse: BTreeMap<CanonicalField, String>,
    confidence: BTreeMap<CanonicalField, f64>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a match. Returns false if either side is already taken.
    pub fn insert(&mut self, canonical: CanonicalField, matched: FieldMatch) -> bool {
        if self.inverse.contains_key(&canonical) || self.mappings.contains_key(&matched.field) {
            return false;
        }
        self.mappings.insert(matched.field.clone(), canonical);
        self.inverse.insert(canonical, matched.field);
        self.confidence.insert(canonical, matched.confidence);
        true
    }

    /// Canonical field fed by `raw_field`
    #[inline]
    pub fn canonical_for(&self, raw_field: &str) -> Option<CanonicalField> {
        self.mappings.get(raw_field).copied()
    }

    /// Raw field feeding `canonical`
    #[inline]
    pub fn raw_for(&self, canonical: CanonicalField) -> Option<&str> {
        self.inverse.get(&canonical).map(String::as_str)
    }

    pub fn confidence(&self, canonical: CanonicalField) -> Option<f64> {
        self.confidence.get(&canonical).copied()
    }

    /// raw field → canonical field
    pub fn forward(&self) -> &BTreeMap<String, CanonicalField> {
        &self.mappings
    }

    /// canonical field → raw field, in canonical declaration order
    pub fn inverse(&self) -> &BTreeMap<CanonicalField, String> {
        &self.inverse
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// Diagnostic type classification of a sample value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferredType {
    Nullable,
    Number,
    Boolean,
    Date,
    /// Digits transmitted as text, e.g. `"1899"`
    StringNumeric,
    /// Decimal transmitted as text, e.g. `"18.99"`
    StringDecimal,
    String,
    Object,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAnalysis {
    pub field: String,
    pub inferred_type: InferredType,
    pub sample_value: Value,
    /// Share of sampled rows where the field is missing, null or empty
    pub nullability: f64,
}

/// Detected schema of one source at one point in time.
///
/// Superseded on refresh, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub source_key: String,
    /// Raw field names in source order
    pub fields: Vec<String>,
    pub mapping: FieldMapping,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_analysis: Vec<FieldAnalysis>,
    pub detected_at: DateTime<Utc>,
    pub total_fields: usize,
    pub mapped_fields: usize,
    pub sample_size: usize,
}

impl SchemaSnapshot {
    /// Snapshot with no mapping at all; every field passes through unmapped.
    pub fn unmapped(source_key: &str, fields: Vec<String>, sample_size: usize) -> Self {
        Self {
            source_key: source_key.to_string(),
            total_fields: fields.len(),
            fields,
            mapping: FieldMapping::new(),
            field_analysis: Vec::new(),
            detected_at: Utc::now(),
            mapped_fields: 0,
            sample_size,
        }
    }
}

/// Stateless schema detector over the static synonym table
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaDetector;

impl SchemaDetector {
    pub fn new() -> Self {
        Self
    }

    /// Map raw fields onto canonical fields.
    ///
    /// Canonical fields are visited in declaration order; a raw field
    /// claimed by an earlier canonical field is not offered to later ones.
    pub fn detect_mapping(&self, raw_fields: &[String], source_key: &str) -> SchemaSnapshot {
        let mut mapping = FieldMapping::new();
        let mut claimed: HashSet<&str> = HashSet::new();

        for canonical in CanonicalField::ALL {
            let candidates: Vec<&str> = raw_fields
                .iter()
                .map(String::as_str)
                .filter(|f| !claimed.contains(f))
                .collect();

            if let Some(matched) = find_best_match(canonical, &candidates) {
                if let Some(raw) = raw_fields.iter().find(|f| **f == matched.field) {
                    claimed.insert(raw.as_str());
                }
                mapping.insert(canonical, matched);
            }
        }

        debug!(
            source = source_key,
            total = raw_fields.len(),
            mapped = mapping.len(),
            "schema mapping detected"
        );

        SchemaSnapshot {
            source_key: source_key.to_string(),
            fields: raw_fields.to_vec(),
            total_fields: raw_fields.len(),
            mapped_fields: mapping.len(),
            mapping,
            field_analysis: Vec::new(),
            detected_at: Utc::now(),
            sample_size: 0,
        }
    }

    /// Detect the mapping and attach per-field diagnostics from the sample.
    pub fn analyze(&self, sample: &Sample, source_key: &str) -> Result<SchemaSnapshot> {
        if sample.rows.is_empty() {
            return Err(Error::EmptySample(source_key.to_string()));
        }

        let snapshot = self.detect_mapping(&sample.fields, source_key);
        Ok(self.with_sample(snapshot, sample))
    }

    /// Attach field diagnostics and sample size to an already detected mapping.
    pub fn with_sample(&self, mut snapshot: SchemaSnapshot, sample: &Sample) -> SchemaSnapshot {
        snapshot.field_analysis = self.field_analysis(sample);
        snapshot.sample_size = sample.rows.len();
        snapshot
    }

    /// Inferred type, first value and nullability per field. Empty for an empty sample.
    pub fn field_analysis(&self, sample: &Sample) -> Vec<FieldAnalysis> {
        let Some(first) = sample.rows.first() else {
            return Vec::new();
        };

        sample
            .fields
            .iter()
            .map(|field| {
                let sample_value = first.get(field).cloned().unwrap_or(Value::Null);
                FieldAnalysis {
                    field: field.clone(),
                    inferred_type: self.infer_field_type(&sample_value),
                    sample_value,
                    nullability: self.nullability(&sample.rows, field),
                }
            })
            .collect()
    }

    pub fn infer_field_type(&self, value: &Value) -> InferredType {
        match value {
            Value::Null => InferredType::Nullable,
            Value::Number(_) => InferredType::Number,
            Value::Bool(_) => InferredType::Boolean,
            Value::String(s) => {
                if integer_regex().is_match(s) {
                    InferredType::StringNumeric
                } else if decimal_regex().is_match(s) {
                    InferredType::StringDecimal
                } else if DateTime::parse_from_rfc3339(s).is_ok() {
                    InferredType::Date
                } else {
                    InferredType::String
                }
            }
            Value::Array(_) | Value::Object(_) => InferredType::Object,
        }
    }

    /// Fraction of rows where `field` is missing, null or the empty string.
    pub fn nullability(&self, rows: &[Record], field: &str) -> f64 {
        if rows.is_empty() {
            return 0.0;
        }
        let nulls = rows
            .iter()
            .filter(|row| match row.get(field) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.is_empty(),
                _ => false,
            })
            .count();
        nulls as f64 / rows.len() as f64
    }
}

fn integer_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+$").expect("valid regex"))
}

fn decimal_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.\d+$").expect("valid regex"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_relational_layout() {
        let detector = SchemaDetector::new();
        let raw = fields(&[
            "item_id",
            "product_title",
            "retail_price",
            "size_info",
            "color_variant",
            "inventory_count",
        ]);
        let snapshot = detector.detect_mapping(&raw, "peter_england");

        let m = &snapshot.mapping;
        assert_eq!(m.canonical_for("item_id"), Some(CanonicalField::Id));
        assert_eq!(m.canonical_for("product_title"), Some(CanonicalField::Name));
        assert_eq!(m.canonical_for("retail_price"), Some(CanonicalField::Price));
        assert_eq!(m.canonical_for("size_info"), Some(CanonicalField::Size));
        assert_eq!(m.canonical_for("color_variant"), Some(CanonicalField::Color));
        assert_eq!(m.canonical_for("inventory_count"), Some(CanonicalField::Stock));
        assert_eq!(m.raw_for(CanonicalField::Category), None);
        assert_eq!(snapshot.total_fields, 6);
        assert_eq!(snapshot.mapped_fields, 6);
    }

    #[test]
    fn test_document_layout() {
        let detector = SchemaDetector::new();
        let raw = fields(&["_id", "product_name", "product_type", "cost", "colour", "available_quantity", "material"]);
        let snapshot = detector.detect_mapping(&raw, "zara");

        assert_eq!(snapshot.mapping.raw_for(CanonicalField::Id), Some("_id"));
        assert_eq!(snapshot.mapping.raw_for(CanonicalField::Category), Some("product_type"));
        assert_eq!(snapshot.mapping.raw_for(CanonicalField::Price), Some("cost"));
        assert_eq!(snapshot.mapping.canonical_for("material"), None);
        assert_eq!(snapshot.mapping.confidence(CanonicalField::Price), Some(1.0));
    }

    #[test]
    fn test_raw_field_claimed_once() {
        let detector = SchemaDetector::new();
        let raw = fields(&["name", "brand_name"]);
        let snapshot = detector.detect_mapping(&raw, "src");
        let claimed: Vec<_> = snapshot.mapping.forward().keys().collect();
        let unique: HashSet<_> = claimed.iter().collect();
        assert_eq!(claimed.len(), unique.len());
        assert_eq!(snapshot.mapping.raw_for(CanonicalField::Name), Some("name"));
        assert_eq!(snapshot.mapping.raw_for(CanonicalField::Brand), Some("brand_name"));
    }

    #[test]
    fn test_inferred_types() {
        let detector = SchemaDetector::new();
        assert_eq!(detector.infer_field_type(&json!(null)), InferredType::Nullable);
        assert_eq!(detector.infer_field_type(&json!(3.5)), InferredType::Number);
        assert_eq!(detector.infer_field_type(&json!(true)), InferredType::Boolean);
        assert_eq!(detector.infer_field_type(&json!("1899")), InferredType::StringNumeric);
        assert_eq!(detector.infer_field_type(&json!("18.99")), InferredType::StringDecimal);
        assert_eq!(detector.infer_field_type(&json!("2024-03-01T10:00:00Z")), InferredType::Date);
        assert_eq!(detector.infer_field_type(&json!("Navy")), InferredType::String);
        assert_eq!(detector.infer_field_type(&json!({"a": 1})), InferredType::Object);
    }

    #[test]
    fn test_analyze_nullability() {
        let rows: Vec<Record> = vec![
            json!({"_id": "Z1", "colour": ""}),
            json!({"_id": "Z2", "colour": null}),
            json!({"_id": "Z3", "colour": "red"}),
            json!({"_id": "Z4"}),
        ]
        .into_iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect();
        let sample = Sample::from_rows(rows);

        let snapshot = SchemaDetector::new().analyze(&sample, "zara").unwrap();
        assert_eq!(snapshot.sample_size, 4);
        let colour = snapshot.field_analysis.iter().find(|f| f.field == "colour").unwrap();
        assert_eq!(colour.nullability, 0.75);
        assert_eq!(colour.inferred_type, InferredType::String);
    }

    #[test]
    fn test_with_sample_keeps_mapping() {
        let detector = SchemaDetector::new();
        let sample = Sample::from_rows(vec![json!({"sku": "S1", "mrp": "999"}).as_object().cloned().unwrap()]);
        let mapping = detector.detect_mapping(&sample.fields, "pe");
        let detected_at = mapping.detected_at;

        let snapshot = detector.with_sample(mapping, &sample);
        assert_eq!(snapshot.detected_at, detected_at);
        assert_eq!(snapshot.sample_size, 1);
        let mrp = snapshot.field_analysis.iter().find(|f| f.field == "mrp").unwrap();
        assert_eq!(mrp.inferred_type, InferredType::StringNumeric);
        assert_eq!(mrp.sample_value, json!("999"));
    }

    #[test]
    fn test_analyze_empty_sample() {
        let result = SchemaDetector::new().analyze(&Sample::default(), "zara");
        assert!(matches!(result, Err(Error::EmptySample(_))));
    }

    #[test]
    fn test_mapping_serializes_with_names() {
        let raw = fields(&["retail_price"]);
        let snapshot = SchemaDetector::new().detect_mapping(&raw, "pe");
        let json = serde_json::to_value(&snapshot.mapping).unwrap();
        assert_eq!(json["mappings"]["retail_price"], json!("price"));
        assert_eq!(json["inverse"]["price"], json!("retail_price"));
    }
}
