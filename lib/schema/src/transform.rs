//! Raw record → unified record transformation

use crate::detector::{SchemaDetector, SchemaSnapshot};
use regex::Regex;
use serde_json::{Map, Number, Value};
use std::sync::OnceLock;
use unicat_core::{provenance_key, CanonicalField, FieldKind, Record, UnifiedRecord};

/// Coerce a raw value to a canonical field's declared type.
///
/// `null` stays `null`. Text is read up to its first non-numeric character,
/// so `"1899 INR"` is `1899` and `"1,899"` is `1`. Text with no leading
/// number becomes `0`.
pub fn coerce(value: &Value, kind: FieldKind) -> Value {
    if value.is_null() {
        return Value::Null;
    }

    match kind {
        FieldKind::Number => {
            let parsed = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => leading_number(s),
                _ => None,
            };
            number_value(parsed.unwrap_or(0.0))
        }
        FieldKind::String => match value {
            Value::String(s) => Value::String(s.clone()),
            other => Value::String(other.to_string()),
        },
        FieldKind::Boolean => Value::Bool(match value {
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(false),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }),
    }
}

fn leading_number(s: &str) -> Option<f64> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid regex")
    });
    re.find(s.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

// Integral values stay integers so 1899 round-trips as 1899, not 1899.0.
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or_else(|| Value::from(0))
    }
}

impl SchemaDetector {
    /// Transform raw records using a snapshot's mapping.
    ///
    /// Mapped fields are coerced and renamed; unmapped fields are kept under
    /// their provenance key; `brand` is always the source key. No record is
    /// ever dropped, even when nothing maps.
    pub fn transform_to_unified(&self, rows: &[Record], snapshot: &SchemaSnapshot) -> Vec<UnifiedRecord> {
        rows.iter().map(|row| self.transform_record(row, snapshot)).collect()
    }

    fn transform_record(&self, row: &Record, snapshot: &SchemaSnapshot) -> UnifiedRecord {
        let mapping = &snapshot.mapping;
        let mut out = Map::with_capacity(row.len() + 1);

        for (&canonical, raw_field) in mapping.inverse() {
            if canonical == CanonicalField::Brand {
                continue;
            }
            if let Some(value) = row.get(raw_field) {
                out.insert(canonical.as_str().to_string(), coerce(value, canonical.kind()));
            }
        }

        for (key, value) in row {
            // The provenance tag owns `brand`, so a mapped brand column is
            // preserved like an unmapped one.
            match mapping.canonical_for(key) {
                Some(canonical) if canonical != CanonicalField::Brand => {}
                _ => {
                    out.insert(provenance_key(key), value.clone());
                }
            }
        }

        out.insert(
            CanonicalField::Brand.as_str().to_string(),
            Value::String(snapshot.source_key.clone()),
        );

        UnifiedRecord::from_fields(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_price_coercion() {
        assert_eq!(coerce(&json!("500"), FieldKind::Number), json!(500));
        assert_eq!(coerce(&json!("abc"), FieldKind::Number), json!(0));
        assert_eq!(coerce(&json!("18.5"), FieldKind::Number), json!(18.5));
        assert_eq!(coerce(&json!(null), FieldKind::Number), json!(null));
    }

    #[test]
    fn test_price_text_with_trailing_characters() {
        assert_eq!(coerce(&json!("1899 INR"), FieldKind::Number), json!(1899));
        assert_eq!(coerce(&json!("1,899"), FieldKind::Number), json!(1));
        assert_eq!(coerce(&json!("  12.5kg"), FieldKind::Number), json!(12.5));
        assert_eq!(coerce(&json!("-3e2 units"), FieldKind::Number), json!(-300));
        assert_eq!(coerce(&json!(".5"), FieldKind::Number), json!(0.5));
        assert_eq!(coerce(&json!("Rs. 1899"), FieldKind::Number), json!(0));
        assert_eq!(coerce(&json!(""), FieldKind::Number), json!(0));
    }

    #[test]
    fn test_string_and_boolean_coercion() {
        assert_eq!(coerce(&json!(42), FieldKind::String), json!("42"));
        assert_eq!(coerce(&json!(""), FieldKind::Boolean), json!(false));
        assert_eq!(coerce(&json!("yes"), FieldKind::Boolean), json!(true));
        assert_eq!(coerce(&json!(0), FieldKind::Boolean), json!(false));
    }

    #[test]
    fn test_relational_record() {
        let detector = SchemaDetector::new();
        let snapshot = detector.detect_mapping(
            &fields(&[
                "item_id",
                "product_title",
                "retail_price",
                "size_info",
                "color_variant",
                "inventory_count",
            ]),
            "peter_england",
        );

        let out = detector.transform_to_unified(
            &[row(json!({"item_id": "PE001", "retail_price": "1899", "size_info": "M"}))],
            &snapshot,
        );

        assert_eq!(out.len(), 1);
        assert_eq!(
            serde_json::to_value(&out[0]).unwrap(),
            json!({"id": "PE001", "price": 1899, "size": "M", "brand": "peter_england"})
        );
    }

    #[test]
    fn test_unmapped_fields_keep_provenance() {
        let detector = SchemaDetector::new();
        let snapshot = detector.detect_mapping(&fields(&["_id", "fabric"]), "zara");
        let out = detector.transform_to_unified(&[row(json!({"_id": "Z1", "fabric": "linen"}))], &snapshot);

        assert_eq!(out[0].get("id"), Some(&json!("Z1")));
        assert_eq!(out[0].get("original_fabric"), Some(&json!("linen")));
        assert_eq!(out[0].get("fabric"), None);
    }

    #[test]
    fn test_fully_unmatched_record_is_kept() {
        let detector = SchemaDetector::new();
        let snapshot = SchemaSnapshot::unmapped("vh", fields(&["a", "b"]), 1);
        let out = detector.transform_to_unified(&[row(json!({"a": 1, "b": "x"}))], &snapshot);

        assert_eq!(
            serde_json::to_value(&out[0]).unwrap(),
            json!({"original_a": 1, "original_b": "x", "brand": "vh"})
        );
    }

    #[test]
    fn test_mapped_brand_column_is_preserved() {
        let detector = SchemaDetector::new();
        let snapshot = detector.detect_mapping(&fields(&["id", "brand_name"]), "van_heusen");
        let out = detector.transform_to_unified(
            &[row(json!({"id": 7, "brand_name": "VH Sport"}))],
            &snapshot,
        );

        assert_eq!(out[0].brand(), Some("van_heusen"));
        assert_eq!(out[0].get("original_brand_name"), Some(&json!("VH Sport")));
        assert_eq!(out[0].get("id"), Some(&json!("7")));
    }

    #[test]
    fn test_identity_mapping_preserves_well_typed_values() {
        let detector = SchemaDetector::new();
        let snapshot = detector.detect_mapping(
            &fields(&["id", "name", "category", "price", "size", "color", "stock"]),
            "src",
        );
        let input = json!({
            "id": "A1", "name": "Oxford Shirt", "category": "shirts",
            "price": 1499, "size": "L", "color": "white", "stock": 12
        });
        let out = detector.transform_to_unified(&[row(input.clone())], &snapshot);

        for (key, value) in input.as_object().unwrap() {
            assert_eq!(out[0].get(key), Some(value), "field {}", key);
        }
    }
}
