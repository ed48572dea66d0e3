use crate::CanonicalField;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A raw source record: string keys to scalar, date or nested values.
pub type Record = Map<String, Value>;

/// Key prefix for source fields that have no canonical counterpart
pub const PROVENANCE_PREFIX: &str = "original_";

/// Key added to federated rows naming the store they came from
pub const SOURCE_BRAND_KEY: &str = "source_brand";

/// Build the provenance-prefixed key for an unmapped raw field.
#[inline]
pub fn provenance_key(raw_field: &str) -> String {
    format!("{}{}", PROVENANCE_PREFIX, raw_field)
}

/// A record in the unified schema.
///
/// Immutable once built: fields are only readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnifiedRecord {
    fields: Map<String, Value>,
}

impl UnifiedRecord {
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    #[inline]
    pub fn canonical(&self, field: CanonicalField) -> Option<&Value> {
        self.fields.get(field.as_str())
    }

    pub fn canonical_str(&self, field: CanonicalField) -> Option<&str> {
        self.canonical(field).and_then(Value::as_str)
    }

    pub fn price(&self) -> Option<f64> {
        self.canonical(CanonicalField::Price).and_then(Value::as_f64)
    }

    /// Provenance tag (the source key)
    pub fn brand(&self) -> Option<&str> {
        self.canonical_str(CanonicalField::Brand)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accessors() {
        let Value::Object(map) = json!({"id": "A1", "price": 10.5, "brand": "zara"}) else {
            unreachable!()
        };
        let record = UnifiedRecord::from_fields(map);
        assert_eq!(record.canonical_str(CanonicalField::Id), Some("A1"));
        assert_eq!(record.price(), Some(10.5));
        assert_eq!(record.brand(), Some("zara"));
        assert_eq!(record.len(), 3);
    }

    #[test]
    fn test_serializes_flat() {
        let Value::Object(map) = json!({"id": "A1"}) else {
            unreachable!()
        };
        let record = UnifiedRecord::from_fields(map);
        assert_eq!(serde_json::to_value(&record).unwrap(), json!({"id": "A1"}));
    }

    #[test]
    fn test_provenance_key() {
        assert_eq!(provenance_key("fabric"), "original_fabric");
    }
}
