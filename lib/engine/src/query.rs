use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use unicat_core::{CanonicalField, UnifiedRecord};

/// Filters over the unified snapshot. Absent filters match everything;
/// present filters are ANDed.
///
/// Blank strings count as absent, and price bounds may arrive as numbers
/// or numeric strings, as form-driven clients send them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedQuery {
    #[serde(default, deserialize_with = "text_filter", skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, deserialize_with = "text_filter", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "price_bound", skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(default, deserialize_with = "price_bound", skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(default, deserialize_with = "text_filter", skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, deserialize_with = "text_filter", skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

fn text_filter<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.trim().is_empty()))
}

fn price_bound<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("price bound must be numeric, got {:?}", s))),
        Some(other) => Err(de::Error::custom(format!(
            "price bound must be a number, got {}",
            other
        ))),
    }
}

/// Blank filter text is no filter
fn active(filter: &Option<String>) -> Option<&str> {
    filter.as_deref().filter(|s| !s.trim().is_empty())
}

impl UnifiedQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// A record lacking a filtered field fails that filter.
    pub fn matches(&self, record: &UnifiedRecord) -> bool {
        if let Some(brand) = active(&self.brand) {
            if !contains_ci(record, CanonicalField::Brand, brand) {
                return false;
            }
        }
        if let Some(category) = active(&self.category) {
            if !contains_ci(record, CanonicalField::Category, category) {
                return false;
            }
        }
        if self.min_price.is_some() || self.max_price.is_some() {
            let Some(price) = record.price() else {
                return false;
            };
            if self.min_price.is_some_and(|min| price < min) {
                return false;
            }
            if self.max_price.is_some_and(|max| price > max) {
                return false;
            }
        }
        if let Some(size) = active(&self.size) {
            match text_of(record, CanonicalField::Size) {
                Some(value) if value.eq_ignore_ascii_case(size) => {}
                _ => return false,
            }
        }
        if let Some(color) = active(&self.color) {
            if !contains_ci(record, CanonicalField::Color, color) {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, records: &[UnifiedRecord]) -> Vec<UnifiedRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

fn text_of(record: &UnifiedRecord, field: CanonicalField) -> Option<String> {
    match record.canonical(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn contains_ci(record: &UnifiedRecord, field: CanonicalField, needle: &str) -> bool {
    text_of(record, field)
        .map(|value| value.to_lowercase().contains(&needle.to_lowercase()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(v: Value) -> UnifiedRecord {
        UnifiedRecord::from_fields(v.as_object().cloned().unwrap())
    }

    fn catalog() -> Vec<UnifiedRecord> {
        vec![
            rec(json!({"id": "1", "price": 1500, "color": "Navy Blue", "size": "M", "brand": "peter_england"})),
            rec(json!({"id": "2", "price": 2500, "color": "blue", "size": "L", "brand": "zara"})),
            rec(json!({"id": "3", "price": 1800, "color": "Red", "size": "m", "brand": "zara"})),
            rec(json!({"id": "4", "price": 999, "color": "Blue", "brand": "van_heusen"})),
            rec(json!({"id": "5", "color": "blue", "brand": "van_heusen"})),
        ]
    }

    fn ids(records: &[UnifiedRecord]) -> Vec<&str> {
        records.iter().filter_map(|r| r.canonical_str(CanonicalField::Id)).collect()
    }

    #[test]
    fn test_price_range_and_color() {
        let query = UnifiedQuery::new()
            .price_range(Some(1000.0), Some(2000.0))
            .color("blue");
        let out = query.apply(&catalog());
        assert_eq!(ids(&out), vec!["1"]);
    }

    #[test]
    fn test_price_bounds_inclusive() {
        let query = UnifiedQuery::new().price_range(Some(1500.0), Some(2500.0));
        assert_eq!(ids(&query.apply(&catalog())), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_missing_field_excluded() {
        let query = UnifiedQuery::new().price_range(Some(0.0), None);
        assert!(!ids(&query.apply(&catalog())).contains(&"5"));
    }

    #[test]
    fn test_size_exact_case_insensitive() {
        let query = UnifiedQuery::new().size("M");
        assert_eq!(ids(&query.apply(&catalog())), vec!["1", "3"]);
    }

    #[test]
    fn test_brand_substring() {
        let query = UnifiedQuery::new().brand("HEUSEN");
        assert_eq!(ids(&query.apply(&catalog())), vec!["4", "5"]);
    }

    #[test]
    fn test_empty_query_matches_all() {
        assert_eq!(UnifiedQuery::new().apply(&catalog()).len(), 5);
    }

    #[test]
    fn test_camel_case_body() {
        let query: UnifiedQuery =
            serde_json::from_value(json!({"minPrice": 1000, "maxPrice": 2000, "color": "blue"})).unwrap();
        assert_eq!(query.min_price, Some(1000.0));
        assert_eq!(query.max_price, Some(2000.0));
        assert_eq!(query.brand, None);
    }

    #[test]
    fn test_blank_form_body_is_no_filter() {
        let query: UnifiedQuery = serde_json::from_value(json!({
            "brand": "", "category": "", "size": "", "color": "  ",
            "minPrice": "", "maxPrice": ""
        }))
        .unwrap();
        assert_eq!(query, UnifiedQuery::default());
        assert_eq!(query.apply(&catalog()).len(), 5);
    }

    #[test]
    fn test_price_bounds_as_strings() {
        let query: UnifiedQuery =
            serde_json::from_value(json!({"minPrice": "1000", "maxPrice": " 2000 "})).unwrap();
        assert_eq!(query.min_price, Some(1000.0));
        assert_eq!(query.max_price, Some(2000.0));

        let query: UnifiedQuery = serde_json::from_value(json!({"minPrice": null})).unwrap();
        assert_eq!(query.min_price, None);
    }

    #[test]
    fn test_non_numeric_price_bound_rejected() {
        let result = serde_json::from_value::<UnifiedQuery>(json!({"maxPrice": "cheap"}));
        assert!(result.is_err());
        let result = serde_json::from_value::<UnifiedQuery>(json!({"minPrice": true}));
        assert!(result.is_err());
    }

    #[test]
    fn test_blank_filters_built_directly_match_all() {
        let query = UnifiedQuery::new().size("").category(" ");
        assert_eq!(query.apply(&catalog()).len(), 5);
    }
}
