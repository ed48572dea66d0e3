//! Canonical product vocabulary
//!
//! Every source is mapped onto this fixed set of fields. The enumeration
//! order is significant: schema detection walks the fields in this order,
//! so mappings are reproducible across runs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the unified-schema attribute names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalField {
    Id,
    Name,
    Category,
    Price,
    Size,
    Color,
    Stock,
    Brand,
}

/// Declared semantic type of a canonical field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Number,
    Boolean,
}

impl CanonicalField {
    /// All canonical fields in declaration order.
    pub const ALL: [CanonicalField; 8] = [
        CanonicalField::Id,
        CanonicalField::Name,
        CanonicalField::Category,
        CanonicalField::Price,
        CanonicalField::Size,
        CanonicalField::Color,
        CanonicalField::Stock,
        CanonicalField::Brand,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Id => "id",
            CanonicalField::Name => "name",
            CanonicalField::Category => "category",
            CanonicalField::Price => "price",
            CanonicalField::Size => "size",
            CanonicalField::Color => "color",
            CanonicalField::Stock => "stock",
            CanonicalField::Brand => "brand",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            CanonicalField::Price | CanonicalField::Stock => FieldKind::Number,
            _ => FieldKind::String,
        }
    }

    /// Completeness hint for reporting. Never enforced on records.
    pub fn required(&self) -> bool {
        !matches!(
            self,
            CanonicalField::Size | CanonicalField::Color | CanonicalField::Stock
        )
    }

    /// Lowercase synonym tokens, in match-priority order.
    pub fn synonyms(&self) -> &'static [&'static str] {
        match self {
            CanonicalField::Id => &["id", "product_id", "item_id", "_id"],
            CanonicalField::Name => &["name", "product_name", "item_name", "product_title", "title"],
            CanonicalField::Category => &["category", "type", "product_type", "item_type"],
            CanonicalField::Price => &["price", "cost", "retail_price", "amount"],
            CanonicalField::Size => &["size", "dimension", "size_info"],
            CanonicalField::Color => &["color", "colour", "shade", "color_variant"],
            CanonicalField::Stock => &["stock", "quantity", "available_quantity", "inventory_count"],
            CanonicalField::Brand => &["brand", "brand_name", "brand_info"],
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CanonicalField::ALL
            .iter()
            .copied()
            .find(|f| f.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown canonical field: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_order() {
        let names: Vec<&str> = CanonicalField::ALL.iter().map(|f| f.as_str()).collect();
        assert_eq!(
            names,
            vec!["id", "name", "category", "price", "size", "color", "stock", "brand"]
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(CanonicalField::Price.kind(), FieldKind::Number);
        assert_eq!(CanonicalField::Stock.kind(), FieldKind::Number);
        assert_eq!(CanonicalField::Color.kind(), FieldKind::String);
    }

    #[test]
    fn test_synonyms_are_lowercase() {
        for field in CanonicalField::ALL {
            for syn in field.synonyms() {
                assert_eq!(*syn, syn.to_lowercase());
            }
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!("PRICE".parse::<CanonicalField>(), Ok(CanonicalField::Price));
        assert!("weight".parse::<CanonicalField>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&CanonicalField::Category).unwrap();
        assert_eq!(json, "\"category\"");
    }
}
