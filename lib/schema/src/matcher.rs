//! Similarity matching between raw field names and canonical synonyms
//!
//! Scores are Sørensen–Dice coefficients over character bigrams, in
//! range [0.0, 1.0] where 1.0 means identical.

use serde::{Deserialize, Serialize};
use unicat_core::CanonicalField;

/// A match must score strictly above this to be accepted.
pub const CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Winning raw field for a canonical field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMatch {
    pub field: String,
    pub confidence: f64,
}

/// Score a raw field name against one synonym token
///
/// # Arguments
/// * `raw` - Raw field name as reported by the source
/// * `synonym` - Lowercase synonym token
///
/// # Returns
/// Similarity score in [0.0, 1.0]
pub fn score(raw: &str, synonym: &str) -> f64 {
    strsim::sorensen_dice(&raw.to_lowercase(), &synonym.to_lowercase())
}

/// Find the raw field that best represents `canonical`
///
/// Synonyms are tried in declaration order and raw fields in source
/// order; only a strictly higher score replaces the current best, so ties
/// go to the earlier synonym, then to the earlier raw field.
///
/// Returns `None` when nothing clears [`CONFIDENCE_THRESHOLD`].
pub fn find_best_match<S: AsRef<str>>(canonical: CanonicalField, raw_fields: &[S]) -> Option<FieldMatch> {
    let mut best: Option<FieldMatch> = None;

    for synonym in canonical.synonyms() {
        for raw in raw_fields {
            let raw = raw.as_ref();
            let similarity = score(raw, synonym);
            if similarity <= CONFIDENCE_THRESHOLD {
                continue;
            }
            let better = best
                .as_ref()
                .map(|current| similarity > current.confidence)
                .unwrap_or(true);
            if better {
                best = Some(FieldMatch {
                    field: raw.to_string(),
                    confidence: similarity,
                });
            }
        }
    }

    best
}
