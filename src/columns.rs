use crate::formats::FormatProfile;
use crate::models::{ColumnMap, HeaderCandidate, HeaderStrategy};
use crate::text::normalize_label;

/// Map header labels onto canonical fields, left to right.
///
/// Dictionary headers use exact synonym lookup; fused and anchored headers
/// use the ordered pattern list. A field already claimed by an earlier
/// column is never reassigned.
pub fn map_columns(labels: &[String], profile: &FormatProfile, strategy: HeaderStrategy) -> ColumnMap {
    let mut map = ColumnMap::new();
    for (idx, label) in labels.iter().enumerate() {
        let norm = normalize_label(label);
        if norm.is_empty() {
            continue;
        }
        let field = match strategy {
            HeaderStrategy::Dictionary => profile.lookup_synonym(&norm),
            HeaderStrategy::Fusion | HeaderStrategy::Anchor => profile.match_pattern(&norm),
        };
        if let Some(field) = field {
            map.claim(field, idx);
        }
    }
    map
}

pub fn map_header(header: &HeaderCandidate, profile: &FormatProfile) -> ColumnMap {
    map_columns(&header.labels, profile, header.strategy)
}
