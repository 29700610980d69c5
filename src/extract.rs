//! Splitline extraction (stage 1).
//!
//! Selects the linear features that may serve as task boundaries: anything
//! carrying a non-null `highway`, `waterway` or `railway` tag. No spatial
//! clipping happens here; polygonization against the AOI boundary clips
//! implicitly downstream. An empty result is valid and yields a single split
//! polygon (the AOI itself) in stage 2.

use crate::{LineFeature, LineKind, SplitLine};

/// Tag keys that qualify a line as a split-line candidate, checked in order.
const SPLIT_TAGS: [(&str, LineKind); 3] = [
    ("highway", LineKind::Road),
    ("waterway", LineKind::Waterway),
    ("railway", LineKind::Railway),
];

/// Filter tagged lines down to split-line candidates.
///
/// A line qualifies if any of the three boundary tags is present with a
/// non-empty value; the first matching tag (highway, then waterway, then
/// railway) determines its [`LineKind`].
pub fn extract_split_lines(lines: &[LineFeature]) -> Vec<SplitLine> {
    lines
        .iter()
        .filter_map(|feature| {
            classify(feature).map(|kind| SplitLine {
                geometry: feature.geometry.clone(),
                kind,
            })
        })
        .collect()
}

/// Determine whether a line qualifies as a split line, and as what kind.
pub fn classify(feature: &LineFeature) -> Option<LineKind> {
    for (key, kind) in SPLIT_TAGS {
        match feature.tags.get(key) {
            Some(value) if !value.is_empty() && value != "null" => return Some(kind),
            _ => {}
        }
    }
    None
}
