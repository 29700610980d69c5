//! Unified error handling for the splitting engine.
//!
//! Fatal conditions (a malformed AOI, unusable input features, bad
//! configuration) are reported as [`SplitError`] and abort the run before any
//! stage executes. Localized anomalies (a degenerate tessellation, an
//! unmergeable low-count polygon) are reported as [`SplitWarning`] values in
//! the output and degrade coverage rather than aborting.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, SplitError>;

/// Fatal errors that abort a splitting run.
#[derive(Debug, Error)]
pub enum SplitError {
    /// The AOI geometry is malformed (self-intersecting, degenerate ring,
    /// non-finite coordinates). Checked at ingestion, before any stage runs.
    #[error("area of interest geometry is invalid: {reason}")]
    InvalidAoi { reason: String },

    /// An input line or building has a malformed geometry.
    #[error("input feature {index} has invalid geometry: {reason}")]
    InvalidFeature { index: usize, reason: String },

    /// No AOI was provided.
    #[error("no area of interest provided")]
    MissingAoi,

    /// A configuration parameter is out of range.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// GeoJSON input did not contain the expected geometry type.
    #[error("GeoJSON input contains no usable {expected}")]
    MissingGeometry { expected: &'static str },

    /// Failed to parse GeoJSON input.
    #[error("failed to parse GeoJSON: {0}")]
    Geojson(#[from] geojson::Error),

    /// Failed to read or write a file.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Non-fatal anomalies collected during a run.
///
/// Warnings are attached to the run output and logged; the affected polygon
/// contributes reduced (or no) task output, but the rest of the run proceeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitWarning {
    /// Voronoi construction or boundary sampling degenerated for a polygon
    /// (too few distinct sample points, collinear sites). The polygon
    /// produces no task output.
    NumericDegeneracy { polygon_id: u64, detail: String },

    /// A polygon below the minimum feature count has no touching neighbor to
    /// merge into. It is retained unmerged.
    UnmergeableIsolate {
        polygon_id: u64,
        feature_count: usize,
    },
}

impl SplitWarning {
    /// The id of the split polygon this warning concerns.
    pub fn polygon_id(&self) -> u64 {
        match self {
            SplitWarning::NumericDegeneracy { polygon_id, .. } => *polygon_id,
            SplitWarning::UnmergeableIsolate { polygon_id, .. } => *polygon_id,
        }
    }
}

impl std::fmt::Display for SplitWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitWarning::NumericDegeneracy { polygon_id, detail } => {
                write!(f, "polygon {polygon_id}: degenerate tessellation ({detail})")
            }
            SplitWarning::UnmergeableIsolate {
                polygon_id,
                feature_count,
            } => write!(
                f,
                "polygon {polygon_id}: {feature_count} features below threshold but no neighbor to merge into"
            ),
        }
    }
}

/// Extension trait for converting `Option` into geometry errors.
pub trait OptionExt<T> {
    /// Convert `None` into an [`SplitError::InvalidAoi`].
    fn ok_or_invalid_aoi(self, reason: &str) -> Result<T>;

    /// Convert `None` into an [`SplitError::InvalidFeature`].
    fn ok_or_invalid_feature(self, index: usize, reason: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_invalid_aoi(self, reason: &str) -> Result<T> {
        self.ok_or_else(|| SplitError::InvalidAoi {
            reason: reason.to_string(),
        })
    }

    fn ok_or_invalid_feature(self, index: usize, reason: &str) -> Result<T> {
        self.ok_or_else(|| SplitError::InvalidFeature {
            index,
            reason: reason.to_string(),
        })
    }
}
