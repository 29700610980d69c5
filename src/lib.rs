//! # Tasksplit
//!
//! Task-splitting engine for field mapping: partitions an Area of Interest
//! (AOI) into spatially contiguous task polygons, each containing a balanced
//! number of buildings, suitable for assignment to individual field mappers.
//!
//! The engine is a six-stage batch pipeline over in-memory geometry:
//!
//! 1. **Splitline extraction** - keep lines tagged as roads, waterways or
//!    railways as candidate task boundaries.
//! 2. **Candidate polygonization** - node the lines with the AOI boundary
//!    into a planar arrangement and trace its bounded faces.
//! 3. **Feature counting** - assign each building to the face containing its
//!    centroid.
//! 4. **Low-count merging** - fold feature-poor faces into their best
//!    touching neighbor (single pass).
//! 5. **Cluster partitioning** - k-means buildings within each face toward a
//!    target cluster size.
//! 6. **Boundary resolution** - Voronoi-tessellate building samples and
//!    union same-cluster cells into final task polygons.
//!
//! ## Features
//!
//! - **`parallel`** - fan per-polygon clustering and tessellation out across
//!   rayon worker threads.
//!
//! ## Quick Start
//!
//! ```rust
//! use geo::{polygon, Point};
//! use tasksplit::{split_aoi, Building, BuildingShape, SplitConfig};
//!
//! let aoi = polygon![
//!     (x: 0.0, y: 0.0),
//!     (x: 1.0, y: 0.0),
//!     (x: 1.0, y: 1.0),
//!     (x: 0.0, y: 1.0),
//! ];
//! let buildings = vec![
//!     Building::new(1, BuildingShape::Point(Point::new(0.2, 0.2))),
//!     Building::new(2, BuildingShape::Point(Point::new(0.5, 0.6))),
//!     Building::new(3, BuildingShape::Point(Point::new(0.8, 0.3))),
//! ];
//!
//! let output = split_aoi(&aoi, &[], buildings, &SplitConfig::default()).unwrap();
//! // No split lines: the AOI itself is the single split polygon, and three
//! // buildings fit in one cluster, so the whole AOI becomes one task.
//! assert_eq!(output.split_polygons.len(), 1);
//! assert_eq!(output.tasks.len(), 1);
//! ```

use geo::{Centroid, LineString, MultiPolygon, Point, Polygon};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// Unified error handling
pub mod error;
pub use error::{OptionExt, Result, SplitError, SplitWarning};

// Union-Find data structure for chained-merge resolution
pub mod union_find;
pub use union_find::UnionFind;

// Shared geometric utilities (coordinate snapping, densification, validation)
pub mod geo_utils;

// Stage 1: splitline extraction
pub mod extract;
pub use extract::extract_split_lines;

// Stage 2: planar arrangement and face tracing
pub mod polygonize;
pub use polygonize::polygonize;

// Stage 3: centroid-containment feature counting
pub mod count;
pub use count::count_features;

// Stage 4: low-count neighbor merging
pub mod merge;
pub use merge::merge_low_count;

// Stage 5: k-means cluster partitioning
pub mod cluster;
pub use cluster::partition_clusters;

// Stage 6: Voronoi boundary resolution
pub mod tessellate;
pub use tessellate::resolve_boundaries;

// Pipeline orchestration
pub mod pipeline;
pub use pipeline::split_aoi;

// GeoJSON ingestion and serialization boundary
pub mod geojson_io;
pub use geojson_io::{
    parse_aoi, parse_buildings, parse_line_features, to_feature_collection, OutputOptions,
};

// Synthetic scenario generation for tests and benchmarks
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// A raw tagged line feature, as downloaded for the AOI.
///
/// Only the `highway`, `waterway` and `railway` tags influence splitting;
/// everything else rides along untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineFeature {
    pub geometry: LineString<f64>,
    pub tags: BTreeMap<String, String>,
}

impl LineFeature {
    /// Create an untagged line feature.
    pub fn new(geometry: LineString<f64>) -> Self {
        Self {
            geometry,
            tags: BTreeMap::new(),
        }
    }

    /// Builder-style tag attachment.
    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }
}

/// Category of a selected split line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineKind {
    Road,
    Waterway,
    Railway,
}

impl LineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineKind::Road => "road",
            LineKind::Waterway => "waterway",
            LineKind::Railway => "railway",
        }
    }
}

/// A line feature selected as a candidate task boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitLine {
    pub geometry: LineString<f64>,
    pub kind: LineKind,
}

/// Geometry of a building: a point or a footprint polygon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BuildingShape {
    Point(Point<f64>),
    Footprint(Polygon<f64>),
}

impl BuildingShape {
    /// Representative point used for polygon assignment.
    pub fn representative_point(&self) -> Point<f64> {
        match self {
            BuildingShape::Point(p) => *p,
            BuildingShape::Footprint(poly) => poly
                .centroid()
                .unwrap_or_else(|| Point::from(poly.exterior().0[0])),
        }
    }

    /// Sample points along the shape's boundary at the given spacing.
    ///
    /// Point shapes yield a single sample. Spacing must be small relative to
    /// the containing polygon's width; too coarse a spacing starves the
    /// Voronoi tessellation of sites.
    pub fn boundary_samples(&self, spacing: f64) -> Vec<Point<f64>> {
        match self {
            BuildingShape::Point(p) => vec![*p],
            BuildingShape::Footprint(poly) => geo_utils::densify_ring(poly.exterior(), spacing),
        }
    }
}

/// A building footprint to be distributed across tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    pub id: u64,
    pub shape: BuildingShape,
    /// Owning split polygon, assigned by centroid containment once the final
    /// polygon set is known.
    pub split_polygon_id: Option<u64>,
}

impl Building {
    pub fn new(id: u64, shape: BuildingShape) -> Self {
        Self {
            id,
            shape,
            split_polygon_id: None,
        }
    }
}

/// An intermediate region bounded by split lines and/or the AOI boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitPolygon {
    /// Unique within a run; stable for identical input.
    pub id: u64,
    pub geometry: MultiPolygon<f64>,
    /// Geographic area in squared coordinate units.
    pub area: f64,
    /// Number of buildings assigned by centroid containment; `None` until
    /// the feature counter has run.
    pub feature_count: Option<usize>,
    /// Ids of contained buildings (back-references only).
    pub building_ids: Vec<u64>,
}

impl SplitPolygon {
    /// Feature count, treating "not yet counted" as zero.
    pub fn features(&self) -> usize {
        self.feature_count.unwrap_or(0)
    }
}

/// A group of buildings within one split polygon, sized toward the target
/// feature count and destined to become one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub polygon_id: u64,
    /// Local index within the owning polygon.
    pub index: usize,
    pub building_ids: Vec<u64>,
}

impl Cluster {
    /// Globally unique composite key: polygon id + local index.
    pub fn key(&self) -> String {
        format!("{}-{}", self.polygon_id, self.index)
    }
}

/// Final output region assigned to one cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPolygon {
    pub polygon_id: u64,
    pub cluster_index: usize,
    pub geometry: MultiPolygon<f64>,
}

impl TaskPolygon {
    /// Stable composite id, matching the owning cluster's key.
    pub fn id(&self) -> String {
        format!("{}-{}", self.polygon_id, self.cluster_index)
    }
}

/// Tunable parameters for a splitting run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Polygons with fewer features than this are merged into a neighbor.
    /// Default: 20
    pub min_feature_count: usize,

    /// Target number of buildings per cluster/task.
    /// Default: 10
    pub target_features_per_cluster: usize,

    /// Spacing for boundary densification before Voronoi tessellation, in
    /// coordinate-space units. Default: 5e-5 (about 1/20000 of a unit).
    /// Too coarse starves the tessellation of sites; extremely fine spacing
    /// relative to coordinate precision can destabilize it.
    pub boundary_sample_spacing: f64,

    /// Iteration cap for the Lloyd clustering loop.
    /// Default: 100
    pub max_kmeans_iterations: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            min_feature_count: 20,
            target_features_per_cluster: 10,
            boundary_sample_spacing: 5e-5,
            max_kmeans_iterations: 100,
        }
    }
}

impl SplitConfig {
    /// Check parameter ranges before a run.
    pub fn validate(&self) -> Result<()> {
        if self.min_feature_count < 1 {
            return Err(SplitError::InvalidConfig {
                reason: "min_feature_count must be at least 1".to_string(),
            });
        }
        if self.target_features_per_cluster < 1 {
            return Err(SplitError::InvalidConfig {
                reason: "target_features_per_cluster must be at least 1".to_string(),
            });
        }
        if !(self.boundary_sample_spacing > 0.0) || !self.boundary_sample_spacing.is_finite() {
            return Err(SplitError::InvalidConfig {
                reason: "boundary_sample_spacing must be a positive finite number".to_string(),
            });
        }
        if self.max_kmeans_iterations == 0 {
            return Err(SplitError::InvalidConfig {
                reason: "max_kmeans_iterations must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Complete result of a splitting run.
#[derive(Debug, Clone, Serialize)]
pub struct SplitOutput {
    /// Final task polygons; together they partition the AOI modulo
    /// zero-building polygons.
    pub tasks: Vec<TaskPolygon>,
    /// Building clusters backing the tasks.
    pub clusters: Vec<Cluster>,
    /// Final split polygons, including zero-building ones that produced no
    /// task.
    pub split_polygons: Vec<SplitPolygon>,
    /// Input buildings with their owning polygon assigned.
    pub buildings: Vec<Building>,
    /// Non-fatal anomalies encountered during the run.
    pub warnings: Vec<SplitWarning>,
}
