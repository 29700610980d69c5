//! Boundary resolution (stage 6).
//!
//! Converts building clusters into final task boundaries. Each building's
//! geometry is densified into boundary sample points, a Voronoi diagram is
//! built over all samples within the owning split polygon, every cell is
//! clipped to the polygon, and same-cluster cells are unioned into one task
//! polygon. Voronoi cells tile the plane and clipping preserves boundaries,
//! so the tasks of one polygon partition it exactly (no gaps, no overlaps).
//!
//! A polygon whose buildings form a single cluster short-circuits: the whole
//! polygon is the task. Degenerate inputs (fewer than three distinct sample
//! points, collinear sites the tessellation rejects) yield a
//! [`SplitWarning::NumericDegeneracy`] and no tasks for that polygon rather
//! than aborting the run.

use geo::{BooleanOps, BoundingRect, Coord, LineString, MultiPolygon, Polygon};
use log::warn;
use std::collections::{BTreeMap, BTreeSet};
use voronoice::{BoundingBox, Point as VoronoiPoint, VoronoiBuilder};

use crate::error::SplitWarning;
use crate::geo_utils::{expand_rect, quantize, QuantKey};
use crate::{Building, Cluster, SplitPolygon, TaskPolygon};

/// Result of tessellating one split polygon.
#[derive(Debug, Default)]
pub struct TessellationOutcome {
    pub tasks: Vec<TaskPolygon>,
    pub warnings: Vec<SplitWarning>,
}

/// Resolve the task boundaries for one split polygon.
///
/// `clusters` must be the clusters owned by this polygon. Polygons that own
/// no clusters produce no tasks.
pub fn resolve_boundaries(
    polygon: &SplitPolygon,
    clusters: &[Cluster],
    buildings: &BTreeMap<u64, Building>,
    sample_spacing: f64,
) -> TessellationOutcome {
    let mut outcome = TessellationOutcome::default();
    let occupied: Vec<&Cluster> = clusters.iter().filter(|c| !c.building_ids.is_empty()).collect();
    if occupied.is_empty() {
        return outcome;
    }

    // A single cluster owns the whole polygon; no tessellation needed.
    if occupied.len() == 1 {
        outcome.tasks.push(TaskPolygon {
            polygon_id: polygon.id,
            cluster_index: occupied[0].index,
            geometry: polygon.geometry.clone(),
        });
        return outcome;
    }

    let samples = collect_samples(&occupied, buildings, sample_spacing);
    if samples.len() < 3 {
        degenerate(
            &mut outcome,
            polygon.id,
            format!("{} distinct sample points, need at least 3", samples.len()),
        );
        return outcome;
    }

    let Some(rect) = polygon.geometry.bounding_rect() else {
        degenerate(&mut outcome, polygon.id, "polygon has no extent".to_string());
        return outcome;
    };
    let bounds = expand_rect(rect, 0.2);
    let sites: Vec<VoronoiPoint> = samples
        .iter()
        .map(|(c, _)| VoronoiPoint { x: c.x, y: c.y })
        .collect();

    let diagram = VoronoiBuilder::default()
        .set_sites(sites)
        .set_bounding_box(BoundingBox::new(
            VoronoiPoint {
                x: bounds.center().x,
                y: bounds.center().y,
            },
            bounds.width(),
            bounds.height(),
        ))
        .build();

    let Some(diagram) = diagram else {
        degenerate(
            &mut outcome,
            polygon.id,
            "Voronoi construction rejected the sample sites".to_string(),
        );
        return outcome;
    };

    // Union each cell, clipped to the owning polygon, into its cluster.
    let mut merged: BTreeMap<usize, MultiPolygon<f64>> = BTreeMap::new();
    for cell in diagram.iter_cells() {
        let ring: Vec<Coord<f64>> = cell
            .iter_vertices()
            .map(|v| Coord { x: v.x, y: v.y })
            .collect();
        if ring.len() < 3 {
            continue;
        }
        let cell_geometry = MultiPolygon(vec![Polygon::new(LineString::new(ring), vec![])]);
        let clipped = cell_geometry.intersection(&polygon.geometry);
        if clipped.0.is_empty() {
            continue;
        }
        let cluster_index = samples[cell.site()].1;
        merged
            .entry(cluster_index)
            .and_modify(|acc| *acc = acc.union(&clipped))
            .or_insert(clipped);
    }

    for (cluster_index, geometry) in merged {
        outcome.tasks.push(TaskPolygon {
            polygon_id: polygon.id,
            cluster_index,
            geometry,
        });
    }
    outcome
}

/// Densify every member building into (sample point, cluster index) pairs,
/// deduplicated on the snap grid (duplicate sites break the tessellation).
/// The first cluster to claim a grid cell keeps it.
fn collect_samples(
    clusters: &[&Cluster],
    buildings: &BTreeMap<u64, Building>,
    sample_spacing: f64,
) -> Vec<(Coord<f64>, usize)> {
    let mut seen: BTreeSet<QuantKey> = BTreeSet::new();
    let mut samples = Vec::new();
    for cluster in clusters {
        for building_id in &cluster.building_ids {
            let Some(building) = buildings.get(building_id) else {
                continue;
            };
            for point in building.shape.boundary_samples(sample_spacing) {
                let coord = Coord {
                    x: point.x(),
                    y: point.y(),
                };
                if seen.insert(quantize(coord)) {
                    samples.push((coord, cluster.index));
                }
            }
        }
    }
    samples
}

fn degenerate(outcome: &mut TessellationOutcome, polygon_id: u64, detail: String) {
    warn!("polygon {polygon_id}: degenerate tessellation: {detail}");
    outcome.warnings.push(SplitWarning::NumericDegeneracy {
        polygon_id,
        detail,
    });
}
