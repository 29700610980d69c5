//! Pipeline orchestration.
//!
//! Runs the six stages in order, each a pure function from one immutable
//! snapshot to the next. Stages execute strictly sequentially (merging and
//! clustering need the complete polygon set), but the per-polygon work of
//! stages 5 and 6 is independent and fans out across rayon workers when the
//! `parallel` feature is enabled.

use geo::Polygon;
use log::{debug, info};
use std::collections::BTreeMap;

use crate::count::{assign_owners, count_features};
use crate::error::{Result, SplitError, SplitWarning};
use crate::geo_utils::{validate_line, validate_polygon};
use crate::{
    cluster, extract, merge, polygonize, tessellate, Building, BuildingShape, Cluster, LineFeature,
    SplitConfig, SplitOutput, SplitPolygon, TaskPolygon,
};

/// Run the full splitting pipeline over one AOI.
///
/// Fatal errors (invalid AOI, invalid features, bad configuration) abort
/// before any stage runs. All other anomalies surface as warnings on the
/// output and degrade coverage for the affected polygon only.
pub fn split_aoi(
    aoi: &Polygon<f64>,
    lines: &[LineFeature],
    buildings: Vec<Building>,
    config: &SplitConfig,
) -> Result<SplitOutput> {
    config.validate()?;
    validate_inputs(aoi, lines, &buildings)?;

    let mut buildings = buildings;
    let mut warnings: Vec<SplitWarning> = Vec::new();

    // Stage 1: splitline extraction.
    let split_lines = extract::extract_split_lines(lines);
    info!(
        "extracted {} split lines from {} tagged features",
        split_lines.len(),
        lines.len()
    );

    // Stage 2: candidate polygonization.
    let candidates = polygonize::polygonize(aoi, &split_lines);
    info!("polygonized AOI into {} candidate polygons", candidates.len());

    // Stage 3: feature counting.
    let counted = count_features(candidates, &buildings);

    // Stage 4: low-count merging, then a containment recount (membership is
    // recomputed, never summed).
    let merge_outcome = merge::merge_low_count(counted, config.min_feature_count);
    warnings.extend(merge_outcome.warnings);
    let polygons = count_features(merge_outcome.polygons, &buildings);
    info!("{} split polygons after low-count merge", polygons.len());

    assign_owners(&polygons, &mut buildings);
    let building_map: BTreeMap<u64, Building> =
        buildings.iter().map(|b| (b.id, b.clone())).collect();

    // Stages 5 and 6 per feature-rich polygon, independent work units.
    let rich: Vec<&SplitPolygon> = polygons.iter().filter(|p| p.features() > 0).collect();
    let results = partition_and_tessellate(&rich, &building_map, config);

    let mut tasks: Vec<TaskPolygon> = Vec::new();
    let mut clusters: Vec<Cluster> = Vec::new();
    for (polygon_clusters, outcome) in results {
        debug!(
            "polygon {}: {} clusters, {} tasks",
            polygon_clusters.first().map(|c| c.polygon_id).unwrap_or(0),
            polygon_clusters.len(),
            outcome.tasks.len()
        );
        clusters.extend(polygon_clusters);
        tasks.extend(outcome.tasks);
        warnings.extend(outcome.warnings);
    }

    info!(
        "split complete: {} tasks, {} clusters, {} warnings",
        tasks.len(),
        clusters.len(),
        warnings.len()
    );
    Ok(SplitOutput {
        tasks,
        clusters,
        split_polygons: polygons,
        buildings,
        warnings,
    })
}

type PolygonResult = (Vec<Cluster>, tessellate::TessellationOutcome);

#[cfg(feature = "parallel")]
fn partition_and_tessellate(
    polygons: &[&SplitPolygon],
    buildings: &BTreeMap<u64, Building>,
    config: &SplitConfig,
) -> Vec<PolygonResult> {
    use rayon::prelude::*;
    polygons
        .par_iter()
        .map(|polygon| process_polygon(polygon, buildings, config))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn partition_and_tessellate(
    polygons: &[&SplitPolygon],
    buildings: &BTreeMap<u64, Building>,
    config: &SplitConfig,
) -> Vec<PolygonResult> {
    polygons
        .iter()
        .map(|polygon| process_polygon(polygon, buildings, config))
        .collect()
}

fn process_polygon(
    polygon: &SplitPolygon,
    buildings: &BTreeMap<u64, Building>,
    config: &SplitConfig,
) -> PolygonResult {
    let clusters = cluster::partition_clusters(
        polygon,
        buildings,
        config.target_features_per_cluster,
        config.max_kmeans_iterations,
    );
    let outcome = tessellate::resolve_boundaries(
        polygon,
        &clusters,
        buildings,
        config.boundary_sample_spacing,
    );
    (clusters, outcome)
}

/// Fail fast on malformed geometry, before any stage runs. Polygonization
/// and Voronoi construction both assume valid planar input.
fn validate_inputs(
    aoi: &Polygon<f64>,
    lines: &[LineFeature],
    buildings: &[Building],
) -> Result<()> {
    if aoi.exterior().0.is_empty() {
        return Err(SplitError::MissingAoi);
    }
    validate_polygon(aoi).map_err(|reason| SplitError::InvalidAoi { reason })?;

    for (index, line) in lines.iter().enumerate() {
        validate_line(&line.geometry)
            .map_err(|reason| SplitError::InvalidFeature { index, reason })?;
    }
    for (index, building) in buildings.iter().enumerate() {
        match &building.shape {
            BuildingShape::Point(p) => {
                if !p.x().is_finite() || !p.y().is_finite() {
                    return Err(SplitError::InvalidFeature {
                        index,
                        reason: "building point has non-finite coordinates".to_string(),
                    });
                }
            }
            BuildingShape::Footprint(poly) => {
                validate_polygon(poly)
                    .map_err(|reason| SplitError::InvalidFeature { index, reason })?;
            }
        }
    }
    Ok(())
}
