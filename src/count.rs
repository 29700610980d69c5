//! Feature counting (stage 3).
//!
//! Joins buildings to split polygons by centroid containment and tallies the
//! feature count per polygon. An R-tree over polygon bounds pre-filters the
//! candidates; the exact containment test runs against candidates in
//! ascending id order, so a centroid lying exactly on a shared boundary is
//! assigned to exactly one polygon, deterministically.
//!
//! Counting is idempotent for unchanged polygon geometry, and is rerun from
//! scratch after every merge pass (membership is recomputed by containment,
//! never carried forward).

use geo::{BoundingRect, Contains, Intersects};
use rstar::{RTree, RTreeObject, AABB};

use crate::{Building, SplitPolygon};

/// Polygon bounds wrapper for R-tree candidate filtering.
#[derive(Debug, Clone)]
struct PolygonBounds {
    position: usize,
    id: u64,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for PolygonBounds {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Assign each building to the polygon containing its representative point
/// and record per-polygon counts and membership.
///
/// Returns the polygons with `feature_count` and `building_ids` populated
/// (ids sorted ascending). Buildings whose centroid falls in no polygon are
/// counted nowhere; polygons with zero assigned buildings are valid and flow
/// forward unchanged.
pub fn count_features(polygons: Vec<SplitPolygon>, buildings: &[Building]) -> Vec<SplitPolygon> {
    let mut polygons = polygons;
    for polygon in &mut polygons {
        polygon.building_ids.clear();
        polygon.feature_count = Some(0);
    }

    let bounds: Vec<PolygonBounds> = polygons
        .iter()
        .enumerate()
        .filter_map(|(position, polygon)| {
            polygon.geometry.bounding_rect().map(|rect| PolygonBounds {
                position,
                id: polygon.id,
                envelope: AABB::from_corners(
                    [rect.min().x, rect.min().y],
                    [rect.max().x, rect.max().y],
                ),
            })
        })
        .collect();
    let tree = RTree::bulk_load(bounds);

    for building in buildings {
        let point = building.shape.representative_point();
        let probe = AABB::from_corners([point.x(), point.y()], [point.x(), point.y()]);

        let mut candidates: Vec<&PolygonBounds> =
            tree.locate_in_envelope_intersecting(&probe).collect();
        candidates.sort_by_key(|c| c.id);

        // Strict containment first; boundary contact as the deterministic
        // fallback for centroids sitting exactly on a shared edge.
        let chosen = candidates
            .iter()
            .find(|c| polygons[c.position].geometry.contains(&point))
            .or_else(|| {
                candidates
                    .iter()
                    .find(|c| polygons[c.position].geometry.intersects(&point))
            })
            .map(|c| c.position);

        if let Some(position) = chosen {
            polygons[position].building_ids.push(building.id);
        }
    }

    for polygon in &mut polygons {
        polygon.building_ids.sort_unstable();
        polygon.feature_count = Some(polygon.building_ids.len());
    }
    polygons
}

/// Record the owning polygon on each building, from the counted membership.
pub fn assign_owners(polygons: &[SplitPolygon], buildings: &mut [Building]) {
    let owner_by_building: std::collections::BTreeMap<u64, u64> = polygons
        .iter()
        .flat_map(|polygon| polygon.building_ids.iter().map(|id| (*id, polygon.id)))
        .collect();
    for building in buildings.iter_mut() {
        building.split_polygon_id = owner_by_building.get(&building.id).copied();
    }
}
