//! Low-count merging (stage 4).
//!
//! Every polygon below the minimum feature threshold is merged into its best
//! touching neighbor. "Touching" means sharing a boundary of non-zero length;
//! corner contact does not qualify, which rules out degenerate
//! corner-adjacency merges. Neighbor choice prefers the highest feature
//! count, then the largest area, then the lowest id.
//!
//! This is a single pass, not a fixed-point iteration: a polygon still below
//! threshold after one merge round is accepted as-is (a documented
//! limitation). Chained selections within the one pass (A merges into B
//! while B merges into C) are resolved through a union-find, so each chain
//! collapses into one geometry carrying the final target's id. Feature
//! counts are recomputed by centroid containment after merging, never by
//! addition, so the caller must rerun the feature counter on the result.

use geo::{Area, BooleanOps, MultiPolygon};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::SplitWarning;
use crate::geo_utils::{edge_key, EdgeKey};
use crate::union_find::UnionFind;
use crate::SplitPolygon;

/// Result of the merge pass.
#[derive(Debug)]
pub struct MergeOutcome {
    /// Merged polygon set, sorted by id, with stale counts cleared.
    pub polygons: Vec<SplitPolygon>,
    /// One `UnmergeableIsolate` per low polygon with no touching neighbor.
    pub warnings: Vec<SplitWarning>,
}

/// Merge each polygon with fewer than `min_feature_count` features into its
/// best touching neighbor.
pub fn merge_low_count(polygons: Vec<SplitPolygon>, min_feature_count: usize) -> MergeOutcome {
    let neighbors = neighbor_map(&polygons);
    let index_by_id: BTreeMap<u64, usize> =
        polygons.iter().enumerate().map(|(i, p)| (p.id, i)).collect();

    let mut uf: UnionFind<u64> = UnionFind::with_capacity(polygons.len());
    for polygon in &polygons {
        uf.make_set(polygon.id);
    }

    let mut warnings = Vec::new();
    let mut merged_any = false;
    for polygon in &polygons {
        if polygon.features() >= min_feature_count {
            continue;
        }
        let touching = neighbors.get(&polygon.id);
        let best = touching.and_then(|ids| {
            ids.iter()
                .map(|id| &polygons[index_by_id[id]])
                .max_by(|a, b| {
                    a.features()
                        .cmp(&b.features())
                        .then_with(|| a.area.partial_cmp(&b.area).unwrap_or(std::cmp::Ordering::Equal))
                        .then_with(|| b.id.cmp(&a.id))
                })
        });
        match best {
            Some(neighbor) => {
                debug!(
                    "merging low polygon {} ({} features) into neighbor {} ({} features)",
                    polygon.id,
                    polygon.features(),
                    neighbor.id,
                    neighbor.features()
                );
                uf.union(&polygon.id, &neighbor.id);
                merged_any = true;
            }
            None => {
                warnings.push(SplitWarning::UnmergeableIsolate {
                    polygon_id: polygon.id,
                    feature_count: polygon.features(),
                });
            }
        }
    }

    if !merged_any {
        return MergeOutcome { polygons, warnings };
    }

    // Collapse each union-find group into one polygon. The surviving id is
    // the group's best member under the same (count, area, id) ordering,
    // preferring members that were not themselves below threshold.
    let mut groups: BTreeMap<u64, Vec<u64>> = BTreeMap::new();
    for polygon in &polygons {
        groups.entry(uf.find(&polygon.id)).or_default().push(polygon.id);
    }

    let mut merged: Vec<SplitPolygon> = Vec::with_capacity(groups.len());
    for ids in groups.into_values() {
        let members: Vec<&SplitPolygon> = ids.iter().map(|id| &polygons[index_by_id[id]]).collect();
        let survivor = members
            .iter()
            .max_by(|a, b| {
                let a_rich = a.features() >= min_feature_count;
                let b_rich = b.features() >= min_feature_count;
                a_rich
                    .cmp(&b_rich)
                    .then_with(|| a.features().cmp(&b.features()))
                    .then_with(|| a.area.partial_cmp(&b.area).unwrap_or(std::cmp::Ordering::Equal))
                    .then_with(|| b.id.cmp(&a.id))
            })
            .expect("merge group is never empty");

        let geometry = members
            .iter()
            .skip(1)
            .fold(members[0].geometry.clone(), |acc, member| {
                acc.union(&member.geometry)
            });
        let area = geometry.unsigned_area();
        merged.push(SplitPolygon {
            id: survivor.id,
            geometry,
            area,
            feature_count: None,
            building_ids: Vec::new(),
        });
    }
    merged.sort_by_key(|p| p.id);

    MergeOutcome {
        polygons: merged,
        warnings,
    }
}

/// Adjacency over the candidate polygon set: two polygons are neighbors iff
/// they share at least one full snapped boundary edge. Polygonization
/// guarantees touching faces share exact edges, so shared-edge keys detect
/// non-zero-length shared boundaries without float predicates; polygons
/// meeting only at a point share no edge and do not qualify.
fn neighbor_map(polygons: &[SplitPolygon]) -> BTreeMap<u64, BTreeSet<u64>> {
    let mut owners_by_edge: BTreeMap<EdgeKey, Vec<u64>> = BTreeMap::new();
    for polygon in polygons {
        for edge in polygon_edges(&polygon.geometry) {
            owners_by_edge.entry(edge).or_default().push(polygon.id);
        }
    }

    let mut neighbors: BTreeMap<u64, BTreeSet<u64>> = BTreeMap::new();
    for owners in owners_by_edge.values() {
        for a in owners {
            for b in owners {
                if a != b {
                    neighbors.entry(*a).or_default().insert(*b);
                }
            }
        }
    }
    neighbors
}

fn polygon_edges(geometry: &MultiPolygon<f64>) -> BTreeSet<EdgeKey> {
    let mut edges = BTreeSet::new();
    for polygon in &geometry.0 {
        for segment in polygon.exterior().lines() {
            edges.insert(edge_key(segment.start, segment.end));
        }
        for interior in polygon.interiors() {
            for segment in interior.lines() {
                edges.insert(edge_key(segment.start, segment.end));
            }
        }
    }
    edges
}
