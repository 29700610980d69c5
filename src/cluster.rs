//! Cluster partitioning (stage 5).
//!
//! Within each feature-rich split polygon, buildings are grouped into
//! near-equal clusters by Lloyd-style k-means over their representative
//! points. The cluster count for a polygon with `n` features and target
//! cluster size `t` is `n / t + 1` (integer division), capped at `n` so no
//! cluster is ever empty.
//!
//! Seeding is k-means++ with a generator seeded from the polygon id, so the
//! partition is deterministic for identical input. If an iteration leaves a
//! cluster empty, the point farthest from its own centroid is reseeded into
//! it from a cluster that can spare one, preserving the cluster-count
//! invariant even when the iteration budget runs out mid-reseed.

use geo::Point;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

use crate::{Building, Cluster, SplitPolygon};

/// Partition one polygon's buildings into clusters.
///
/// Returns clusters with ascending local indices; every member building id
/// appears in exactly one cluster. A polygon with zero buildings produces no
/// clusters.
pub fn partition_clusters(
    polygon: &SplitPolygon,
    buildings: &BTreeMap<u64, Building>,
    target_features_per_cluster: usize,
    max_iterations: usize,
) -> Vec<Cluster> {
    let members: Vec<(u64, Point<f64>)> = polygon
        .building_ids
        .iter()
        .filter_map(|id| {
            buildings
                .get(id)
                .map(|b| (*id, b.shape.representative_point()))
        })
        .collect();
    if members.is_empty() {
        return Vec::new();
    }

    let k = (members.len() / target_features_per_cluster + 1).min(members.len());
    let points: Vec<Point<f64>> = members.iter().map(|(_, p)| *p).collect();
    let assignment = lloyd_kmeans(&points, k, polygon.id, max_iterations);

    let mut clusters: Vec<Cluster> = (0..k)
        .map(|index| Cluster {
            polygon_id: polygon.id,
            index,
            building_ids: Vec::new(),
        })
        .collect();
    for (slot, &(id, _)) in assignment.iter().zip(members.iter()) {
        clusters[*slot].building_ids.push(id);
    }
    for cluster in &mut clusters {
        cluster.building_ids.sort_unstable();
    }
    clusters
}

/// Lloyd k-means over 2D points with k-means++ seeding.
///
/// Returns the cluster index per point. Ties in the nearest-centroid test go
/// to the lowest index, keeping the assignment deterministic.
fn lloyd_kmeans(points: &[Point<f64>], k: usize, seed: u64, max_iterations: usize) -> Vec<usize> {
    debug_assert!(k >= 1 && k <= points.len());
    if k == 1 {
        return vec![0; points.len()];
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids = seed_centroids(points, k, &mut rng);
    let mut assignment = vec![0usize; points.len()];

    for _ in 0..max_iterations {
        let mut changed = false;
        for (i, point) in points.iter().enumerate() {
            let nearest = nearest_centroid(point, &centroids);
            if assignment[i] != nearest {
                assignment[i] = nearest;
                changed = true;
            }
        }

        // Reseed any emptied cluster with the point currently worst served
        // by its own centroid. Donors are limited to clusters with at least
        // two members, so a reseed can never empty another cluster; whenever
        // a slot is empty, k <= n guarantees such a donor exists.
        let mut sizes = vec![0usize; k];
        for &slot in &assignment {
            sizes[slot] += 1;
        }
        for slot in 0..k {
            if sizes[slot] > 0 {
                continue;
            }
            let donor = (0..points.len())
                .filter(|&i| sizes[assignment[i]] > 1)
                .max_by(|&a, &b| {
                    let da = distance_sq(&points[a], &centroids[assignment[a]]);
                    let db = distance_sq(&points[b], &centroids[assignment[b]]);
                    da.partial_cmp(&db)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then(b.cmp(&a))
                });
            if let Some(point_index) = donor {
                sizes[assignment[point_index]] -= 1;
                sizes[slot] += 1;
                assignment[point_index] = slot;
                centroids[slot] = points[point_index];
                changed = true;
            }
        }

        if !changed {
            break;
        }

        for (slot, centroid) in centroids.iter_mut().enumerate() {
            let mut sum_x = 0.0;
            let mut sum_y = 0.0;
            let mut count = 0usize;
            for (i, point) in points.iter().enumerate() {
                if assignment[i] == slot {
                    sum_x += point.x();
                    sum_y += point.y();
                    count += 1;
                }
            }
            if count > 0 {
                *centroid = Point::new(sum_x / count as f64, sum_y / count as f64);
            }
        }
    }

    assignment
}

/// k-means++ seeding: the first centroid is drawn uniformly, each subsequent
/// one with probability proportional to squared distance from the nearest
/// centroid chosen so far.
fn seed_centroids(points: &[Point<f64>], k: usize, rng: &mut StdRng) -> Vec<Point<f64>> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..points.len())]);

    while centroids.len() < k {
        let weights: Vec<f64> = points
            .iter()
            .map(|p| {
                centroids
                    .iter()
                    .map(|c| distance_sq(p, c))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            // All remaining points coincide with a centroid; duplicate one.
            centroids.push(points[centroids.len() % points.len()]);
            continue;
        }
        let mut threshold = rng.gen::<f64>() * total;
        let mut pick = points.len() - 1;
        for (i, w) in weights.iter().enumerate() {
            if threshold <= *w {
                pick = i;
                break;
            }
            threshold -= w;
        }
        centroids.push(points[pick]);
    }
    centroids
}

fn nearest_centroid(point: &Point<f64>, centroids: &[Point<f64>]) -> usize {
    let mut best = 0usize;
    let mut best_dist = f64::INFINITY;
    for (i, centroid) in centroids.iter().enumerate() {
        let d = distance_sq(point, centroid);
        if d < best_dist {
            best = i;
            best_dist = d;
        }
    }
    best
}

fn distance_sq(a: &Point<f64>, b: &Point<f64>) -> f64 {
    let dx = a.x() - b.x();
    let dy = a.y() - b.y();
    dx * dx + dy * dy
}
