//! Tests for low-count merging

use geo::{line_string, polygon, Point, Polygon};
use tasksplit::count::count_features;
use tasksplit::merge::merge_low_count;
use tasksplit::{polygonize, Building, BuildingShape, LineKind, SplitLine, SplitWarning};

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

fn unit_square() -> Polygon<f64> {
    polygon![
        (x: 0.0, y: 0.0),
        (x: 1.0, y: 0.0),
        (x: 1.0, y: 1.0),
        (x: 0.0, y: 1.0),
    ]
}

fn road(x: f64) -> SplitLine {
    SplitLine {
        geometry: line_string![(x: x, y: -0.1), (x: x, y: 1.1)],
        kind: LineKind::Road,
    }
}

/// Scatter `count` point buildings in the given x range.
fn scatter(count: usize, x_min: f64, x_max: f64, first_id: u64) -> Vec<Building> {
    (0..count)
        .map(|i| {
            let t = (i as f64 + 0.5) / count as f64;
            let x = x_min + t * (x_max - x_min);
            let y = 0.1 + 0.8 * ((i * 7 % count) as f64 / count as f64);
            Building::new(first_id + i as u64, BuildingShape::Point(Point::new(x, y)))
        })
        .collect()
}

#[test]
fn test_low_polygon_merges_into_neighbor() {
    let polygons = polygonize(&unit_square(), &[road(0.5)]);
    let mut buildings = scatter(5, 0.05, 0.45, 1);
    buildings.extend(scatter(25, 0.55, 0.95, 100));

    let counted = count_features(polygons, &buildings);
    assert_eq!(counted[0].feature_count, Some(5));
    assert_eq!(counted[1].feature_count, Some(25));

    let outcome = merge_low_count(counted, 20);
    assert_eq!(outcome.polygons.len(), 1);
    assert!(outcome.warnings.is_empty());
    // Survivor keeps the rich neighbor's id and counts are left stale.
    assert_eq!(outcome.polygons[0].id, 2);
    assert_eq!(outcome.polygons[0].feature_count, None);
    assert!(approx_eq(outcome.polygons[0].area, 1.0, 1e-9));

    let recounted = count_features(outcome.polygons, &buildings);
    assert_eq!(recounted[0].feature_count, Some(30));
}

#[test]
fn test_rich_polygons_are_untouched() {
    let polygons = polygonize(&unit_square(), &[road(0.5)]);
    let mut buildings = scatter(25, 0.05, 0.45, 1);
    buildings.extend(scatter(25, 0.55, 0.95, 100));

    let counted = count_features(polygons, &buildings);
    let outcome = merge_low_count(counted, 20);

    assert_eq!(outcome.polygons.len(), 2);
    assert!(outcome.warnings.is_empty());
}

#[test]
fn test_chained_merges_collapse_into_one() {
    // Three strips, all below threshold: 1 picks a neighbor, which itself
    // merges onward. The chain must end in a single polygon.
    let polygons = polygonize(&unit_square(), &[road(0.33), road(0.66)]);
    assert_eq!(polygons.len(), 3);

    let mut buildings = scatter(2, 0.05, 0.28, 1);
    buildings.extend(scatter(3, 0.38, 0.61, 100));
    buildings.extend(scatter(4, 0.71, 0.95, 200));

    let counted = count_features(polygons, &buildings);
    let outcome = merge_low_count(counted, 20);

    assert_eq!(outcome.polygons.len(), 1);
    assert!(approx_eq(outcome.polygons[0].area, 1.0, 1e-9));

    let recounted = count_features(outcome.polygons, &buildings);
    assert_eq!(recounted[0].feature_count, Some(9));
}

#[test]
fn test_merge_never_increases_polygon_count() {
    let polygons = polygonize(&unit_square(), &[road(0.25), road(0.5), road(0.75)]);
    let buildings = scatter(12, 0.05, 0.95, 1);

    let counted = count_features(polygons, &buildings);
    let before = counted.len();
    let outcome = merge_low_count(counted, 20);

    assert!(outcome.polygons.len() <= before);
}

#[test]
fn test_isolated_low_polygon_warns() {
    // A single polygon has no neighbors at all.
    let polygons = polygonize(&unit_square(), &[]);
    let counted = count_features(polygons, &scatter(3, 0.1, 0.9, 1));

    let outcome = merge_low_count(counted, 20);

    assert_eq!(outcome.polygons.len(), 1);
    assert_eq!(
        outcome.warnings,
        vec![SplitWarning::UnmergeableIsolate {
            polygon_id: 1,
            feature_count: 3,
        }]
    );
    // The isolate itself survives with its counts intact.
    assert_eq!(outcome.polygons[0].feature_count, Some(3));
}

#[test]
fn test_merge_with_no_low_polygons_is_identity() {
    let polygons = polygonize(&unit_square(), &[road(0.5)]);
    let buildings = scatter(60, 0.05, 0.95, 1);

    let counted = count_features(polygons, &buildings);
    let outcome = merge_low_count(counted.clone(), 20);

    assert_eq!(outcome.polygons.len(), counted.len());
    for (a, b) in outcome.polygons.iter().zip(counted.iter()) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.feature_count, b.feature_count);
    }
}
