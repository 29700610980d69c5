//! Tests for candidate polygonization

use geo::{line_string, polygon, Area, LineString, Polygon};
use tasksplit::polygonize;
use tasksplit::{LineKind, SplitLine};

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

fn road(geometry: LineString<f64>) -> SplitLine {
    SplitLine {
        geometry,
        kind: LineKind::Road,
    }
}

#[test]
fn test_no_lines_yields_aoi_itself() {
    let aoi = unit_square();
    let polygons = polygonize(&aoi, &[]);

    assert_eq!(polygons.len(), 1);
    assert_eq!(polygons[0].id, 1);
    assert!(approx_eq(polygons[0].area, 1.0, 1e-9));
    assert_eq!(polygons[0].feature_count, None);
}

#[test]
fn test_crossing_road_splits_in_two() {
    let aoi = unit_square();
    // Overshoots both edges; the overhangs are dangles and get pruned.
    let lines = vec![road(line_string![
        (x: 0.5, y: -0.1),
        (x: 0.5, y: 1.1),
    ])];
    let polygons = polygonize(&aoi, &lines);

    assert_eq!(polygons.len(), 2);
    assert_eq!(polygons[0].id, 1);
    assert_eq!(polygons[1].id, 2);
    assert!(approx_eq(polygons[0].area, 0.5, 1e-9));
    assert!(approx_eq(polygons[1].area, 0.5, 1e-9));
}

#[test]
fn test_grid_of_roads_splits_in_four() {
    let aoi = unit_square();
    let lines = vec![
        road(line_string![(x: 0.5, y: -0.1), (x: 0.5, y: 1.1)]),
        road(line_string![(x: -0.1, y: 0.5), (x: 1.1, y: 0.5)]),
    ];
    let polygons = polygonize(&aoi, &lines);

    assert_eq!(polygons.len(), 4);
    let total: f64 = polygons.iter().map(|p| p.area).sum();
    assert!(approx_eq(total, 1.0, 1e-9));
    for polygon in &polygons {
        assert!(approx_eq(polygon.area, 0.25, 1e-9));
    }
}

#[test]
fn test_grid_of_roads_splits_in_nine() {
    // A 3x3 grid has a center cell touching no AOI boundary; its face must
    // stay a plain 1/9 square, not absorb the outer boundary as a hole.
    let aoi = unit_square();
    let third = 1.0 / 3.0;
    let lines = vec![
        road(line_string![(x: third, y: -0.1), (x: third, y: 1.1)]),
        road(line_string![(x: 2.0 * third, y: -0.1), (x: 2.0 * third, y: 1.1)]),
        road(line_string![(x: -0.1, y: third), (x: 1.1, y: third)]),
        road(line_string![(x: -0.1, y: 2.0 * third), (x: 1.1, y: 2.0 * third)]),
    ];
    let polygons = polygonize(&aoi, &lines);

    assert_eq!(polygons.len(), 9);
    for polygon in &polygons {
        assert!(approx_eq(polygon.area, 1.0 / 9.0, 1e-8));
        assert!(polygon.geometry.0[0].interiors().is_empty());
    }
    let total: f64 = polygons.iter().map(|p| p.area).sum();
    assert!(approx_eq(total, 1.0, 1e-8));
}

#[test]
fn test_dangling_road_closes_no_face() {
    let aoi = unit_square();
    // Enters the square but stops in the middle.
    let lines = vec![road(line_string![
        (x: 0.5, y: -0.1),
        (x: 0.5, y: 0.5),
    ])];
    let polygons = polygonize(&aoi, &lines);

    assert_eq!(polygons.len(), 1);
    assert!(approx_eq(polygons[0].area, 1.0, 1e-9));
}

#[test]
fn test_line_outside_aoi_is_ignored() {
    let aoi = unit_square();
    let lines = vec![
        road(line_string![(x: 2.0, y: -0.1), (x: 2.0, y: 1.1)]),
        road(line_string![(x: 1.5, y: -0.1), (x: 2.5, y: 1.1)]),
    ];
    let polygons = polygonize(&aoi, &lines);

    assert_eq!(polygons.len(), 1);
    assert!(approx_eq(polygons[0].area, 1.0, 1e-9));
}

#[test]
fn test_aoi_hole_is_preserved() {
    let exterior = line_string![
        (x: 0.0, y: 0.0),
        (x: 1.0, y: 0.0),
        (x: 1.0, y: 1.0),
        (x: 0.0, y: 1.0),
        (x: 0.0, y: 0.0),
    ];
    let hole = line_string![
        (x: 0.25, y: 0.25),
        (x: 0.25, y: 0.75),
        (x: 0.75, y: 0.75),
        (x: 0.75, y: 0.25),
        (x: 0.25, y: 0.25),
    ];
    let aoi = Polygon::new(exterior, vec![hole]);
    let polygons = polygonize(&aoi, &[]);

    assert_eq!(polygons.len(), 1);
    assert!(approx_eq(polygons[0].area, 0.75, 1e-9));
    assert_eq!(polygons[0].geometry.0[0].interiors().len(), 1);
}

#[test]
fn test_union_of_faces_covers_aoi() {
    let aoi = unit_square();
    let lines = vec![
        road(line_string![(x: 0.3, y: -0.1), (x: 0.3, y: 1.1)]),
        road(line_string![(x: -0.1, y: 0.6), (x: 1.1, y: 0.4)]),
    ];
    let polygons = polygonize(&aoi, &lines);

    assert_eq!(polygons.len(), 4);
    let total: f64 = polygons.iter().map(|p| p.area).sum();
    assert!(approx_eq(total, aoi.unsigned_area(), 1e-8));
}

#[test]
fn test_ids_are_deterministic() {
    let aoi = unit_square();
    let lines = vec![
        road(line_string![(x: 0.5, y: -0.1), (x: 0.5, y: 1.1)]),
        road(line_string![(x: -0.1, y: 0.5), (x: 1.1, y: 0.5)]),
    ];

    let first = polygonize(&aoi, &lines);
    let second = polygonize(&aoi, &lines);

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.id, b.id);
        assert!(approx_eq(a.area, b.area, 1e-12));
        assert_eq!(a.geometry, b.geometry);
    }
}
