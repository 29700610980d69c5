//! Tests for feature counting

use geo::{line_string, polygon, Point, Polygon};
use tasksplit::count::{assign_owners, count_features};
use tasksplit::{polygonize, Building, BuildingShape, LineKind, SplitLine};

fn unit_square() -> Polygon<f64> {
    polygon![
        (x: 0.0, y: 0.0),
        (x: 1.0, y: 0.0),
        (x: 1.0, y: 1.0),
        (x: 0.0, y: 1.0),
    ]
}

fn split_square() -> Vec<tasksplit::SplitPolygon> {
    let lines = vec![SplitLine {
        geometry: line_string![(x: 0.5, y: -0.1), (x: 0.5, y: 1.1)],
        kind: LineKind::Road,
    }];
    polygonize(&unit_square(), &lines)
}

fn point_building(id: u64, x: f64, y: f64) -> Building {
    Building::new(id, BuildingShape::Point(Point::new(x, y)))
}

#[test]
fn test_buildings_are_counted_per_polygon() {
    let polygons = split_square();
    let buildings = vec![
        point_building(1, 0.2, 0.2),
        point_building(2, 0.3, 0.8),
        point_building(3, 0.7, 0.5),
    ];

    let counted = count_features(polygons, &buildings);

    assert_eq!(counted[0].feature_count, Some(2));
    assert_eq!(counted[0].building_ids, vec![1, 2]);
    assert_eq!(counted[1].feature_count, Some(1));
    assert_eq!(counted[1].building_ids, vec![3]);
}

#[test]
fn test_footprint_uses_centroid() {
    let polygons = split_square();
    // Footprint centered at (0.7, 0.5), entirely in the right half.
    let footprint = polygon![
        (x: 0.65, y: 0.45),
        (x: 0.75, y: 0.45),
        (x: 0.75, y: 0.55),
        (x: 0.65, y: 0.55),
    ];
    let buildings = vec![Building::new(7, BuildingShape::Footprint(footprint))];

    let counted = count_features(polygons, &buildings);

    assert_eq!(counted[0].feature_count, Some(0));
    assert_eq!(counted[1].building_ids, vec![7]);
}

#[test]
fn test_boundary_centroid_goes_to_lowest_id() {
    let polygons = split_square();
    // Exactly on the shared edge between polygons 1 and 2.
    let buildings = vec![point_building(1, 0.5, 0.5)];

    let counted = count_features(polygons, &buildings);

    let total: usize = counted.iter().map(|p| p.feature_count.unwrap()).sum();
    assert_eq!(total, 1);
    assert_eq!(counted[0].building_ids, vec![1]);
    assert!(counted[1].building_ids.is_empty());
}

#[test]
fn test_building_outside_all_polygons_is_uncounted() {
    let polygons = split_square();
    let buildings = vec![point_building(1, 2.0, 2.0)];

    let counted = count_features(polygons, &buildings);

    assert_eq!(counted[0].feature_count, Some(0));
    assert_eq!(counted[1].feature_count, Some(0));
}

#[test]
fn test_recount_is_idempotent() {
    let polygons = split_square();
    let buildings = vec![
        point_building(1, 0.2, 0.2),
        point_building(2, 0.7, 0.5),
    ];

    let once = count_features(polygons, &buildings);
    let twice = count_features(once.clone(), &buildings);

    for (a, b) in once.iter().zip(twice.iter()) {
        assert_eq!(a.feature_count, b.feature_count);
        assert_eq!(a.building_ids, b.building_ids);
    }
}

#[test]
fn test_assign_owners_backfills_buildings() {
    let polygons = split_square();
    let mut buildings = vec![
        point_building(1, 0.2, 0.2),
        point_building(2, 0.7, 0.5),
        point_building(3, 2.0, 2.0),
    ];

    let counted = count_features(polygons, &buildings);
    assign_owners(&counted, &mut buildings);

    assert_eq!(buildings[0].split_polygon_id, Some(counted[0].id));
    assert_eq!(buildings[1].split_polygon_id, Some(counted[1].id));
    assert_eq!(buildings[2].split_polygon_id, None);
}
