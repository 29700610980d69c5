//! Tests for Voronoi boundary resolution

use geo::{polygon, Area, BooleanOps, Contains, MultiPolygon, Point};
use std::collections::BTreeMap;
use tasksplit::tessellate::resolve_boundaries;
use tasksplit::{Building, BuildingShape, Cluster, SplitPolygon, SplitWarning};

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

fn square_polygon(id: u64, building_ids: Vec<u64>) -> SplitPolygon {
    let geometry = MultiPolygon(vec![polygon![
        (x: 0.0, y: 0.0),
        (x: 1.0, y: 0.0),
        (x: 1.0, y: 1.0),
        (x: 0.0, y: 1.0),
    ]]);
    SplitPolygon {
        id,
        geometry,
        area: 1.0,
        feature_count: Some(building_ids.len()),
        building_ids,
    }
}

fn point_building(id: u64, x: f64, y: f64) -> (u64, Building) {
    (id, Building::new(id, BuildingShape::Point(Point::new(x, y))))
}

fn cluster(polygon_id: u64, index: usize, building_ids: Vec<u64>) -> Cluster {
    Cluster {
        polygon_id,
        index,
        building_ids,
    }
}

#[test]
fn test_single_cluster_takes_whole_polygon() {
    let polygon = square_polygon(1, vec![1, 2]);
    let buildings: BTreeMap<u64, Building> = vec![
        point_building(1, 0.2, 0.2),
        point_building(2, 0.8, 0.8),
    ]
    .into_iter()
    .collect();
    let clusters = vec![cluster(1, 0, vec![1, 2])];

    let outcome = resolve_boundaries(&polygon, &clusters, &buildings, 5e-5);

    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.tasks.len(), 1);
    assert_eq!(outcome.tasks[0].id(), "1-0");
    assert_eq!(outcome.tasks[0].geometry, polygon.geometry);
}

#[test]
fn test_two_clusters_partition_the_polygon() {
    let polygon = square_polygon(1, vec![1, 2, 3, 4]);
    let buildings: BTreeMap<u64, Building> = vec![
        point_building(1, 0.2, 0.3),
        point_building(2, 0.25, 0.7),
        point_building(3, 0.8, 0.3),
        point_building(4, 0.75, 0.7),
    ]
    .into_iter()
    .collect();
    let clusters = vec![cluster(1, 0, vec![1, 2]), cluster(1, 1, vec![3, 4])];

    let outcome = resolve_boundaries(&polygon, &clusters, &buildings, 5e-5);

    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.tasks.len(), 2);
    assert_eq!(outcome.tasks[0].cluster_index, 0);
    assert_eq!(outcome.tasks[1].cluster_index, 1);

    // Together the tasks cover the polygon with negligible overlap.
    let total: f64 = outcome.tasks.iter().map(|t| t.geometry.unsigned_area()).sum();
    assert!(approx_eq(total, 1.0, 1e-6));
    let overlap = outcome.tasks[0]
        .geometry
        .intersection(&outcome.tasks[1].geometry)
        .unsigned_area();
    assert!(overlap < 1e-6);

    // Each task contains its own buildings.
    assert!(outcome.tasks[0].geometry.contains(&Point::new(0.2, 0.3)));
    assert!(outcome.tasks[1].geometry.contains(&Point::new(0.8, 0.3)));
}

#[test]
fn test_footprints_are_densified_into_samples() {
    let polygon = square_polygon(1, vec![1, 2]);
    let left = polygon![
        (x: 0.1, y: 0.4),
        (x: 0.3, y: 0.4),
        (x: 0.3, y: 0.6),
        (x: 0.1, y: 0.6),
    ];
    let right = polygon![
        (x: 0.7, y: 0.4),
        (x: 0.9, y: 0.4),
        (x: 0.9, y: 0.6),
        (x: 0.7, y: 0.6),
    ];
    let buildings: BTreeMap<u64, Building> = vec![
        (1, Building::new(1, BuildingShape::Footprint(left))),
        (2, Building::new(2, BuildingShape::Footprint(right))),
    ]
    .into_iter()
    .collect();
    let clusters = vec![cluster(1, 0, vec![1]), cluster(1, 1, vec![2])];

    let outcome = resolve_boundaries(&polygon, &clusters, &buildings, 0.05);

    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.tasks.len(), 2);
    assert!(outcome.tasks[0].geometry.contains(&Point::new(0.2, 0.5)));
    assert!(outcome.tasks[1].geometry.contains(&Point::new(0.8, 0.5)));
}

#[test]
fn test_too_few_samples_warns_instead_of_failing() {
    let polygon = square_polygon(9, vec![1, 2]);
    let buildings: BTreeMap<u64, Building> = vec![
        point_building(1, 0.2, 0.5),
        point_building(2, 0.8, 0.5),
    ]
    .into_iter()
    .collect();
    let clusters = vec![cluster(9, 0, vec![1]), cluster(9, 1, vec![2])];

    let outcome = resolve_boundaries(&polygon, &clusters, &buildings, 5e-5);

    assert!(outcome.tasks.is_empty());
    assert_eq!(outcome.warnings.len(), 1);
    match &outcome.warnings[0] {
        SplitWarning::NumericDegeneracy { polygon_id, .. } => assert_eq!(*polygon_id, 9),
        other => panic!("unexpected warning: {other:?}"),
    }
}

#[test]
fn test_empty_clusters_produce_no_tasks() {
    let polygon = square_polygon(1, Vec::new());
    let clusters = vec![cluster(1, 0, Vec::new())];

    let outcome = resolve_boundaries(&polygon, &clusters, &BTreeMap::new(), 5e-5);

    assert!(outcome.tasks.is_empty());
    assert!(outcome.warnings.is_empty());
}
