//! GeoJSON ingestion and serialization.
//!
//! The engine's external contract is GeoJSON: the AOI, the tagged lines and
//! the buildings arrive as FeatureCollections (or bare geometries), and the
//! result leaves as a FeatureCollection with one Feature per task polygon.
//! Properties are minimal by default - callers wanting cluster ids, feature
//! counts or the bare zero-building polygons opt in via [`OutputOptions`].

use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, JsonValue};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::{Result, SplitError};
use crate::{Building, BuildingShape, LineFeature, SplitOutput};

/// Controls what the serialized FeatureCollection carries beyond geometry.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Attach `task_id`, `polygon_id`, `cluster_index` and `feature_count`
    /// properties to every task Feature.
    pub include_properties: bool,
    /// Also emit zero-building split polygons that produced no task.
    pub include_empty_polygons: bool,
}

/// Parse an AOI polygon from GeoJSON text.
///
/// Accepts a bare geometry, a Feature or a FeatureCollection; the first
/// polygon found wins. A MultiPolygon with a single member is accepted as a
/// polygon.
pub fn parse_aoi(text: &str) -> Result<geo::Polygon<f64>> {
    for geometry in geometries(text)? {
        match geometry {
            geo::Geometry::Polygon(polygon) => return Ok(polygon),
            geo::Geometry::MultiPolygon(mp) if mp.0.len() == 1 => {
                return Ok(mp.0.into_iter().next().expect("length checked"));
            }
            _ => {}
        }
    }
    Err(SplitError::MissingGeometry {
        expected: "AOI polygon",
    })
}

/// Parse tagged line features from GeoJSON text.
///
/// Every LineString Feature becomes one [`LineFeature`]; string-valued
/// properties become its tags. Non-line geometries are skipped.
pub fn parse_line_features(text: &str) -> Result<Vec<LineFeature>> {
    let geojson = GeoJson::from_str(text)?;
    let mut lines = Vec::new();
    for feature in features(geojson) {
        let Some(geometry) = feature.geometry.as_ref() else {
            continue;
        };
        let Ok(parsed) = geo::Geometry::<f64>::try_from(geometry.value.clone()) else {
            continue;
        };
        let tags = string_properties(feature.properties.as_ref());
        match parsed {
            geo::Geometry::LineString(geometry) => {
                lines.push(LineFeature {
                    geometry,
                    tags: tags.clone(),
                });
            }
            geo::Geometry::MultiLineString(mls) => {
                for geometry in mls.0 {
                    lines.push(LineFeature {
                        geometry,
                        tags: tags.clone(),
                    });
                }
            }
            _ => {}
        }
    }
    Ok(lines)
}

/// Parse building features from GeoJSON text.
///
/// Points and polygons qualify; ids come from the numeric feature id when
/// present, otherwise from the feature's position.
pub fn parse_buildings(text: &str) -> Result<Vec<Building>> {
    let geojson = GeoJson::from_str(text)?;
    let mut buildings = Vec::new();
    for (position, feature) in features(geojson).into_iter().enumerate() {
        let Some(geometry) = feature.geometry.as_ref() else {
            continue;
        };
        let Ok(parsed) = geo::Geometry::<f64>::try_from(geometry.value.clone()) else {
            continue;
        };
        let id = feature_id(&feature).unwrap_or(position as u64 + 1);
        match parsed {
            geo::Geometry::Point(point) => {
                buildings.push(Building::new(id, BuildingShape::Point(point)));
            }
            geo::Geometry::Polygon(polygon) => {
                buildings.push(Building::new(id, BuildingShape::Footprint(polygon)));
            }
            geo::Geometry::MultiPolygon(mp) if !mp.0.is_empty() => {
                let polygon = mp.0.into_iter().next().expect("length checked");
                buildings.push(Building::new(id, BuildingShape::Footprint(polygon)));
            }
            _ => {}
        }
    }
    Ok(buildings)
}

/// Serialize a run's output as a GeoJSON FeatureCollection.
pub fn to_feature_collection(output: &SplitOutput, options: &OutputOptions) -> GeoJson {
    let mut features: Vec<Feature> = Vec::with_capacity(output.tasks.len());

    for task in &output.tasks {
        let mut properties = JsonObject::new();
        if options.include_properties {
            properties.insert("task_id".to_string(), JsonValue::from(task.id()));
            properties.insert("polygon_id".to_string(), JsonValue::from(task.polygon_id));
            properties.insert(
                "cluster_index".to_string(),
                JsonValue::from(task.cluster_index as u64),
            );
            let feature_count = output
                .clusters
                .iter()
                .find(|c| c.polygon_id == task.polygon_id && c.index == task.cluster_index)
                .map(|c| c.building_ids.len() as u64)
                .unwrap_or(0);
            properties.insert("feature_count".to_string(), JsonValue::from(feature_count));
        }
        features.push(Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&task.geometry))),
            id: None,
            properties: if properties.is_empty() {
                None
            } else {
                Some(properties)
            },
            foreign_members: None,
        });
    }

    if options.include_empty_polygons {
        for polygon in output.split_polygons.iter().filter(|p| p.features() == 0) {
            let mut properties = JsonObject::new();
            if options.include_properties {
                properties.insert("polygon_id".to_string(), JsonValue::from(polygon.id));
                properties.insert("feature_count".to_string(), JsonValue::from(0u64));
            }
            features.push(Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::from(
                    &polygon.geometry,
                ))),
                id: None,
                properties: if properties.is_empty() {
                    None
                } else {
                    Some(properties)
                },
                foreign_members: None,
            });
        }
    }

    GeoJson::FeatureCollection(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

/// All geometries in a GeoJSON document, whatever its top-level shape.
fn geometries(text: &str) -> Result<Vec<geo::Geometry<f64>>> {
    let geojson = GeoJson::from_str(text)?;
    let mut result = Vec::new();
    match geojson {
        GeoJson::Geometry(geometry) => {
            result.push(geo::Geometry::<f64>::try_from(geometry.value)?);
        }
        other => {
            for feature in features(other) {
                if let Some(geometry) = feature.geometry {
                    result.push(geo::Geometry::<f64>::try_from(geometry.value)?);
                }
            }
        }
    }
    Ok(result)
}

fn features(geojson: GeoJson) -> Vec<Feature> {
    match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(geometry) => vec![Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: None,
            foreign_members: None,
        }],
    }
}

fn string_properties(properties: Option<&JsonObject>) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();
    if let Some(object) = properties {
        for (key, value) in object {
            if let Some(text) = value.as_str() {
                tags.insert(key.clone(), text.to_string());
            }
        }
    }
    tags
}

fn feature_id(feature: &Feature) -> Option<u64> {
    match &feature.id {
        Some(geojson::feature::Id::Number(n)) => n.as_u64(),
        _ => None,
    }
}
