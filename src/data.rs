use crate::ranking::CorrelationResult;
use crate::series::DatewiseCategorySums;
use crate::types::{FeatureId, GeoFeature, GeometryKind, SuburbReading};
use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use geojson::{feature::Id, Feature, GeoJson, Value};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub fn load_readings(path: &Path) -> Result<Vec<SuburbReading>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s: &str| s.to_lowercase())
        .ok_or_else(|| anyhow!("Readings file has no extension"))?;

    let file = File::open(path).with_context(|| format!("Failed to open readings file: {:?}", path))?;

    let readings = match extension.as_str() {
        "csv" => parse_readings_csv(file)?,
        "json" => serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse readings JSON: {:?}", path))?,
        _ => return Err(anyhow!("Unsupported readings format: {}", extension)),
    };

    tracing::info!(count = readings.len(), "loaded readings from {:?}", path);
    Ok(readings)
}

/// Columns `id,name,reading`; an empty reading cell means no data.
pub fn parse_readings_csv<R: Read>(reader: R) -> Result<Vec<SuburbReading>> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| anyhow!("Column '{}' not found in CSV", name))
    };
    let id_idx = column("id")?;
    let reading_idx = column("reading")?;
    let name_idx = headers.iter().position(|h| h == "name");

    let mut readings = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        let id: FeatureId = record
            .get(id_idx)
            .unwrap_or("")
            .parse()
            .with_context(|| format!("Invalid id on CSV row {}", row + 1))?;
        let reading = match record.get(reading_idx).unwrap_or("") {
            "" => None,
            raw => Some(
                raw.parse::<f64>()
                    .with_context(|| format!("Invalid reading on CSV row {}", row + 1))?,
            ),
        };
        let name = name_idx
            .and_then(|idx| record.get(idx))
            .unwrap_or("")
            .to_string();

        readings.push(SuburbReading { id, name, reading });
    }

    Ok(readings)
}

pub fn load_features(path: &Path, id_property: &str) -> Result<Vec<GeoFeature>> {
    let file = File::open(path).with_context(|| format!("Failed to open GeoJSON file: {:?}", path))?;
    let geojson = GeoJson::from_reader(BufReader::new(file)).context("Failed to parse GeoJSON")?;
    let features = features_from_geojson(geojson, id_property)?;
    tracing::info!(count = features.len(), "loaded features from {:?}", path);
    Ok(features)
}

/// Converts a FeatureCollection into map features.
///
/// Features without a usable id or with unsupported geometry are skipped.
/// A null geometry is a suburb without a boundary; in a point layer it is
/// dropped instead.
pub fn features_from_geojson(geojson: GeoJson, id_property: &str) -> Result<Vec<GeoFeature>> {
    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("GeoJSON must be a FeatureCollection")),
    };

    let layer_kind = collection
        .features
        .iter()
        .filter_map(|f| f.geometry.as_ref())
        .find_map(|g| match g.value {
            Value::Point(_) => Some(GeometryKind::Point),
            Value::Polygon(_) => Some(GeometryKind::Polygon),
            _ => None,
        });

    let mut features = Vec::new();

    for feature in collection.features {
        let Some(id) = feature_id(&feature, id_property) else {
            tracing::warn!("Skipping feature without an integer '{}'", id_property);
            continue;
        };

        let geometry = match feature.geometry {
            Some(geometry) => geometry,
            None if layer_kind == Some(GeometryKind::Point) => {
                tracing::warn!(id, "Skipping point feature without a position");
                continue;
            }
            None => {
                features.push(GeoFeature::Polygon { id, geometry: None });
                continue;
            }
        };

        match geometry.value {
            Value::Point(_) | Value::Polygon(_) => {
                let geo_geom: geo::Geometry<f64> = geometry
                    .value
                    .try_into()
                    .map_err(|e| anyhow!("Failed to convert geometry of feature {}: {:?}", id, e))?;

                match geo_geom {
                    geo::Geometry::Point(p) => features.push(GeoFeature::Point { id, coord: p.0 }),
                    geo::Geometry::Polygon(p) => features.push(GeoFeature::Polygon {
                        id,
                        geometry: Some(p),
                    }),
                    _ => {}
                }
            }
            ref other => {
                tracing::warn!(id, "Skipping unsupported geometry type {}", geometry_name(other));
            }
        }
    }

    Ok(features)
}

fn geometry_name(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn feature_id(feature: &Feature, id_property: &str) -> Option<FeatureId> {
    let from_property = feature
        .properties
        .as_ref()
        .and_then(|props| props.get(id_property));

    match from_property {
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        Some(serde_json::Value::String(s)) => s.parse().ok(),
        _ => match &feature.id {
            Some(Id::Number(n)) => n.as_i64(),
            Some(Id::String(s)) => s.parse().ok(),
            None => None,
        },
    }
}

pub fn load_correlations(path: &Path) -> Result<Vec<CorrelationResult>> {
    let file = File::open(path).with_context(|| format!("Failed to open correlations file: {:?}", path))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse correlations JSON: {:?}", path))
}

pub fn load_category_sums(path: &Path) -> Result<DatewiseCategorySums> {
    let file = File::open(path).with_context(|| format!("Failed to open category sums file: {:?}", path))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse category sums JSON: {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Vec<GeoFeature> {
        let geojson: GeoJson = json.parse().unwrap();
        features_from_geojson(geojson, "id").unwrap()
    }

    #[test]
    fn csv_blank_reading_is_null() {
        let csv = "id,name,reading\n1,Carlton,4\n2,Fitzroy,\n3,Parkville,250.5\n";
        let readings = parse_readings_csv(csv.as_bytes()).unwrap();
        assert_eq!(readings.len(), 3);
        assert_eq!(readings[0].reading, Some(4.0));
        assert_eq!(readings[1].reading, None);
        assert_eq!(readings[1].name, "Fitzroy");
        assert_eq!(readings[2].reading, Some(250.5));
    }

    #[test]
    fn csv_without_reading_column_fails() {
        assert!(parse_readings_csv("id,name\n1,Carlton\n".as_bytes()).is_err());
        assert!(parse_readings_csv("id,reading\nx,1\n".as_bytes()).is_err());
    }

    #[test]
    fn geojson_points_keep_lng_lat() {
        let features = parse(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"id": 12},
                 "geometry": {"type": "Point", "coordinates": [144.96, -37.81]}},
                {"type": "Feature", "properties": {"id": "13"},
                 "geometry": {"type": "Point", "coordinates": [145.0, -37.9]}},
                {"type": "Feature", "properties": {"id": 14}, "geometry": null}
            ]}"#,
        );
        assert_eq!(features.len(), 2);
        match &features[0] {
            GeoFeature::Point { id, coord } => {
                assert_eq!(*id, 12);
                assert_eq!((coord.x, coord.y), (144.96, -37.81));
            }
            other => panic!("expected a point, got {other:?}"),
        }
        assert_eq!(features[1].id(), 13);
    }

    #[test]
    fn geojson_polygons_allow_missing_boundaries() {
        let features = parse(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "id": 3, "properties": {},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}},
                {"type": "Feature", "properties": {"id": 4}, "geometry": null},
                {"type": "Feature", "properties": {"id": 5},
                 "geometry": {"type": "LineString", "coordinates": [[0,0],[1,1]]}},
                {"type": "Feature", "properties": {"name": "no id"},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}}
            ]}"#,
        );
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].id(), 3);
        assert!(matches!(features[0], GeoFeature::Polygon { geometry: Some(_), .. }));
        assert_eq!(features[1], GeoFeature::Polygon { id: 4, geometry: None });
    }

    #[test]
    fn geojson_must_be_a_collection() {
        let geojson: GeoJson = r#"{"type": "Point", "coordinates": [0, 0]}"#.parse().unwrap();
        assert!(features_from_geojson(geojson, "id").is_err());
    }
}
