use crate::ir::{Point, ServiceChange};
use geojson::{GeoJson, Position, Value};
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),
    #[error("expected a GeoJSON FeatureCollection, found type '{0}'")]
    NotFeatureCollection(String),
    #[error("feature {index} has no '{property}' property")]
    MissingRouteProperty { index: usize, property: String },
    #[error("route {route}: position with {len} ordinate(s), need at least 2")]
    InvalidPosition { route: String, len: usize },
    #[error("scenario '{0}' does not appear in the change table")]
    UnknownScenario(String),
}

/// A route shape as read from GeoJSON, before the annotation join.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteShape {
    /// Route code as stored in the shape file (before renaming).
    pub code: String,
    pub parts: Vec<Vec<Point>>,
}

pub fn parse_route_shapes(input: &str, route_property: &str) -> Result<Vec<RouteShape>, DataError> {
    let collection = match input.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => collection,
        GeoJson::Feature(_) => return Err(DataError::NotFeatureCollection("Feature".to_string())),
        GeoJson::Geometry(_) => return Err(DataError::NotFeatureCollection("Geometry".to_string())),
    };

    let mut shapes = Vec::with_capacity(collection.features.len());
    for (index, feature) in collection.features.into_iter().enumerate() {
        let code = feature
            .property(route_property)
            .and_then(value_to_string)
            .ok_or_else(|| DataError::MissingRouteProperty {
                index,
                property: route_property.to_string(),
            })?;

        let mut parts = Vec::new();
        if let Some(geometry) = &feature.geometry {
            collect_parts(&geometry.value, &code, &mut parts)?;
        }
        shapes.push(RouteShape { code, parts });
    }
    Ok(shapes)
}

pub fn parse_service_changes(input: &str) -> Result<Vec<ServiceChange>, DataError> {
    Ok(serde_json::from_str(input)?)
}

pub fn load_route_shapes(path: &Path, route_property: &str) -> Result<Vec<RouteShape>, DataError> {
    parse_route_shapes(&read_file(path)?, route_property)
}

pub fn load_service_changes(path: &Path) -> Result<Vec<ServiceChange>, DataError> {
    parse_service_changes(&read_file(path)?)
}

fn read_file(path: &Path) -> Result<String, DataError> {
    std::fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// Each line or ring becomes one part; a Point is a one-point part.
fn collect_parts(value: &Value, route: &str, parts: &mut Vec<Vec<Point>>) -> Result<(), DataError> {
    match value {
        Value::Point(position) => push_part(std::slice::from_ref(position), route, parts),
        Value::MultiPoint(positions) | Value::LineString(positions) => push_part(positions, route, parts),
        Value::MultiLineString(lines) | Value::Polygon(lines) => {
            for line in lines {
                push_part(line, route, parts)?;
            }
            Ok(())
        }
        Value::MultiPolygon(polygons) => {
            for ring in polygons.iter().flatten() {
                push_part(ring, route, parts)?;
            }
            Ok(())
        }
        Value::GeometryCollection(_) => {
            tracing::warn!(route = %route, "geometry collection is not drawn, treating route as geometry-less");
            Ok(())
        }
    }
}

fn push_part(positions: &[Position], route: &str, parts: &mut Vec<Vec<Point>>) -> Result<(), DataError> {
    let mut part = Vec::with_capacity(positions.len());
    for values in positions.iter().filter(|values| !values.is_empty()) {
        part.push(position(values, route)?);
    }
    if !part.is_empty() {
        parts.push(part);
    }
    Ok(())
}

fn position(values: &[f64], route: &str) -> Result<Point, DataError> {
    match values {
        [x, y, ..] => Ok(Point::new(*x, *y)),
        _ => Err(DataError::InvalidPosition {
            route: route.to_string(),
            len: values.len(),
        }),
    }
}

fn value_to_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.trim().to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Accepts `"72"` or `72` for identifier columns.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = JsonValue::deserialize(deserializer)?;
    value_to_string(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("expected string or number, got {value}")))
}
