//! Decoding `GeoJSON` request bodies into shapes.
//!
//! The endpoint path names the geometry kind (`point`, `polygon`,
//! `multipolygon`) and the body carries a `GeoJSON` geometry, `Feature`, or
//! `FeatureCollection`. Every polygon found is returned in document order;
//! its position is the index reported back to the client.

use std::str::FromStr;

use geo_types::{MultiPolygon, Point, Polygon};
use geojson::{Feature, GeoJson, Geometry, Value};

use crate::error::GeoError;

/// Minimum number of positions in a closed linear ring.
const MIN_RING_POSITIONS: usize = 4;

/// Geometry kind named by the request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    /// A single `Point`.
    Point,
    /// A single `Polygon`.
    Polygon,
    /// A `MultiPolygon` (each member is counted separately).
    MultiPolygon,
}

impl GeometryKind {
    /// `GeoJSON` `type` member accepted for this kind.
    pub const fn geojson_type(self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::Polygon => "Polygon",
            Self::MultiPolygon => "MultiPolygon",
        }
    }
}

impl FromStr for GeometryKind {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "point" => Ok(Self::Point),
            "polygon" => Ok(Self::Polygon),
            "multipolygon" => Ok(Self::MultiPolygon),
            other => Err(GeoError::UnsupportedKind(other.to_owned())),
        }
    }
}

/// One decoded input shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// A point, later planned as the cell enclosing it.
    Point(Point<f64>),
    /// A polygon with optional holes.
    Polygon(Polygon<f64>),
}

/// Decode a `GeoJSON` body of the given kind into shapes.
///
/// # Errors
///
/// Returns [`GeoError::InvalidGeoJson`] for malformed bodies and
/// [`GeoError::TypeMismatch`] when a geometry is not of `kind`.
pub fn decode_geometry(kind: GeometryKind, body: &[u8]) -> Result<Vec<Shape>, GeoError> {
    let text = std::str::from_utf8(body)
        .map_err(|e| invalid(&format!("body is not UTF-8: {e}")))?;
    let document: GeoJson = text
        .parse()
        .map_err(|e: geojson::Error| invalid(&e.to_string()))?;

    let geometries = match document {
        GeoJson::Geometry(geometry) => vec![geometry],
        GeoJson::Feature(feature) => vec![geometry_of(feature)?],
        GeoJson::FeatureCollection(collection) => collection
            .features
            .into_iter()
            .map(geometry_of)
            .collect::<Result<Vec<_>, _>>()?,
    };

    let mut shapes = Vec::new();
    for geometry in geometries {
        collect(kind, geometry.value, &mut shapes)?;
    }
    if shapes.is_empty() {
        return Err(invalid("no geometry found"));
    }
    Ok(shapes)
}

fn geometry_of(feature: Feature) -> Result<Geometry, GeoError> {
    feature
        .geometry
        .ok_or_else(|| invalid("Feature without a geometry"))
}

fn collect(kind: GeometryKind, value: Value, shapes: &mut Vec<Shape>) -> Result<(), GeoError> {
    match (kind, &value) {
        (GeometryKind::Point, Value::Point(position)) => check_position(position)?,
        (GeometryKind::Polygon, Value::Polygon(rings)) => check_polygon(rings)?,
        (GeometryKind::MultiPolygon, Value::MultiPolygon(members)) => {
            for rings in members {
                check_polygon(rings)?;
            }
        }
        (_, found) => {
            return Err(GeoError::TypeMismatch {
                expected: kind.geojson_type().to_owned(),
                found: type_name(found).to_owned(),
            });
        }
    }

    match kind {
        GeometryKind::Point => {
            shapes.push(Shape::Point(Point::try_from(value).map_err(convert)?));
        }
        GeometryKind::Polygon => {
            shapes.push(Shape::Polygon(Polygon::try_from(value).map_err(convert)?));
        }
        GeometryKind::MultiPolygon => {
            let multi = MultiPolygon::<f64>::try_from(value).map_err(convert)?;
            shapes.extend(multi.0.into_iter().map(Shape::Polygon));
        }
    }
    Ok(())
}

const fn type_name(value: &Value) -> &'static str {
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

fn check_polygon(rings: &[Vec<Vec<f64>>]) -> Result<(), GeoError> {
    if rings.is_empty() {
        return Err(invalid("Polygon without an exterior ring"));
    }
    for ring in rings {
        if ring.len() < MIN_RING_POSITIONS {
            return Err(invalid(&format!(
                "linear ring has {} positions, at least {MIN_RING_POSITIONS} required",
                ring.len()
            )));
        }
        for position in ring {
            check_position(position)?;
        }
    }
    Ok(())
}

/// A `[lng, lat]` position; extra members (altitude) are ignored.
fn check_position(position: &[f64]) -> Result<(), GeoError> {
    match position {
        [lng, lat, ..] if (-180.0..=180.0).contains(lng) && (-90.0..=90.0).contains(lat) => Ok(()),
        [_, _, ..] => Err(invalid(&format!("position out of range: {position:?}"))),
        _ => Err(invalid(&format!("malformed position: {position:?}"))),
    }
}

fn convert(e: geojson::Error) -> GeoError {
    invalid(&e.to_string())
}

fn invalid(message: &str) -> GeoError {
    GeoError::InvalidGeoJson(message.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    const SQUARE: &str = "[[[0,0],[10,0],[10,10],[0,10],[0,0]]]";

    #[test]
    fn parses_kind_from_path_segment() {
        assert_eq!("MultiPolygon".parse::<GeometryKind>().unwrap(), GeometryKind::MultiPolygon);
        assert_eq!("point".parse::<GeometryKind>().unwrap(), GeometryKind::Point);
        assert!(matches!(
            "line".parse::<GeometryKind>(),
            Err(GeoError::UnsupportedKind(_))
        ));
    }

    #[test]
    fn decodes_bare_polygon() {
        let body = format!(r#"{{"type":"Polygon","coordinates":{SQUARE}}}"#);
        let shapes = decode_geometry(GeometryKind::Polygon, body.as_bytes()).unwrap();
        assert_eq!(shapes.len(), 1);
        let Some(Shape::Polygon(p)) = shapes.first() else {
            panic!("expected a polygon");
        };
        assert_eq!(p.exterior().0.len(), 5);
        assert!(p.interiors().is_empty());
    }

    #[test]
    fn multipolygon_members_keep_document_order() {
        let body = r#"{"type":"MultiPolygon","coordinates":[
            [[[0,0],[1,0],[1,1],[0,0]]],
            [[[5,5],[6,5],[6,6],[5,5]]]
        ]}"#;
        let shapes = decode_geometry(GeometryKind::MultiPolygon, body.as_bytes()).unwrap();
        assert_eq!(shapes.len(), 2);
        let Some(Shape::Polygon(second)) = shapes.get(1) else {
            panic!("expected a polygon");
        };
        assert!((second.exterior().0.first().unwrap().x - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unwraps_features_and_collections() {
        let body = format!(
            r#"{{"type":"FeatureCollection","features":[
                {{"type":"Feature","properties":{{}},"geometry":{{"type":"Polygon","coordinates":{SQUARE}}}}},
                {{"type":"Feature","properties":{{}},"geometry":{{"type":"Polygon","coordinates":{SQUARE}}}}}
            ]}}"#
        );
        let shapes = decode_geometry(GeometryKind::Polygon, body.as_bytes()).unwrap();
        assert_eq!(shapes.len(), 2);
    }

    #[test]
    fn decodes_point_with_altitude() {
        let body = r#"{"type":"Point","coordinates":[12.5,55.6,20.0]}"#;
        let shapes = decode_geometry(GeometryKind::Point, body.as_bytes()).unwrap();
        assert_eq!(shapes, vec![Shape::Point(Point::new(12.5, 55.6))]);
    }

    #[test]
    fn rejects_type_mismatch() {
        let body = format!(r#"{{"type":"Polygon","coordinates":{SQUARE}}}"#);
        let err = decode_geometry(GeometryKind::MultiPolygon, body.as_bytes());
        assert!(matches!(err, Err(GeoError::TypeMismatch { .. })));
    }

    #[test]
    fn rejects_short_rings_and_bad_positions() {
        let short = r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[0,0]]]}"#;
        assert!(matches!(
            decode_geometry(GeometryKind::Polygon, short.as_bytes()),
            Err(GeoError::InvalidGeoJson(_))
        ));

        let far = r#"{"type":"Point","coordinates":[200,0]}"#;
        assert!(matches!(
            decode_geometry(GeometryKind::Point, far.as_bytes()),
            Err(GeoError::InvalidGeoJson(_))
        ));

        assert!(matches!(
            decode_geometry(GeometryKind::Point, b"not json"),
            Err(GeoError::InvalidGeoJson(_))
        ));
    }

    #[test]
    fn empty_collection_is_an_error() {
        let body = r#"{"type":"FeatureCollection","features":[]}"#;
        assert!(decode_geometry(GeometryKind::Polygon, body.as_bytes()).is_err());
    }

    #[test]
    fn rejects_features_without_geometry() {
        let body = r#"{"type":"Feature","properties":{},"geometry":null}"#;
        assert!(matches!(
            decode_geometry(GeometryKind::Polygon, body.as_bytes()),
            Err(GeoError::InvalidGeoJson(_))
        ));
    }

    #[test]
    fn mismatch_names_the_found_type() {
        let body = r#"{"type":"LineString","coordinates":[[0,0],[1,1]]}"#;
        let Err(GeoError::TypeMismatch { expected, found }) =
            decode_geometry(GeometryKind::Point, body.as_bytes())
        else {
            panic!("expected a type mismatch");
        };
        assert_eq!(expected, "Point");
        assert_eq!(found, "LineString");
    }
}
