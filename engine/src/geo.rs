//! Geo types and geo-spatial constraints.

use crate::value::QueryValue;
use crate::{error::Result, Constraint, Error, FieldKey, Operator};
use serde::{Deserialize, Serialize, Serializer};

/// Mean Earth radius in miles.
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KILOMETERS: f64 = 6371.0;

/// A latitude/longitude pair.
///
/// Encodes as `{"__type":"GeoPoint","latitude":...,"longitude":...}`.
/// Decoding goes through [`GeoPoint::new`], so out-of-range coordinates are
/// rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "__type", rename = "GeoPoint", try_from = "GeoPointWire")]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
#[serde(tag = "__type", rename = "GeoPoint")]
struct GeoPointWire {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<GeoPointWire> for GeoPoint {
    type Error = Error;

    fn try_from(wire: GeoPointWire) -> Result<Self> {
        GeoPoint::new(wire.latitude, wire.longitude)
    }
}

impl GeoPoint {
    /// Create a point, checking that both coordinates are in range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::InvalidGeoPoint(format!(
                "latitude {latitude} must be within -90.0 and 90.0"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidGeoPoint(format!(
                "longitude {longitude} must be within -180.0 and 180.0"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance to another point, in radians.
    pub fn distance_in_radians(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let sin_half_lat = ((lat1 - lat2) / 2.0).sin();
        let sin_half_lon = ((self.longitude - other.longitude).to_radians() / 2.0).sin();

        let a = sin_half_lat * sin_half_lat + lat1.cos() * lat2.cos() * sin_half_lon * sin_half_lon;
        2.0 * a.sqrt().min(1.0).asin()
    }

    pub fn distance_in_miles(&self, other: &GeoPoint) -> f64 {
        self.distance_in_radians(other) * EARTH_RADIUS_MILES
    }

    pub fn distance_in_kilometers(&self, other: &GeoPoint) -> f64 {
        self.distance_in_radians(other) * EARTH_RADIUS_KILOMETERS
    }

    fn pair(&self) -> [f64; 2] {
        [self.latitude, self.longitude]
    }
}

/// A closed shape of at least three points.
///
/// Encodes as `{"__type":"Polygon","coordinates":[[lat, lon], ...]}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    coordinates: Vec<GeoPoint>,
}

impl Polygon {
    /// Create a polygon from its vertices.
    pub fn new(coordinates: Vec<GeoPoint>) -> Result<Self> {
        if coordinates.len() < 3 {
            return Err(Error::InvalidPolygon(format!(
                "a polygon needs at least 3 points, got {}",
                coordinates.len()
            )));
        }
        Ok(Self { coordinates })
    }

    pub fn coordinates(&self) -> &[GeoPoint] {
        &self.coordinates
    }

    /// Whether the point lies inside the polygon (ray casting).
    pub fn contains_point(&self, point: &GeoPoint) -> bool {
        let (x, y) = (point.latitude, point.longitude);
        let mut inside = false;
        let mut j = self.coordinates.len() - 1;
        for (i, vertex) in self.coordinates.iter().enumerate() {
            let previous = &self.coordinates[j];
            let (xi, yi) = (vertex.latitude, vertex.longitude);
            let (xj, yj) = (previous.latitude, previous.longitude);
            if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

#[derive(Serialize)]
#[serde(tag = "__type", rename = "Polygon")]
struct PolygonWire {
    coordinates: Vec<[f64; 2]>,
}

impl Serialize for Polygon {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        PolygonWire {
            coordinates: self.coordinates.iter().map(GeoPoint::pair).collect(),
        }
        .serialize(serializer)
    }
}

fn keyed(operator: Operator, value: impl Into<QueryValue>) -> QueryValue {
    QueryValue::map([(operator.symbol(), value)])
}

/// Field is near the point, sorted nearest first.
pub fn near(key: impl Into<FieldKey>, point: GeoPoint) -> Constraint {
    Constraint::new(key, Operator::NearSphere, point)
}

/// Field is within `distance` radians of the point.
///
/// Returns two constraints on the same key. When `sorted`, results are
/// ordered by distance (`$nearSphere` + `$maxDistance`); otherwise the
/// unsorted `$centerSphere` + `$geoWithin` pair is used.
pub fn within_radians(
    key: impl Into<FieldKey>,
    point: GeoPoint,
    distance: f64,
    sorted: bool,
) -> Vec<Constraint> {
    let key = key.into();
    if sorted {
        vec![
            Constraint::new(key.clone(), Operator::NearSphere, point),
            Constraint::new(key, Operator::MaxDistance, distance),
        ]
    } else {
        vec![
            Constraint::new(key.clone(), Operator::CenterSphere, point),
            Constraint::new(key, Operator::GeoWithin, distance),
        ]
    }
}

/// Field is within `distance` miles of the point.
pub fn within_miles(
    key: impl Into<FieldKey>,
    point: GeoPoint,
    distance: f64,
    sorted: bool,
) -> Vec<Constraint> {
    within_radians(key, point, distance / EARTH_RADIUS_MILES, sorted)
}

/// Field is within `distance` kilometers of the point.
pub fn within_kilometers(
    key: impl Into<FieldKey>,
    point: GeoPoint,
    distance: f64,
    sorted: bool,
) -> Vec<Constraint> {
    within_radians(key, point, distance / EARTH_RADIUS_KILOMETERS, sorted)
}

/// Field is inside the box spanned by two opposite corners.
pub fn within_geo_box(
    key: impl Into<FieldKey>,
    south_west: GeoPoint,
    north_east: GeoPoint,
) -> Constraint {
    let corners = QueryValue::list(vec![south_west, north_east]);
    Constraint::new(key, Operator::Within, keyed(Operator::Box, corners))
}

/// Field is inside the polygon described by `points`.
///
/// Points are flattened to `[latitude, longitude]` pairs.
pub fn within_polygon(key: impl Into<FieldKey>, points: &[GeoPoint]) -> Result<Constraint> {
    if points.len() < 3 {
        return Err(Error::InvalidPolygon(format!(
            "a polygon needs at least 3 points, got {}",
            points.len()
        )));
    }
    let pairs = QueryValue::list(
        points
            .iter()
            .map(|p| QueryValue::list(p.pair().to_vec())),
    );
    Ok(Constraint::new(
        key,
        Operator::GeoWithin,
        keyed(Operator::Polygon, pairs),
    ))
}

/// Field is inside an already built polygon.
pub fn within_polygon_shape(key: impl Into<FieldKey>, polygon: &Polygon) -> Constraint {
    Constraint::new(
        key,
        Operator::GeoWithin,
        keyed(Operator::Polygon, polygon.clone()),
    )
}

/// Polygon field contains the point.
pub fn polygon_contains(key: impl Into<FieldKey>, point: GeoPoint) -> Constraint {
    Constraint::new(key, Operator::GeoIntersects, keyed(Operator::Point, point))
}
