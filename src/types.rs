use geo::{Coord, Polygon};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// Database id of a suburb, site or sensor.
pub type FeatureId = i64;

/// Anything carrying an optional raw measurement.
pub trait Reading {
    fn reading(&self) -> Option<f64>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuburbReading {
    pub id: FeatureId,
    #[serde(default)]
    pub name: String,
    pub reading: Option<f64>,
}

impl Reading for SuburbReading {
    fn reading(&self) -> Option<f64> {
        self.reading
    }
}

/// An entity annotated with its reading rescaled into [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Normalised<T> {
    #[serde(flatten)]
    pub entity: T,
    #[serde(rename = "readingNormalised")]
    pub reading_normalised: Option<f64>,
}

impl<T: Reading> Reading for Normalised<T> {
    fn reading(&self) -> Option<f64> {
        self.entity.reading()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    Polygon,
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryKind::Point => write!(f, "Point"),
            GeometryKind::Polygon => write!(f, "Polygon"),
        }
    }
}

/// A map feature. Coordinates are (x = longitude, y = latitude).
#[derive(Debug, Clone, PartialEq)]
pub enum GeoFeature {
    Point { id: FeatureId, coord: Coord<f64> },
    Polygon { id: FeatureId, geometry: Option<Polygon<f64>> },
}

impl GeoFeature {
    pub fn id(&self) -> FeatureId {
        match self {
            GeoFeature::Point { id, .. } | GeoFeature::Polygon { id, .. } => *id,
        }
    }

    pub fn kind(&self) -> GeometryKind {
        match self {
            GeoFeature::Point { .. } => GeometryKind::Point,
            GeoFeature::Polygon { .. } => GeometryKind::Polygon,
        }
    }
}

/// A user-drawn rectangle: two opposite corners as `[lat, lng]`, in click order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rectangle(pub [[f64; 2]; 2]);

impl Rectangle {
    pub fn new(first: [f64; 2], second: [f64; 2]) -> Self {
        Rectangle([first, second])
    }

    /// Parses `lat1,lng1,lat2,lng2`.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .ok()?;
        if parts.len() != 4 {
            return None;
        }
        Some(Rectangle::new([parts[0], parts[1]], [parts[2], parts[3]]))
    }

    /// `(south, west, north, east)` regardless of the corner order the user drew.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let [[lat_a, lng_a], [lat_b, lng_b]] = self.0;
        (
            lat_a.min(lat_b),
            lng_a.min(lng_b),
            lat_a.max(lat_b),
            lng_a.max(lng_b),
        )
    }
}

/// Ids inside the current rectangle. Unselected ids are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdSelectionSet(BTreeSet<FeatureId>);

impl IdSelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: FeatureId) -> bool {
        self.0.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = FeatureId> + '_ {
        self.0.iter().copied()
    }
}

impl From<BTreeSet<FeatureId>> for IdSelectionSet {
    fn from(ids: BTreeSet<FeatureId>) -> Self {
        IdSelectionSet(ids)
    }
}

impl FromIterator<FeatureId> for IdSelectionSet {
    fn from_iter<I: IntoIterator<Item = FeatureId>>(iter: I) -> Self {
        IdSelectionSet(iter.into_iter().collect())
    }
}

// Serialized as `{"12": true, "40": true}`, the shape the map layers key on.
impl Serialize for IdSelectionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for id in &self.0 {
            map.serialize_entry(id, &true)?;
        }
        map.end()
    }
}
