use crate::error::SelectionError;
use crate::types::{FeatureId, GeoFeature, GeometryKind, IdSelectionSet, Rectangle};
use geo::{Area, BooleanOps, BoundingRect, Contains, Intersects, LineString, Polygon, Rect};
use rayon::prelude::*;
use rstar::{RTree, RTreeObject, AABB};
use std::collections::BTreeSet;

/// Shared geometry kind of a collection, `None` when it is empty.
pub fn classify(features: &[GeoFeature]) -> Result<Option<GeometryKind>, SelectionError> {
    let mut kind: Option<GeometryKind> = None;
    for feature in features {
        match kind {
            None => kind = Some(feature.kind()),
            Some(expected) if expected != feature.kind() => {
                return Err(SelectionError::GeometryTypeMismatch {
                    expected,
                    found: feature.kind(),
                    id: feature.id(),
                });
            }
            Some(_) => {}
        }
    }
    Ok(kind)
}

/// Turns a `[lat, lng]` rectangle into a closed `[lng, lat]` ring.
///
/// The ring runs counter-clockwise from the south-west corner:
/// SW, SE, NE, NW, SW.
pub fn to_geojson_order(rect: &Rectangle) -> Polygon<f64> {
    let (south, west, north, east) = rect.bounds();
    let ring = LineString::from(vec![
        (west, south),
        (east, south),
        (east, north),
        (west, north),
        (west, south),
    ]);
    Polygon::new(ring, vec![])
}

/// Ids of the features inside `rectangle`.
///
/// Points strictly inside the rectangle are selected; a point lying exactly on
/// an edge is not. Polygons are selected when they overlap the rectangle with
/// positive area, so a polygon that only touches an edge is not. Polygon
/// features without geometry are never selected. No rectangle selects nothing.
pub fn select(
    rectangle: Option<&Rectangle>,
    features: &[GeoFeature],
) -> Result<IdSelectionSet, SelectionError> {
    let kind = classify(features)?;
    let (Some(rectangle), Some(kind)) = (rectangle, kind) else {
        return Ok(IdSelectionSet::new());
    };

    let bounds = to_geojson_order(rectangle);
    let selected: BTreeSet<FeatureId> = features
        .par_iter()
        .filter(|feature| is_selected(&bounds, feature))
        .map(GeoFeature::id)
        .collect();

    tracing::debug!(%kind, features = features.len(), selected = selected.len(), "selected geometries");
    Ok(selected.into())
}

fn is_selected(bounds: &Polygon<f64>, feature: &GeoFeature) -> bool {
    match feature {
        GeoFeature::Point { coord, .. } => bounds.contains(coord),
        GeoFeature::Polygon { geometry: Some(polygon), .. } => overlaps(bounds, polygon),
        GeoFeature::Polygon { geometry: None, .. } => false,
    }
}

fn overlaps(bounds: &Polygon<f64>, polygon: &Polygon<f64>) -> bool {
    if !bounds.intersects(polygon) {
        return false;
    }
    bounds.intersection(polygon).unsigned_area() > 0.0
}

// Slot into `FeatureIndex::features` plus the feature's envelope.
struct IndexedFeature {
    slot: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedFeature {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

/// A validated feature collection with an R-tree over its envelopes, for
/// repeated selections against the same layer as the user redraws.
pub struct FeatureIndex {
    features: Vec<GeoFeature>,
    kind: Option<GeometryKind>,
    tree: RTree<IndexedFeature>,
}

impl FeatureIndex {
    pub fn build(features: Vec<GeoFeature>) -> Result<Self, SelectionError> {
        let kind = classify(&features)?;

        let items: Vec<IndexedFeature> = features
            .iter()
            .enumerate()
            .filter_map(|(slot, feature)| {
                envelope(feature).map(|rect| IndexedFeature {
                    slot,
                    aabb: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                })
            })
            .collect();

        tracing::debug!(features = features.len(), indexed = items.len(), "built feature index");

        Ok(FeatureIndex {
            features,
            kind,
            tree: RTree::bulk_load(items),
        })
    }

    pub fn kind(&self) -> Option<GeometryKind> {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Same result as [`select`] over the indexed features.
    pub fn select(&self, rectangle: Option<&Rectangle>) -> IdSelectionSet {
        let Some(rectangle) = rectangle else {
            return IdSelectionSet::new();
        };
        let (south, west, north, east) = rectangle.bounds();
        let query = AABB::from_corners([west, south], [east, north]);
        let bounds = to_geojson_order(rectangle);

        self.tree
            .locate_in_envelope_intersecting(&query)
            .filter_map(|item| self.features.get(item.slot))
            .filter(|feature| is_selected(&bounds, feature))
            .map(GeoFeature::id)
            .collect()
    }
}

fn envelope(feature: &GeoFeature) -> Option<Rect<f64>> {
    match feature {
        GeoFeature::Point { coord, .. } => Some(Rect::new(*coord, *coord)),
        GeoFeature::Polygon { geometry, .. } => geometry.as_ref()?.bounding_rect(),
    }
}
