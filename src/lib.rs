pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod geometry;
pub mod normalize;
pub mod ranking;
pub mod series;
pub mod types;

pub use error::SelectionError;
pub use geometry::{classify, select, to_geojson_order, FeatureIndex};
pub use normalize::{apply_range, ReadingRange};
pub use types::{
    FeatureId, GeoFeature, GeometryKind, IdSelectionSet, Normalised, Reading, Rectangle,
    SuburbReading,
};
