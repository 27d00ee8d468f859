use crate::types::{FeatureId, GeometryKind};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// A collection mixed point and polygon features.
    #[error("geometry type mismatch: expected {expected}, found {found} on feature {id}")]
    GeometryTypeMismatch {
        expected: GeometryKind,
        found: GeometryKind,
        id: FeatureId,
    },
}
