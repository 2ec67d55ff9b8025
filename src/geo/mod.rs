//! Geographic primitives: points, bounding boxes, polygons and features.

pub mod polygon;
pub mod types;

pub use polygon::Polygon;
pub use types::{BoundingBox, Feature, FeatureId, Point};
