//! Map feature overlay: a viewport-driven cache of polygon features fetched from
//! a bounding-box query service, and a point-in-polygon resolver that decides
//! which feature the pointer is over.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod geo;
pub mod overlay;
pub mod resolver;
pub mod testing; // Test doubles, also used by the integration tests
pub mod utils;

pub use api::{BoxQuery, FeatureSource, WikimapiaClient};
pub use cache::{FeatureCache, FeatureSnapshot};
pub use config::Config;
pub use error::OverlayError;
pub use geo::{BoundingBox, Feature, FeatureId, Point, Polygon};
pub use overlay::{FeatureObserver, MapView, OverlayController, PointerState, Style, StyleFn};
pub use resolver::HitResolver;
