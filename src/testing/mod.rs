//! Test doubles for the overlay: a scriptable feature source plus map view and
//! observer implementations that record every call.

pub mod mock_source;
pub mod recording;

pub use mock_source::{rect_record, MockFeatureSource};
pub use recording::{MapCall, RecordingMapView, RecordingObserver};
