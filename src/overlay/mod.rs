// src/overlay/mod.rs
//! Event glue between the map, the feature cache and the hit resolver.

pub mod controller;
pub mod style;

pub use controller::{OverlayController, PointerState};
pub use style::{constant_style, Style, StyleFn};

use crate::geo::{BoundingBox, Feature};

/// The map-rendering collaborator. The overlay never draws anything itself.
pub trait MapView: Send + Sync {
    /// Geographic extent currently visible.
    fn viewport(&self) -> BoundingBox;

    /// Adds a highlighted representation of `feature`, labelled with its name.
    fn show_feature(&self, feature: &Feature, style: &Style);

    /// Removes the representation added by `show_feature`.
    fn hide_feature(&self, feature: &Feature);
}

/// Receives the active feature whenever it changes; `None` when the pointer is
/// over nothing or has left the map.
pub trait FeatureObserver: Send + Sync {
    fn on_active_feature(&self, feature: Option<&Feature>);
}
