//! Map view and observer doubles that record what the overlay asked of them.

use crate::geo::{BoundingBox, Feature, FeatureId};
use crate::overlay::{FeatureObserver, MapView, Style};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, PartialEq)]
pub enum MapCall {
    Show(FeatureId),
    Hide(FeatureId),
}

pub struct RecordingMapView {
    viewport: Mutex<BoundingBox>,
    calls: Mutex<Vec<MapCall>>,
    last_style: Mutex<Option<Style>>,
    labels: Mutex<Vec<String>>,
}

impl RecordingMapView {
    pub fn new(viewport: BoundingBox) -> Self {
        Self {
            viewport: Mutex::new(viewport),
            calls: Mutex::new(Vec::new()),
            last_style: Mutex::new(None),
            labels: Mutex::new(Vec::new()),
        }
    }

    /// Simulates the user panning or zooming.
    pub fn set_viewport(&self, viewport: BoundingBox) {
        *self.viewport.lock().unwrap_or_else(PoisonError::into_inner) = viewport;
    }

    pub fn calls(&self) -> Vec<MapCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn shown_ids(&self) -> Vec<FeatureId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MapCall::Show(id) => Some(id),
                MapCall::Hide(_) => None,
            })
            .collect()
    }

    pub fn last_style(&self) -> Option<Style> {
        self.last_style
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Labels bound to shown features, in order.
    pub fn labels(&self) -> Vec<String> {
        self.labels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl MapView for RecordingMapView {
    fn viewport(&self) -> BoundingBox {
        *self.viewport.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn show_feature(&self, feature: &Feature, style: &Style) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(MapCall::Show(feature.id));
        self.labels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(feature.name.clone());
        *self.last_style.lock().unwrap_or_else(PoisonError::into_inner) = Some(style.clone());
    }

    fn hide_feature(&self, feature: &Feature) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(MapCall::Hide(feature.id));
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    seen: Mutex<Vec<Option<FeatureId>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids passed to `on_active_feature`, `None` for "nothing active".
    pub fn ids(&self) -> Vec<Option<FeatureId>> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl FeatureObserver for RecordingObserver {
    fn on_active_feature(&self, feature: Option<&Feature>) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(feature.map(|f| f.id));
    }
}
