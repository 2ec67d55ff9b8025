//! Overlay controller: turns map events into cache refreshes and hit tests,
//! and keeps track of the highlighted feature.

use super::style::{Style, StyleFn};
use super::{FeatureObserver, MapView};
use crate::api::WikimapiaClient;
use crate::cache::FeatureCache;
use crate::config::Config;
use crate::error::OverlayError;
use crate::geo::{Feature, Point};
use crate::resolver::HitResolver;
use crate::utils::Debouncer;
use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use tokio::runtime::Handle;

/// Pointer session state. Hit testing only happens while `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerState {
    #[default]
    Idle,
    /// A button is held, e.g. the map is being panned
    Dragging,
}

#[derive(Debug, Default)]
struct SessionState {
    pointer: PointerState,
    active: Option<Feature>,
}

struct Inner {
    cache: Arc<FeatureCache>,
    resolver: HitResolver,
    map: Arc<dyn MapView>,
    observers: RwLock<Vec<Arc<dyn FeatureObserver>>>,
    style: RwLock<Option<StyleFn>>,
    session: Mutex<SessionState>,
    hit_debouncer: Debouncer,
    attached: AtomicBool,
    attribution: String,
}

pub struct OverlayController {
    inner: Arc<Inner>,
}

impl OverlayController {
    /// Must be called from within a tokio runtime.
    pub fn new(
        cache: Arc<FeatureCache>,
        map: Arc<dyn MapView>,
        config: &Config,
    ) -> Result<Self, OverlayError> {
        let runtime = Handle::try_current()
            .map_err(|e| OverlayError::RuntimeUnavailable(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(Inner {
                cache,
                resolver: HitResolver::from_config(config),
                map,
                observers: RwLock::new(Vec::new()),
                style: RwLock::new(None),
                session: Mutex::new(SessionState::default()),
                hit_debouncer: Debouncer::new("pointer", config.pointer_debounce(), runtime),
                attached: AtomicBool::new(false),
                attribution: config.attribution.clone(),
            }),
        })
    }

    /// Controller backed by the Wikimapia box API.
    pub fn with_wikimapia(map: Arc<dyn MapView>, config: &Config) -> Result<Self, OverlayError> {
        let runtime = Handle::try_current()
            .map_err(|e| OverlayError::RuntimeUnavailable(e.to_string()))?;
        let client = Arc::new(WikimapiaClient::new(config)?);
        let cache = Arc::new(FeatureCache::new(client, config, runtime));
        Self::new(cache, map, config)
    }

    pub fn with_style(self, style: StyleFn) -> Self {
        self.set_style(style);
        self
    }

    /// Replaces the style function and restyles the active feature.
    pub fn set_style(&self, style: StyleFn) {
        *self
            .inner
            .style
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(style);

        if let Some(active) = self.active_feature() {
            let style = self.inner.style_for(&active);
            self.inner.map.hide_feature(&active);
            self.inner.map.show_feature(&active, &style);
        }
    }

    pub fn add_observer(&self, observer: Arc<dyn FeatureObserver>) {
        self.inner
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    pub fn cache(&self) -> &Arc<FeatureCache> {
        &self.inner.cache
    }

    pub fn attribution(&self) -> &str {
        &self.inner.attribution
    }

    pub fn is_attached(&self) -> bool {
        self.inner.attached.load(Ordering::SeqCst)
    }

    pub fn pointer_state(&self) -> PointerState {
        self.inner.lock_session().pointer
    }

    pub fn active_feature(&self) -> Option<Feature> {
        self.inner.lock_session().active.clone()
    }

    /// Starts listening: refreshes the features of the current viewport.
    pub fn attach(&self) {
        if self.inner.attached.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Overlay attached");
        self.request_refresh();
    }

    /// Stops listening: cancels pending work and clears the highlight.
    pub fn detach(&self) {
        if !self.inner.attached.swap(false, Ordering::SeqCst) {
            return;
        }
        self.inner.hit_debouncer.cancel();
        self.inner.cache.cancel_pending_refresh();
        self.inner.clear_active();
        info!("Overlay detached");
    }

    /// Schedules a refresh of the currently visible region.
    pub fn request_refresh(&self) {
        if !self.is_attached() {
            return;
        }
        self.inner.cache.on_viewport_changed(self.inner.map.viewport());
    }

    /// Map moved, zoomed or was reset.
    pub fn on_viewport_changed(&self) {
        self.request_refresh();
    }

    pub fn on_pointer_down(&self) {
        self.inner.lock_session().pointer = PointerState::Dragging;
        self.inner.hit_debouncer.cancel();
    }

    pub fn on_pointer_up(&self) {
        self.inner.lock_session().pointer = PointerState::Idle;
    }

    /// Schedules a debounced hit test at `point` unless a button is held.
    pub fn on_pointer_move(&self, point: Point) {
        if !self.is_attached() || self.pointer_state() == PointerState::Dragging {
            return;
        }
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        self.inner.hit_debouncer.schedule(move || async move {
            if let Some(inner) = weak.upgrade() {
                inner.hit_test(point);
            }
        });
    }

    /// Pointer left the map: clears the highlight immediately.
    pub fn on_pointer_leave(&self) {
        self.inner.hit_debouncer.cancel();
        self.inner.clear_active();
    }

    /// Runs a hit test right away, bypassing the debounce.
    pub fn hit_test_now(&self, point: Point) -> Option<Feature> {
        self.inner.hit_test(point);
        self.active_feature()
    }
}

impl Inner {
    fn lock_session(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn hit_test(&self, point: Point) {
        if self.lock_session().pointer == PointerState::Dragging {
            return;
        }

        let snapshot = self.cache.get();
        let viewport = self.map.viewport();
        match self.resolver.resolve(&point, snapshot.values(), &viewport) {
            Some(feature) => self.set_active(feature),
            None => self.clear_active(),
        }
    }

    fn style_for(&self, feature: &Feature) -> Style {
        match self
            .style
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            Some(style_fn) => style_fn(feature),
            None => Style::default(),
        }
    }

    fn set_active(&self, feature: Feature) {
        let previous = {
            let mut session = self.lock_session();
            if session.active.as_ref().map(|f| f.id) == Some(feature.id) {
                return;
            }
            session.active.replace(feature.clone())
        };

        if let Some(previous) = previous {
            self.map.hide_feature(&previous);
        }
        debug!("Active feature {} ({})", feature.id, feature.name);
        self.notify(Some(&feature));
        let style = self.style_for(&feature);
        self.map.show_feature(&feature, &style);
    }

    fn clear_active(&self) {
        let previous = self.lock_session().active.take();
        if let Some(previous) = previous {
            self.map.hide_feature(&previous);
            debug!("Cleared active feature {}", previous.id);
            self.notify(None);
        }
    }

    fn notify(&self, feature: Option<&Feature>) {
        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in observers {
            observer.on_active_feature(feature);
        }
    }
}
