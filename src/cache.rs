// src/cache.rs
//! Viewport-driven in-memory feature cache.
//!
//! Features are keyed by id in insertion order. Readers get an immutable
//! snapshot (`Arc`), writers clone-merge-swap under the write lock, so a hit
//! test never observes a half-applied batch.

use crate::api::{parse_box_response, BoxQuery, FeatureSource, RawFeature, RawRecord};
use crate::config::Config;
use crate::error::OverlayError;
use crate::geo::{BoundingBox, Feature, FeatureId};
use crate::utils::Debouncer;
use indexmap::IndexMap;
use log::{debug, info, warn};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use tokio::runtime::Handle;

pub type FeatureMap = IndexMap<FeatureId, Feature>;

/// Read-only view of the cache at one point in time.
pub type FeatureSnapshot = Arc<FeatureMap>;

pub struct FeatureCache {
    source: Arc<dyn FeatureSource>,
    result_count: u32,
    features: RwLock<FeatureSnapshot>,
    request_counter: AtomicU64,
    pending_viewport: Mutex<Option<BoundingBox>>,
    refresh_debouncer: Debouncer,
    runtime: Handle,
}

impl fmt::Debug for FeatureCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureCache")
            .field("source", &self.source.source_name())
            .field("result_count", &self.result_count)
            .field("features", &self.len())
            .field("requests_issued", &self.requests_issued())
            .finish()
    }
}

impl FeatureCache {
    pub fn new(source: Arc<dyn FeatureSource>, config: &Config, runtime: Handle) -> Self {
        info!(
            "Initializing feature cache: source={}, count={}, debounce={:?}",
            source.source_name(),
            config.result_count,
            config.viewport_debounce()
        );
        Self {
            source,
            result_count: config.result_count,
            features: RwLock::new(Arc::new(FeatureMap::new())),
            request_counter: AtomicU64::new(0),
            pending_viewport: Mutex::new(None),
            refresh_debouncer: Debouncer::new("viewport", config.viewport_debounce(), runtime.clone()),
            runtime,
        }
    }

    /// Schedules a debounced refresh for `bbox`; a newer call replaces it.
    ///
    /// Once the debounce fires the fetch runs detached and is never cancelled.
    /// Its failure is logged and otherwise ignored.
    pub fn on_viewport_changed(self: &Arc<Self>, bbox: BoundingBox) {
        *self
            .pending_viewport
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(bbox);

        let weak: Weak<FeatureCache> = Arc::downgrade(self);
        self.refresh_debouncer.schedule(move || async move {
            let Some(cache) = weak.upgrade() else {
                return;
            };
            let Some(bbox) = cache.pending_viewport() else {
                return;
            };
            let runtime = cache.runtime.clone();
            runtime.spawn(async move {
                if let Err(e) = cache.refresh(bbox).await {
                    warn!("Feature refresh for {} failed: {}", bbox, e);
                }
            });
        });
    }

    /// Queries the source for `bbox` and merges the result.
    ///
    /// Returns the number of features applied. On error the cache is unchanged.
    pub async fn refresh(&self, bbox: BoundingBox) -> Result<usize, OverlayError> {
        let request_id = self.request_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let query = BoxQuery {
            bbox,
            count: self.result_count,
            request_id,
        };

        let records = match self.source.fetch_box(&query).await {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    "{} box request #{} failed: {}",
                    self.source.source_name(),
                    request_id,
                    e
                );
                return Err(e);
            }
        };

        let applied = self.apply_batch(&records);
        info!(
            "Box request #{} for {}: {} of {} records applied, {} features cached",
            request_id,
            bbox,
            applied,
            records.len(),
            self.len()
        );
        Ok(applied)
    }

    /// Converts and upserts every well-formed record; bad records are skipped.
    ///
    /// Applying the same batch twice leaves the cache as after the first time.
    pub fn apply_batch(&self, records: &[RawRecord]) -> usize {
        let features: Vec<Feature> = records
            .iter()
            .filter_map(|record| match RawFeature::from_record(record) {
                Ok(feature) => Some(feature),
                Err(e) => {
                    warn!("Skipping feature record: {}", e);
                    None
                }
            })
            .collect();

        if features.is_empty() {
            return 0;
        }

        let applied = features.len();
        let mut guard = self.features.write().unwrap_or_else(PoisonError::into_inner);
        let map = Arc::make_mut(&mut *guard);
        for feature in features {
            debug!("Upserting feature {} ({})", feature.id, feature.name);
            map.insert(feature.id, feature);
        }
        applied
    }

    /// Parses a complete box response document and merges it.
    pub fn apply_box_response(&self, body: &str) -> Result<usize, OverlayError> {
        let records = parse_box_response(body)?;
        Ok(self.apply_batch(&records))
    }

    pub fn get(&self) -> FeatureSnapshot {
        Arc::clone(&self.features.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn feature(&self, id: FeatureId) -> Option<Feature> {
        self.get().get(&id).cloned()
    }

    pub fn contains(&self, id: FeatureId) -> bool {
        self.get().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.get().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Most recent viewport handed to `on_viewport_changed`.
    pub fn pending_viewport(&self) -> Option<BoundingBox> {
        *self
            .pending_viewport
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of box requests issued so far.
    pub fn requests_issued(&self) -> u64 {
        self.request_counter.load(Ordering::SeqCst)
    }

    /// Cancels any pending refresh and drops every feature.
    pub fn clear(&self) {
        self.refresh_debouncer.cancel();
        *self
            .pending_viewport
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
        *self.features.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(FeatureMap::new());
        info!("Feature cache cleared");
    }

    /// Cancels a scheduled (not yet started) refresh.
    pub fn cancel_pending_refresh(&self) {
        self.refresh_debouncer.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{rect_record, MockFeatureSource};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;

    fn bbox(s: f64, w: f64, n: f64, e: f64) -> BoundingBox {
        BoundingBox::new(s, w, n, e).unwrap()
    }

    fn cache_with(source: Arc<MockFeatureSource>) -> Arc<FeatureCache> {
        Arc::new(FeatureCache::new(source, &Config::default(), Handle::current()))
    }

    #[tokio::test]
    async fn test_refresh_populates_cache() {
        let source = Arc::new(MockFeatureSource::new());
        source.respond_with(vec![
            rect_record(1, "Park", 0.0, 0.0, 1.0, 1.0),
            rect_record(2, "Lake", 2.0, 2.0, 3.0, 3.0),
        ]);
        let cache = cache_with(Arc::clone(&source));

        let applied = cache.refresh(bbox(0.0, 0.0, 5.0, 5.0)).await.unwrap();
        assert_eq!(applied, 2);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.feature(2).map(|f| f.name), Some("Lake".to_string()));

        let queries = source.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].count, 100);
        assert_eq!(queries[0].request_id, 1);
    }

    #[tokio::test]
    async fn test_same_batch_twice_is_idempotent() {
        let cache = cache_with(Arc::new(MockFeatureSource::new()));
        let batch = vec![
            rect_record(1, "Park", 0.0, 0.0, 1.0, 1.0),
            rect_record(2, "Lake", 2.0, 2.0, 3.0, 3.0),
        ];

        cache.apply_batch(&batch);
        let first = cache.get();
        cache.apply_batch(&batch);
        let second = cache.get();

        assert_eq!(*first, *second);
    }

    #[tokio::test]
    async fn test_upsert_keeps_position_and_updates_fields() {
        let cache = cache_with(Arc::new(MockFeatureSource::new()));
        cache.apply_batch(&[
            rect_record(1, "Park", 0.0, 0.0, 1.0, 1.0),
            rect_record(2, "Lake", 2.0, 2.0, 3.0, 3.0),
        ]);
        cache.apply_batch(&[rect_record(1, "Renamed Park", 0.0, 0.0, 1.5, 1.5)]);

        let snapshot = cache.get();
        let ids: Vec<FeatureId> = snapshot.keys().copied().collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(snapshot[&1].name, "Renamed Park");
        assert_eq!(snapshot[&1].bounds.north(), 1.5);
    }

    #[tokio::test]
    async fn test_malformed_records_are_skipped_individually() {
        let cache = cache_with(Arc::new(MockFeatureSource::new()));
        let applied = cache.apply_batch(&[
            rect_record(1, "Good", 0.0, 0.0, 1.0, 1.0),
            json!({"id": 2, "name": "No geometry"}),
            json!({
                "id": 3,
                "location": {"south": 0, "west": 0, "north": 1, "east": 1},
                "polygon": [{"x": 0, "y": 0}, {"x": 1, "y": 1}]
            }),
            rect_record(4, "Also good", 2.0, 2.0, 3.0, 3.0),
        ]);

        assert_eq!(applied, 2);
        assert!(cache.contains(1));
        assert!(!cache.contains(2));
        assert!(!cache.contains(3));
        assert!(cache.contains(4));
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_cache_untouched() {
        let source = Arc::new(MockFeatureSource::new());
        let cache = cache_with(Arc::clone(&source));
        cache.apply_batch(&[rect_record(1, "Park", 0.0, 0.0, 1.0, 1.0)]);
        let before = cache.get();

        source.fail_with(OverlayError::FetchFailure("connection reset".to_string()));
        let result = cache.refresh(bbox(0.0, 0.0, 5.0, 5.0)).await;

        assert!(matches!(result, Err(OverlayError::FetchFailure(_))));
        assert_eq!(*cache.get(), *before);
        assert_eq!(cache.requests_issued(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_is_not_affected_by_later_merge() {
        let cache = cache_with(Arc::new(MockFeatureSource::new()));
        cache.apply_batch(&[rect_record(1, "Park", 0.0, 0.0, 1.0, 1.0)]);
        let snapshot = cache.get();
        cache.apply_batch(&[rect_record(2, "Lake", 2.0, 2.0, 3.0, 3.0)]);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_viewport_burst_issues_single_request_for_last_bbox() {
        let source = Arc::new(MockFeatureSource::new());
        source.respond_with(vec![rect_record(1, "Park", 0.0, 0.0, 1.0, 1.0)]);
        let cache = cache_with(Arc::clone(&source));

        cache.on_viewport_changed(bbox(0.0, 0.0, 1.0, 1.0));
        cache.on_viewport_changed(bbox(0.0, 0.0, 2.0, 2.0));
        cache.on_viewport_changed(bbox(0.0, 0.0, 3.0, 3.0));

        tokio::time::sleep(Duration::from_millis(50)).await;

        let queries = source.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].bbox, bbox(0.0, 0.0, 3.0, 3.0));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_request_ids_strictly_increase() {
        let source = Arc::new(MockFeatureSource::new());
        let cache = cache_with(Arc::clone(&source));
        for _ in 0..3 {
            cache.refresh(bbox(0.0, 0.0, 1.0, 1.0)).await.unwrap();
        }
        let ids: Vec<u64> = source.queries().iter().map(|q| q.request_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_clear_drops_features_and_pending_refresh() {
        let source = Arc::new(MockFeatureSource::new());
        let cache = cache_with(Arc::clone(&source));
        cache.apply_batch(&[rect_record(1, "Park", 0.0, 0.0, 1.0, 1.0)]);

        cache.on_viewport_changed(bbox(0.0, 0.0, 1.0, 1.0));
        cache.clear();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(cache.is_empty());
        assert!(source.queries().is_empty());
        assert_eq!(cache.pending_viewport(), None);
    }

    #[tokio::test]
    async fn test_apply_box_response_document() {
        let cache = cache_with(Arc::new(MockFeatureSource::new()));
        let body = json!({"folder": [rect_record(9, "Square", 0.0, 0.0, 1.0, 1.0)]}).to_string();
        assert_eq!(cache.apply_box_response(&body).unwrap(), 1);
        assert!(cache.contains(9));
        assert!(cache.apply_box_response("{}").is_err());
    }
}
