//! Scriptable in-memory feature source.

use crate::api::{BoxQuery, FeatureSource, RawRecord};
use crate::error::OverlayError;
use async_trait::async_trait;
use log::debug;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

type Response = Result<Vec<RawRecord>, OverlayError>;

/// Answers box queries from a queue of scripted responses, falling back to a
/// default response once the queue is empty. Every query is recorded.
pub struct MockFeatureSource {
    queued: Mutex<VecDeque<Response>>,
    default_response: Mutex<Response>,
    queries: Mutex<Vec<BoxQuery>>,
    latency: Duration,
}

impl Default for MockFeatureSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFeatureSource {
    pub fn new() -> Self {
        Self::with_latency(Duration::ZERO)
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            default_response: Mutex::new(Ok(Vec::new())),
            queries: Mutex::new(Vec::new()),
            latency,
        }
    }

    /// Every later query without a queued response returns `records`.
    pub fn respond_with(&self, records: Vec<RawRecord>) {
        *self
            .default_response
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Ok(records);
    }

    /// Every later query without a queued response fails with `error`.
    pub fn fail_with(&self, error: OverlayError) {
        *self
            .default_response
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Err(error);
    }

    /// Queues a one-shot response ahead of the default one.
    pub fn push_response(&self, response: Response) {
        self.queued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    pub fn queries(&self) -> Vec<BoxQuery> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl FeatureSource for MockFeatureSource {
    fn source_name(&self) -> &str {
        "Mock"
    }

    async fn fetch_box(&self, query: &BoxQuery) -> Result<Vec<RawRecord>, OverlayError> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*query);
        debug!("Mock box request #{} for {}", query.request_id, query.bbox);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let queued = self
            .queued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match queued {
            Some(response) => response,
            None => self
                .default_response
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }
}

/// Box API record for an axis-aligned rectangle, vertices in `x = lng, y = lat`.
pub fn rect_record(id: u64, name: &str, south: f64, west: f64, north: f64, east: f64) -> RawRecord {
    json!({
        "id": id,
        "name": name,
        "url": format!("http://wikimapia.org/{}/", id),
        "location": {"south": south, "west": west, "north": north, "east": east},
        "polygon": [
            {"x": west, "y": south},
            {"x": east, "y": south},
            {"x": east, "y": north},
            {"x": west, "y": north}
        ]
    })
}
