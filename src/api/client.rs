//! Feature source abstraction and the Wikimapia box API client.

use super::models::{parse_box_response, RawRecord};
use crate::config::Config;
use crate::error::OverlayError;
use crate::geo::BoundingBox;
use async_trait::async_trait;
use log::{debug, warn};
use url::Url;

const USER_AGENT: &str = concat!("feature-overlay/", env!("CARGO_PKG_VERSION"));

/// Parameters of a single box query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxQuery {
    pub bbox: BoundingBox,
    /// Result cap
    pub count: u32,
    /// Correlation token for matching a response to its request in logs
    pub request_id: u64,
}

/// Anything that can answer a bounding-box query with raw feature records.
#[async_trait]
pub trait FeatureSource: Send + Sync {
    /// Returns the name of the source (used in log lines).
    fn source_name(&self) -> &str;

    /// Fetches the records intersecting `query.bbox`.
    async fn fetch_box(&self, query: &BoxQuery) -> Result<Vec<RawRecord>, OverlayError>;
}

/// HTTP client for the Wikimapia `function=box` endpoint.
#[derive(Clone)]
pub struct WikimapiaClient {
    http: reqwest::Client,
    api_url: Url,
    api_key: Option<String>,
    response_format: String,
    pack: Option<String>,
    language: Option<String>,
}

impl WikimapiaClient {
    pub fn new(config: &Config) -> Result<Self, OverlayError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| OverlayError::FetchFailure(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_url: Url::parse(&config.api_url)?,
            api_key: config.api_key.clone(),
            response_format: config.response_format.clone(),
            pack: config.pack.clone(),
            language: config.language.clone(),
        })
    }

    /// Full request URL for `query`.
    pub fn box_url(&self, query: &BoxQuery) -> Url {
        let mut url = self.api_url.clone();
        {
            let mut params = url.query_pairs_mut();
            params
                .append_pair("function", "box")
                .append_pair("bbox", &query.bbox.to_bbox_string())
                .append_pair("format", &self.response_format)
                .append_pair("count", &query.count.to_string());
            if let Some(key) = &self.api_key {
                params.append_pair("key", key);
            }
            if let Some(pack) = &self.pack {
                params.append_pair("pack", pack);
            }
            if let Some(language) = &self.language {
                params.append_pair("language", language);
            }
        }
        url
    }
}

#[async_trait]
impl FeatureSource for WikimapiaClient {
    fn source_name(&self) -> &str {
        "Wikimapia"
    }

    async fn fetch_box(&self, query: &BoxQuery) -> Result<Vec<RawRecord>, OverlayError> {
        let url = self.box_url(query);
        debug!("Box request #{} -> {}", query.request_id, query.bbox);

        let response = self
            .http
            .get(url)
            .header("X-Request-Id", query.request_id.to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("HTTP error {} for box request #{}", status, query.request_id);
            return Err(OverlayError::FetchFailure(format!(
                "HTTP {} for box request #{}",
                status, query.request_id
            )));
        }

        let body = response.text().await?;
        parse_box_response(&body)
    }
}
