use std::env;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://api.wikimapia.org/";
pub const DEFAULT_ATTRIBUTION: &str =
    "<a href=\"http://wikimapia.org\" target=\"_blank\">Wikimapia.org</a>";

/// Features roughly one-twelfth of the viewport are considered "ideal" size.
pub const DEFAULT_REFERENCE_AREA_DIVISOR: f64 = 12.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub api_key: Option<String>,
    /// Result cap sent with every box query
    pub result_count: u32,
    pub response_format: String,
    /// Compression requested from the service, e.g. "gzip"
    pub pack: Option<String>,
    pub language: Option<String>,
    pub viewport_debounce_ms: u64,
    pub pointer_debounce_ms: u64,
    pub request_timeout_secs: u64,
    pub reference_area_divisor: f64,
    pub attribution: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            result_count: 100,
            response_format: "json".to_string(),
            pack: Some("gzip".to_string()),
            language: None,
            viewport_debounce_ms: 0,
            pointer_debounce_ms: 0,
            request_timeout_secs: 30,
            reference_area_divisor: DEFAULT_REFERENCE_AREA_DIVISOR,
            attribution: DEFAULT_ATTRIBUTION.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Config {
            api_url: env::var("OVERLAY_API_URL").unwrap_or(defaults.api_url),
            api_key: env::var("OVERLAY_API_KEY").ok().filter(|k| !k.is_empty()),
            result_count: env::var("OVERLAY_RESULT_COUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.result_count),
            response_format: env::var("OVERLAY_RESPONSE_FORMAT")
                .unwrap_or(defaults.response_format),
            pack: match env::var("OVERLAY_PACK") {
                Ok(v) if v.is_empty() || v == "none" => None,
                Ok(v) => Some(v),
                Err(_) => defaults.pack,
            },
            language: env::var("OVERLAY_LANGUAGE").ok().filter(|l| !l.is_empty()),
            viewport_debounce_ms: env::var("OVERLAY_VIEWPORT_DEBOUNCE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.viewport_debounce_ms),
            pointer_debounce_ms: env::var("OVERLAY_POINTER_DEBOUNCE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.pointer_debounce_ms),
            request_timeout_secs: env::var("OVERLAY_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
            reference_area_divisor: env::var("OVERLAY_REFERENCE_AREA_DIVISOR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.reference_area_divisor),
            attribution: env::var("OVERLAY_ATTRIBUTION").unwrap_or(defaults.attribution),
        }
    }

    pub fn viewport_debounce(&self) -> Duration {
        Duration::from_millis(self.viewport_debounce_ms)
    }

    pub fn pointer_debounce(&self) -> Duration {
        Duration::from_millis(self.pointer_debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate_and_log(&self) {
        log::info!("Overlay Configuration Loaded: {:?}", self);
        if self.api_key.is_none() {
            log::warn!("OVERLAY_API_KEY is not set; the service may reject box queries.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_defaults_match_service_conventions() {
        let config = Config::default();
        assert_eq!(config.result_count, 100);
        assert_eq!(config.response_format, "json");
        assert_eq!(config.pack.as_deref(), Some("gzip"));
        assert_eq!(config.viewport_debounce(), Duration::ZERO);
        assert_eq!(config.pointer_debounce(), Duration::ZERO);
        assert_approx_eq!(config.reference_area_divisor, 12.0);
    }
}
