pub mod settings;

pub use settings::Config;

use crate::error::OverlayError;
use std::sync::Arc;

/// Loads the overlay configuration from the environment (and `.env` if present),
/// validates it and logs the result.
pub fn load_config() -> Result<Arc<Config>, OverlayError> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    validate(&config)?;
    config.validate_and_log();

    Ok(Arc::new(config))
}

/// Rejects settings the overlay cannot run with.
pub fn validate(config: &Config) -> Result<(), OverlayError> {
    if config.api_url.is_empty() {
        return Err(OverlayError::ConfigError("OVERLAY_API_URL cannot be empty".to_string()));
    }
    url::Url::parse(&config.api_url)?;
    if config.result_count == 0 {
        return Err(OverlayError::ConfigError(
            "OVERLAY_RESULT_COUNT must be greater than zero".to_string(),
        ));
    }
    if !(config.reference_area_divisor > 0.0) || !config.reference_area_divisor.is_finite() {
        return Err(OverlayError::ConfigError(format!(
            "OVERLAY_REFERENCE_AREA_DIVISOR must be a positive number, got {}",
            config.reference_area_divisor
        )));
    }
    Ok(())
}
