//! Visual style handed to the map collaborator for the highlighted feature.

use crate::geo::Feature;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub color: String,
    pub weight: f64,
    pub opacity: f64,
    /// Falls back to `color` when unset
    pub fill_color: Option<String>,
    pub fill_opacity: f64,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: "#3388ff".to_string(),
            weight: 3.0,
            opacity: 1.0,
            fill_color: None,
            fill_opacity: 0.2,
        }
    }
}

/// Computes the style of a feature when it becomes active.
pub type StyleFn = Arc<dyn Fn(&Feature) -> Style + Send + Sync>;

/// Style function that ignores the feature and always returns `style`.
pub fn constant_style(style: Style) -> StyleFn {
    Arc::new(move |_| style.clone())
}
