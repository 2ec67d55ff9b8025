// src/resolver.rs
//! Point hit resolution: which cached feature is the pointer over?
//!
//! Candidates pass a cheap inclusive bounding-box check first, then the even-odd
//! polygon test. When several features contain the point (nested or
//! overlapping areas) the one whose size is closest to a fixed fraction of the
//! viewport wins.

use crate::config::settings::DEFAULT_REFERENCE_AREA_DIVISOR;
use crate::config::Config;
use crate::geo::{BoundingBox, Feature, Point};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitResolver {
    reference_area_divisor: f64,
}

impl Default for HitResolver {
    fn default() -> Self {
        Self::new(DEFAULT_REFERENCE_AREA_DIVISOR)
    }
}

impl HitResolver {
    pub fn new(reference_area_divisor: f64) -> Self {
        Self {
            reference_area_divisor,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.reference_area_divisor)
    }

    /// Features whose bounds and polygon both contain `point`, in iteration order.
    ///
    /// The polygon is only tested once the bounds accept the point.
    pub fn candidates<'a, I>(&self, point: &Point, features: I) -> Vec<&'a Feature>
    where
        I: IntoIterator<Item = &'a Feature>,
    {
        features
            .into_iter()
            .filter(|f| f.bounds.contains(point) && f.polygon.contains(point))
            .collect()
    }

    /// Span area a feature should have to look "just right" in `viewport`.
    pub fn reference_scale(&self, viewport: &BoundingBox) -> f64 {
        viewport.span_area() / self.reference_area_divisor
    }

    /// How far `bounds` is from the reference size, symmetric for too small and
    /// too large. 1.0 is a perfect match; non-finite results become infinity.
    pub fn deviation(&self, bounds: &BoundingBox, reference: f64) -> f64 {
        let mut scale = bounds.span_area() / reference;
        if scale < 1.0 {
            scale = 1.0 / scale;
        }
        if scale.is_finite() {
            scale
        } else {
            f64::INFINITY
        }
    }

    /// Picks one feature out of `candidates`; the first minimum wins ties.
    pub fn choose_best_feature<'a>(
        &self,
        candidates: &[&'a Feature],
        viewport: &BoundingBox,
    ) -> Option<&'a Feature> {
        let (first, rest) = candidates.split_first()?;
        if rest.is_empty() {
            return Some(*first);
        }

        let reference = self.reference_scale(viewport);
        let mut best = *first;
        let mut best_score = self.deviation(&first.bounds, reference);

        for candidate in rest {
            let score = self.deviation(&candidate.bounds, reference);
            if score < best_score {
                best = *candidate;
                best_score = score;
            }
        }

        debug!(
            "Chose feature {} out of {} candidates (deviation {:.3})",
            best.id,
            candidates.len(),
            best_score
        );
        Some(best)
    }

    /// Full hit test of `point` against `features` within `viewport`.
    pub fn resolve<'a, I>(&self, point: &Point, features: I, viewport: &BoundingBox) -> Option<Feature>
    where
        I: IntoIterator<Item = &'a Feature>,
    {
        let candidates = self.candidates(point, features);
        self.choose_best_feature(&candidates, viewport).cloned()
    }
}
