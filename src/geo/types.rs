//! Geographic value types shared by the cache and the resolver.

use crate::error::OverlayError;
use std::fmt;

/// Stable identifier assigned by the feature service.
pub type FeatureId = u64;

/// A geographic coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub lat: f64,
    pub lng: f64,
}

impl Point {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

/// Axis-aligned geographic rectangle with `south <= north` and `west <= east`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    south: f64,
    west: f64,
    north: f64,
    east: f64,
}

impl BoundingBox {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Result<Self, OverlayError> {
        if [south, west, north, east].iter().any(|v| v.is_nan()) {
            return Err(OverlayError::InvalidBounds(
                "bounding box edge is NaN".to_string(),
            ));
        }
        if south > north {
            return Err(OverlayError::InvalidBounds(format!(
                "south {} is above north {}",
                south, north
            )));
        }
        if west > east {
            return Err(OverlayError::InvalidBounds(format!(
                "west {} is east of east {}",
                west, east
            )));
        }
        Ok(Self {
            south,
            west,
            north,
            east,
        })
    }

    /// Builds the box spanned by two opposite corners, in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            south: a.lat.min(b.lat),
            west: a.lng.min(b.lng),
            north: a.lat.max(b.lat),
            east: a.lng.max(b.lng),
        }
    }

    pub fn south(&self) -> f64 {
        self.south
    }

    pub fn west(&self) -> f64 {
        self.west
    }

    pub fn north(&self) -> f64 {
        self.north
    }

    pub fn east(&self) -> f64 {
        self.east
    }

    pub fn south_west(&self) -> Point {
        Point::new(self.south, self.west)
    }

    pub fn north_east(&self) -> Point {
        Point::new(self.north, self.east)
    }

    /// Inclusive on every edge.
    pub fn contains(&self, point: &Point) -> bool {
        point.lat >= self.south
            && point.lat <= self.north
            && point.lng >= self.west
            && point.lng <= self.east
    }

    /// Sum of the squared side lengths, (Δlat)² + (Δlng)².
    ///
    /// This is a cheap size proxy used to rank overlapping features, not a
    /// planar or geodesic area.
    pub fn span_area(&self) -> f64 {
        let d_lat = self.north - self.south;
        let d_lng = self.east - self.west;
        d_lat * d_lat + d_lng * d_lng
    }

    /// Query-string form expected by the box service: `west,south,east,north`.
    pub fn to_bbox_string(&self) -> String {
        format!("{},{},{},{}", self.west, self.south, self.east, self.north)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.to_bbox_string())
    }
}

/// A feature known to the overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: FeatureId,
    pub name: String,
    pub url: String,
    pub bounds: BoundingBox,
    pub polygon: super::Polygon,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_rejects_inverted_edges() {
        assert!(matches!(
            BoundingBox::new(10.0, 0.0, 5.0, 1.0),
            Err(OverlayError::InvalidBounds(_))
        ));
        assert!(matches!(
            BoundingBox::new(0.0, 3.0, 1.0, 2.0),
            Err(OverlayError::InvalidBounds(_))
        ));
        assert!(BoundingBox::new(f64::NAN, 0.0, 1.0, 1.0).is_err());
    }

    #[test]
    fn test_contains_is_inclusive() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0).unwrap();
        assert!(bbox.contains(&Point::new(0.0, 5.0)));
        assert!(bbox.contains(&Point::new(10.0, 10.0)));
        assert!(bbox.contains(&Point::new(5.0, 5.0)));
        assert!(!bbox.contains(&Point::new(10.000001, 5.0)));
        assert!(!bbox.contains(&Point::new(5.0, -0.1)));
    }

    #[test]
    fn test_span_area_is_sum_of_squared_sides() {
        let bbox = BoundingBox::new(0.0, 0.0, 3.0, 4.0).unwrap();
        assert_approx_eq!(bbox.span_area(), 25.0);
    }

    #[test]
    fn test_bbox_string_order() {
        let bbox = BoundingBox::new(55.677586, 37.617188, 55.7271128, 37.70507).unwrap();
        assert_eq!(bbox.to_bbox_string(), "37.617188,55.677586,37.70507,55.7271128");
    }

    #[test]
    fn test_from_corners_normalizes() {
        let bbox = BoundingBox::from_corners(Point::new(5.0, 8.0), Point::new(1.0, 2.0));
        assert_eq!(bbox.south_west(), Point::new(1.0, 2.0));
        assert_eq!(bbox.north_east(), Point::new(5.0, 8.0));
    }
}
