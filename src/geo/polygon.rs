//! Closed polygons and the even-odd containment test.

use super::types::{BoundingBox, Point};
use crate::error::OverlayError;

/// Ordered, implicitly closed ring of at least three vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    pub const MIN_VERTICES: usize = 3;

    pub fn new(points: Vec<Point>) -> Result<Self, OverlayError> {
        if points.len() < Self::MIN_VERTICES {
            return Err(OverlayError::DegenerateGeometry(format!(
                "polygon needs at least {} vertices, got {}",
                Self::MIN_VERTICES,
                points.len()
            )));
        }
        Ok(Self { points })
    }

    /// Builds a polygon from service vertices given as `(x = lng, y = lat)`.
    pub fn from_xy<I>(vertices: I) -> Result<Self, OverlayError>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        Self::new(
            vertices
                .into_iter()
                .map(|(x, y)| Point::new(y, x))
                .collect(),
        )
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Smallest box enclosing every vertex.
    pub fn bounds(&self) -> BoundingBox {
        let first = self.points[0];
        self.points
            .iter()
            .skip(1)
            .fold(BoundingBox::from_corners(first, first), |acc, p| {
                BoundingBox::from_corners(
                    Point::new(acc.south().min(p.lat), acc.west().min(p.lng)),
                    Point::new(acc.north().max(p.lat), acc.east().max(p.lng)),
                )
            })
    }

    /// Ray casting in the +lng direction; an odd number of edge crossings means inside.
    ///
    /// Points lying exactly on an edge or vertex may be reported either way.
    pub fn contains(&self, point: &Point) -> bool {
        let x = point.lng;
        let y = point.lat;
        let mut inside = false;

        let mut j = self.points.len() - 1;
        for i in 0..self.points.len() {
            let (xi, yi) = (self.points[i].lng, self.points[i].lat);
            let (xj, yj) = (self.points[j].lng, self.points[j].lat);

            // the first clause guarantees yi != yj before dividing
            if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }

        inside
    }
}
