//! Geometry primitives for scan-event payloads.
//!
//! These types serialize exactly as the host event contract expects
//! (`{x, y}` points, `{origin, size}` rectangles), so a scan event can be
//! handed to a UI layer without any reshaping.

use serde::{Deserialize, Serialize};

/// A point in the source coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A width/height pair in the source coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Size {
    /// Creates a new size.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle (origin + size).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner.
    pub origin: Point,
    /// Extent.
    pub size: Size,
}

impl Rect {
    /// Creates a rectangle from origin coordinates and dimensions.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    /// Returns the maximum X coordinate.
    #[inline]
    pub fn max_x(&self) -> f64 {
        self.origin.x + self.size.width
    }

    /// Returns the maximum Y coordinate.
    #[inline]
    pub fn max_y(&self) -> f64 {
        self.origin.y + self.size.height
    }

    /// Returns the four corners, clockwise from the origin.
    ///
    /// The source space is y-down (video coordinates), so clockwise means
    /// top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Point; 4] {
        [
            self.origin,
            Point::new(self.max_x(), self.origin.y),
            Point::new(self.max_x(), self.max_y()),
            Point::new(self.origin.x, self.max_y()),
        ]
    }

    /// Returns the smallest rectangle containing all of `points`.
    ///
    /// An empty slice yields the zero rectangle.
    pub fn bounding(points: &[Point]) -> Self {
        let Some(first) = points.first() else {
            return Self::default();
        };

        let mut min_x = first.x;
        let mut min_y = first.y;
        let mut max_x = first.x;
        let mut max_y = first.y;

        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corners_clockwise_from_origin() {
        let rect = Rect::new(1.0, 2.0, 10.0, 20.0);
        let corners = rect.corners();

        assert_eq!(corners[0], Point::new(1.0, 2.0));
        assert_eq!(corners[1], Point::new(11.0, 2.0));
        assert_eq!(corners[2], Point::new(11.0, 22.0));
        assert_eq!(corners[3], Point::new(1.0, 22.0));
    }

    #[test]
    fn test_bounding_recovers_rect_from_corners() {
        let rect = Rect::new(3.0, 4.0, 5.0, 6.0);
        let rebuilt = Rect::bounding(&rect.corners());

        assert_eq!(rebuilt, rect);
    }

    #[test]
    fn test_bounding_of_rotated_corners() {
        // Corners in an arbitrary order still produce the hull
        let points = [
            Point::new(5.0, 1.0),
            Point::new(1.0, 5.0),
            Point::new(5.0, 9.0),
            Point::new(9.0, 5.0),
        ];
        let rect = Rect::bounding(&points);

        assert_eq!(rect, Rect::new(1.0, 1.0, 8.0, 8.0));
    }

    #[test]
    fn test_bounding_empty_is_zero() {
        assert_eq!(Rect::bounding(&[]), Rect::default());
    }
}
