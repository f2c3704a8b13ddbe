//! Pixel-space geometry shared by the decoder, tracker and aggregator.
//!
//! All coordinates are in camera-frame pixels with a top-left origin.

use serde::{Deserialize, Serialize};

/// A 2D point in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    /// Create a new point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Midpoint between two points.
    #[inline]
    pub fn midpoint(&self, other: &Point2) -> Point2 {
        Point2::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }

    /// Rotate this point about `pivot` by `radians` (counter-clockwise in a
    /// y-down image is clockwise on screen).
    pub fn rotated_about(&self, pivot: &Point2, radians: f32) -> Point2 {
        let (sin, cos) = radians.sin_cos();
        let dx = self.x - pivot.x;
        let dy = self.y - pivot.y;
        Point2::new(
            pivot.x + dx * cos - dy * sin,
            pivot.y + dx * sin + dy * cos,
        )
    }
}

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge x-coordinate
    pub x: f32,
    /// Top edge y-coordinate
    pub y: f32,
    /// Box width
    pub width: f32,
    /// Box height
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle.
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Create from corner coordinates.
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Create from a centre point and size.
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }

    /// Center x-coordinate.
    #[inline]
    pub fn cx(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Center y-coordinate.
    #[inline]
    pub fn cy(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Centre point.
    #[inline]
    pub fn center(&self) -> Point2 {
        Point2::new(self.cx(), self.cy())
    }

    /// Right edge x-coordinate.
    #[inline]
    pub fn x2(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge y-coordinate.
    #[inline]
    pub fn y2(&self) -> f32 {
        self.y + self.height
    }

    /// Box area in pixels.
    #[inline]
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Length of the shorter side.
    #[inline]
    pub fn min_side(&self) -> f32 {
        self.width.min(self.height)
    }

    /// Compute Intersection over Union with another box.
    ///
    /// Returns 0.0 when the boxes do not overlap or the union is empty.
    pub fn iou(&self, other: &Rect) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.x2().min(other.x2());
        let y2 = self.y2().min(other.y2());

        if x2 <= x1 || y2 <= y1 {
            return 0.0;
        }

        let intersection = (x2 - x1) * (y2 - y1);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_iou() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(50.0, 50.0, 100.0, 100.0);

        // Intersection 2500, union 17500
        assert!((a.iou(&b) - 0.142_857).abs() < 1e-4);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rect_no_overlap() {
        let a = Rect::new(0.0, 0.0, 50.0, 50.0);
        let b = Rect::new(100.0, 100.0, 50.0, 50.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_degenerate_rect_iou_is_zero() {
        let a = Rect::new(10.0, 10.0, 0.0, 0.0);
        assert_eq!(a.iou(&a), 0.0);
    }

    #[test]
    fn test_from_center_roundtrip() {
        let r = Rect::from_center(50.0, 40.0, 20.0, 10.0);
        assert_eq!(r.x, 40.0);
        assert_eq!(r.y, 35.0);
        assert_eq!(r.center(), Point2::new(50.0, 40.0));
        assert_eq!(r.min_side(), 10.0);
    }

    #[test]
    fn test_point_rotation() {
        let p = Point2::new(2.0, 0.0);
        let r = p.rotated_about(&Point2::new(1.0, 0.0), std::f32::consts::FRAC_PI_2);
        assert!((r.x - 1.0).abs() < 1e-5);
        assert!((r.y - 1.0).abs() < 1e-5);
    }
}
