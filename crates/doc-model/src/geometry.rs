use serde::{Deserialize, Serialize};

/// Point in normalized page space.
///
/// Origin is the top-left corner of the page, y grows downward, and both
/// components are fractions of the page width/height.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned rectangle in normalized page space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle spanned by two corners given in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    /// Tight bounds of a point cloud, `None` when empty.
    pub fn bounding(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for point in &points[1..] {
            min_x = min_x.min(point.x);
            min_y = min_y.min(point.y);
            max_x = max_x.max(point.x);
            max_y = max_y.max(point.y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// Area shared with `other`; zero when the rectangles only touch or are disjoint.
    pub fn intersection_area(&self, other: &Rect) -> f32 {
        let width = self.right().min(other.right()) - self.x.max(other.x);
        let height = self.bottom().min(other.bottom()) - self.y.max(other.y);
        if width <= 0.0 || height <= 0.0 {
            return 0.0;
        }
        width * height
    }

    /// Fraction of *this* rectangle's area covered by `other`.
    ///
    /// The denominator is always `self`; a zero-area rectangle reports 0.
    pub fn covered_fraction(&self, other: &Rect) -> f32 {
        let area = self.area();
        if area <= 0.0 {
            return 0.0;
        }
        self.intersection_area(other) / area
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self { x: self.x + dx, y: self.y + dy, ..*self }
    }

    /// Clamp into the unit page, shrinking only when the rectangle is larger than the page.
    pub fn clamped_to_page(&self) -> Self {
        let width = self.width.clamp(0.0, 1.0);
        let height = self.height.clamp(0.0, 1.0);
        Self {
            x: self.x.clamp(0.0, 1.0 - width),
            y: self.y.clamp(0.0, 1.0 - height),
            width,
            height,
        }
    }

    /// Map a point expressed relative to `self` onto the same relative position in `target`.
    ///
    /// Degenerate axes (zero extent) fall back to a plain translation.
    pub fn map_point(&self, point: &Point, target: &Rect) -> Point {
        let map_axis = |value: f32, from_origin: f32, from_extent: f32, to_origin: f32, to_extent: f32| {
            if from_extent.abs() > f32::EPSILON {
                to_origin + (value - from_origin) / from_extent * to_extent
            } else {
                to_origin + (value - from_origin)
            }
        };
        Point::new(
            map_axis(point.x, self.x, self.width, target.x, target.width),
            map_axis(point.y, self.y, self.height, target.y, target.height),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_corners_normalizes_direction() {
        let rect = Rect::from_corners(Point::new(0.5, 0.4), Point::new(0.2, 0.1));
        assert!((rect.x - 0.2).abs() < 1e-6);
        assert!((rect.y - 0.1).abs() < 1e-6);
        assert!((rect.width - 0.3).abs() < 1e-6);
        assert!((rect.height - 0.3).abs() < 1e-6);
    }

    #[test]
    fn covered_fraction_uses_own_area() {
        let small = Rect::new(0.0, 0.0, 0.1, 0.1);
        let large = Rect::new(0.0, 0.0, 1.0, 1.0);
        assert!((small.covered_fraction(&large) - 1.0).abs() < 1e-6);
        assert!((large.covered_fraction(&small) - 0.01).abs() < 1e-6);
    }

    #[test]
    fn touching_rects_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 0.5, 0.5);
        let b = Rect::new(0.5, 0.0, 0.5, 0.5);
        assert_eq!(a.intersection_area(&b), 0.0);
    }

    #[test]
    fn clamp_keeps_size_and_moves_inside() {
        let rect = Rect::new(0.9, -0.1, 0.2, 0.3).clamped_to_page();
        assert!((rect.x - 0.8).abs() < 1e-6);
        assert_eq!(rect.y, 0.0);
        assert!((rect.width - 0.2).abs() < 1e-6);
    }

    #[test]
    fn map_point_scales_relative_position() {
        let from = Rect::new(0.0, 0.0, 0.2, 0.2);
        let to = Rect::new(0.5, 0.5, 0.4, 0.4);
        let mapped = from.map_point(&Point::new(0.1, 0.2), &to);
        assert!((mapped.x - 0.7).abs() < 1e-6);
        assert!((mapped.y - 0.9).abs() < 1e-6);
    }

    #[test]
    fn bounding_of_empty_is_none() {
        assert!(Rect::bounding(&[]).is_none());
    }
}
