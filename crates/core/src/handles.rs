//! Selection handles and the move/resize math they drive
//!
//! Only the selected entity gets handles: a delete affordance just outside
//! the top-right corner, a move indicator at the top-left corner, and a
//! single resize handle at the bottom-right corner. Handles live in
//! rendered-pixel space so they keep a constant on-screen size at any zoom.

use crate::coords::{PageViewport, PixelPoint};
use doc_model::{Point, Rect};

/// Type of manipulation handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleType {
    Delete,
    Move,
    /// Bottom-right corner
    Resize,
}

/// Manipulation handle with position and type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManipulationHandle {
    pub handle_type: HandleType,
    /// Center in rendered pixels
    pub position: PixelPoint,
    /// Side length in pixels
    pub size: f32,
}

impl ManipulationHandle {
    pub fn new(handle_type: HandleType, position: PixelPoint, size: f32) -> Self {
        Self { handle_type, position, size }
    }

    /// Check if a point hits this handle (square hit area)
    pub fn hit_test(&self, point: PixelPoint, tolerance: f32) -> bool {
        let reach = self.size / 2.0 + tolerance;
        (point.x - self.position.x).abs() <= reach && (point.y - self.position.y).abs() <= reach
    }
}

/// Handles for a selected entity with normalized bounds `rect`.
pub fn generate_handles(
    rect: &Rect,
    viewport: &PageViewport,
    handle_size: f32,
) -> Vec<ManipulationHandle> {
    let px = viewport.rect_to_pixels(rect);
    vec![
        ManipulationHandle::new(
            HandleType::Delete,
            PixelPoint::new(px.right() + handle_size, px.y - handle_size),
            handle_size,
        ),
        ManipulationHandle::new(HandleType::Move, PixelPoint::new(px.x, px.y), handle_size),
        ManipulationHandle::new(
            HandleType::Resize,
            PixelPoint::new(px.right(), px.bottom()),
            handle_size,
        ),
    ]
}

/// First handle under `point`. Delete is listed first so it wins overlaps.
pub fn hit_handle(handles: &[ManipulationHandle], point: PixelPoint) -> Option<HandleType> {
    handles.iter().find(|handle| handle.hit_test(point, 0.0)).map(|handle| handle.handle_type)
}

/// New bounds when the pointer that grabbed `rect` at `grab_offset` (pointer
/// minus origin) is now at `pointer`. Size never changes.
pub fn moved_rect(rect: &Rect, grab_offset: Point, pointer: Point) -> Rect {
    Rect::new(pointer.x - grab_offset.x, pointer.y - grab_offset.y, rect.width, rect.height)
        .clamped_to_page()
}

/// New bounds when the bottom-right corner is dragged to `pointer`. The
/// origin stays fixed; each side keeps at least `min_size`.
pub fn resized_rect(rect: &Rect, pointer: Point, min_size: f32) -> Rect {
    let width = (pointer.x - rect.x).max(min_size).min(1.0 - rect.x);
    let height = (pointer.y - rect.y).max(min_size).min(1.0 - rect.y);
    Rect::new(rect.x, rect.y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> PageViewport {
        PageViewport::new(1000.0, 1000.0, 1.0)
    }

    #[test]
    fn handles_sit_on_expected_corners() {
        let handles = generate_handles(&Rect::new(0.1, 0.2, 0.3, 0.1), &viewport(), 10.0);
        let position = |kind| {
            handles.iter().find(|h| h.handle_type == kind).map(|h| h.position).expect("handle")
        };
        assert_eq!(position(HandleType::Move), PixelPoint::new(100.0, 200.0));
        assert_eq!(position(HandleType::Resize), PixelPoint::new(400.0, 300.0));
        assert_eq!(position(HandleType::Delete), PixelPoint::new(410.0, 190.0));
    }

    #[test]
    fn handle_hit_uses_half_size() {
        let handles = generate_handles(&Rect::new(0.1, 0.2, 0.3, 0.1), &viewport(), 10.0);
        assert_eq!(hit_handle(&handles, PixelPoint::new(404.0, 296.0)), Some(HandleType::Resize));
        assert_eq!(hit_handle(&handles, PixelPoint::new(250.0, 250.0)), None);
    }

    #[test]
    fn move_keeps_size_and_stays_on_page() {
        let rect = Rect::new(0.1, 0.1, 0.2, 0.1);
        let moved = moved_rect(&rect, Point::new(0.05, 0.05), Point::new(0.95, 0.5));
        assert!((moved.x - 0.8).abs() < 1e-6);
        assert!((moved.y - 0.45).abs() < 1e-6);
        assert_eq!((moved.width, moved.height), (rect.width, rect.height));
    }

    #[test]
    fn resize_respects_minimum() {
        let rect = Rect::new(0.5, 0.5, 0.2, 0.2);
        let shrunk = resized_rect(&rect, Point::new(0.4, 0.4), 0.01);
        assert_eq!((shrunk.x, shrunk.y), (0.5, 0.5));
        assert!((shrunk.width - 0.01).abs() < 1e-6);

        let grown = resized_rect(&rect, Point::new(1.5, 0.8), 0.01);
        assert!((grown.width - 0.5).abs() < 1e-6);
        assert!((grown.height - 0.3).abs() < 1e-6);
    }
}
