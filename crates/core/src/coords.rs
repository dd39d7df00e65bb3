//! Normalized page space <-> rendered pixel space
//!
//! Entities store geometry as fractions of the page (origin top-left, y
//! down). Rendering and pointer input happen in pixels of the rendered page
//! bitmap, which is the page's pixel size at scale 1 times the zoom `scale`.
//! Font sizes are the one place source-document units (points) leak in; they
//! are converted with [`pdf_to_pixel_scale`].

use doc_model::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Point in rendered-page pixels, relative to the page's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelPoint {
    pub x: f32,
    pub y: f32,
}

impl PixelPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Rectangle in rendered-page pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PixelRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> PixelPoint {
        PixelPoint::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, point: PixelPoint) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }
}

/// Source page size in document units (points).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    /// US Letter, used when the host has not reported a size.
    pub const LETTER: PageSize = PageSize { width: 612.0, height: 792.0 };

    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::LETTER
    }
}

/// Convert a normalized rect to rendered pixels.
pub fn to_pixels(rect: &Rect, page_width_px: f32, page_height_px: f32, scale: f32) -> PixelRect {
    let width = page_width_px * scale;
    let height = page_height_px * scale;
    PixelRect::new(rect.x * width, rect.y * height, rect.width * width, rect.height * height)
}

/// Convert a rendered-pixel rect back to normalized page space.
pub fn to_normalized(
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    page_width_px: f32,
    page_height_px: f32,
    scale: f32,
) -> Rect {
    let width = page_width_px * scale;
    let height = page_height_px * scale;
    Rect::new(x / width, y / height, w / width, h / height)
}

/// Ratio of rendered pixels to source document units along the page width.
///
/// Returns 1.0 when the source width is unknown (zero or negative).
pub fn pdf_to_pixel_scale(rendered_page_width_px: f32, source_page_width_pts: f32) -> f32 {
    if source_page_width_pts <= 0.0 {
        return 1.0;
    }
    rendered_page_width_px / source_page_width_pts
}

/// Font size in points rendered at the given pdf-to-pixel scale.
pub fn font_size_to_pixels(size_pts: f32, pdf_to_pixel_scale: f32) -> f32 {
    size_pts * pdf_to_pixel_scale
}

/// The page as currently rendered: base pixel size and zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageViewport {
    pub page_width_px: f32,
    pub page_height_px: f32,
    pub scale: f32,
}

impl PageViewport {
    pub fn new(page_width_px: f32, page_height_px: f32, scale: f32) -> Self {
        Self { page_width_px, page_height_px, scale }
    }

    pub fn rendered_width(&self) -> f32 {
        self.page_width_px * self.scale
    }

    pub fn rendered_height(&self) -> f32 {
        self.page_height_px * self.scale
    }

    pub fn rect_to_pixels(&self, rect: &Rect) -> PixelRect {
        to_pixels(rect, self.page_width_px, self.page_height_px, self.scale)
    }

    pub fn rect_to_normalized(&self, rect: &PixelRect) -> Rect {
        to_normalized(
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            self.page_width_px,
            self.page_height_px,
            self.scale,
        )
    }

    pub fn point_to_pixels(&self, point: &Point) -> PixelPoint {
        PixelPoint::new(point.x * self.rendered_width(), point.y * self.rendered_height())
    }

    pub fn point_to_normalized(&self, point: PixelPoint) -> Point {
        Point::new(point.x / self.rendered_width(), point.y / self.rendered_height())
    }

    /// Pixel distance along the x axis expressed as a fraction of page width.
    pub fn length_to_normalized(&self, pixels: f32) -> f32 {
        pixels / self.rendered_width()
    }

    pub fn pdf_to_pixel_scale(&self, page_size: &PageSize) -> f32 {
        pdf_to_pixel_scale(self.rendered_width(), page_size.width)
    }

    pub fn contains(&self, point: PixelPoint) -> bool {
        point.x >= 0.0
            && point.y >= 0.0
            && point.x <= self.rendered_width()
            && point.y <= self.rendered_height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_at_several_scales() {
        let rect = Rect::new(0.123, 0.456, 0.2, 0.075);
        for scale in [0.5_f32, 1.0, 1.5, 2.0, 3.25] {
            let px = to_pixels(&rect, 1000.0, 1400.0, scale);
            let back = to_normalized(px.x, px.y, px.width, px.height, 1000.0, 1400.0, scale);
            assert!((back.x - rect.x).abs() < 1e-6, "x at scale {scale}");
            assert!((back.y - rect.y).abs() < 1e-6, "y at scale {scale}");
            assert!((back.width - rect.width).abs() < 1e-6, "width at scale {scale}");
            assert!((back.height - rect.height).abs() < 1e-6, "height at scale {scale}");
        }
    }

    #[test]
    fn to_pixels_multiplies_by_page_size_and_scale() {
        let px = to_pixels(&Rect::new(0.1, 0.2, 0.5, 0.25), 800.0, 1000.0, 2.0);
        assert_eq!(px, PixelRect::new(160.0, 400.0, 800.0, 500.0));
    }

    #[test]
    fn font_scale_uses_widths() {
        // 612pt page rendered 1224px wide
        let scale = pdf_to_pixel_scale(1224.0, 612.0);
        assert!((scale - 2.0).abs() < 1e-6);
        assert!((font_size_to_pixels(12.0, scale) - 24.0).abs() < 1e-6);
        assert_eq!(pdf_to_pixel_scale(1224.0, 0.0), 1.0);
    }

    #[test]
    fn viewport_points_convert_both_ways() {
        let viewport = PageViewport::new(1000.0, 1000.0, 2.0);
        let px = viewport.point_to_pixels(&Point::new(0.25, 0.5));
        assert_eq!(px, PixelPoint::new(500.0, 1000.0));
        assert_eq!(viewport.point_to_normalized(px), Point::new(0.25, 0.5));
        assert!((viewport.length_to_normalized(200.0) - 0.1).abs() < 1e-6);
    }
}
