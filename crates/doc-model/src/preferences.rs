use crate::annotation::{ArrowHead, Fill, LineStyle};
use crate::color::Color;
use crate::editor_op::{EditGranularity, TextStyle};
use serde::{Deserialize, Serialize};

/// Session-default style channels for newly authored annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnnotationDefaults {
    pub color: Color,
    pub opacity: f32,
    /// Fraction of page width
    pub stroke_width: f32,
    /// Fraction of page width
    pub ink_width: f32,
    pub line_style: LineStyle,
    pub start_arrow: ArrowHead,
    pub end_arrow: ArrowHead,
    pub fill: Fill,
    /// Freetext font size in points
    pub font_size: f32,
    pub stamp_type: String,
}

impl Default for AnnotationDefaults {
    fn default() -> Self {
        Self {
            color: Color::YELLOW,
            opacity: 0.5,
            stroke_width: 0.002,
            ink_width: 0.003,
            line_style: LineStyle::Solid,
            start_arrow: ArrowHead::None,
            end_arrow: ArrowHead::Closed,
            fill: Fill::default(),
            font_size: 12.0,
            stamp_type: "approved".to_owned(),
        }
    }
}

/// Session-default stroke/fill for draw_shape operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShapeDefaults {
    pub stroke_color: Color,
    /// Points
    pub stroke_width: f32,
    pub fill_color: Option<Color>,
}

impl Default for ShapeDefaults {
    fn default() -> Self {
        Self { stroke_color: Color::BLACK, stroke_width: 1.0, fill_color: None }
    }
}

/// Tunables for the markup overlay, persisted by the storage crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlayPreferences {
    /// A drawn rect is kept only if its width or height exceeds this (normalized)
    pub min_draw_size: f32,
    /// Keep every Nth ink sample (plus first and last)
    pub ink_decimation_step: usize,
    /// Inactivity gap that starts a new text-buffer undo snapshot
    pub text_debounce_ms: u64,
    pub text_history_capacity: usize,
    /// Maximum whole-document undo snapshots per store
    pub history_limit: usize,
    pub handle_size_px: f32,
    /// Side of click-placed entities (sequence numbers, stamps), normalized to page width
    pub marker_size: f32,
    pub author: Option<String>,
    pub annotation: AnnotationDefaults,
    pub text_style: TextStyle,
    pub shape: ShapeDefaults,
    pub granularity: EditGranularity,
}

impl Default for OverlayPreferences {
    fn default() -> Self {
        Self {
            min_draw_size: 0.005,
            ink_decimation_step: 3,
            text_debounce_ms: 500,
            text_history_capacity: 50,
            history_limit: 100,
            handle_size_px: 10.0,
            marker_size: 0.03,
            author: None,
            annotation: AnnotationDefaults::default(),
            text_style: TextStyle::default(),
            shape: ShapeDefaults::default(),
            granularity: EditGranularity::Block,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let prefs: OverlayPreferences =
            serde_json::from_str(r##"{"minDrawSize": 0.01, "annotation": {"color": "#00ff00"}}"##)
                .expect("deserialize");

        assert_eq!(prefs.min_draw_size, 0.01);
        assert_eq!(prefs.annotation.color, Color::rgb(0, 255, 0));
        assert_eq!(prefs.annotation.opacity, 0.5);
        assert_eq!(prefs.text_debounce_ms, 500);
        assert_eq!(prefs.granularity, EditGranularity::Block);
    }
}
