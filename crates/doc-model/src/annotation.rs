//! Markup annotation entities
//!
//! An annotation is a persisted markup entity (highlight, comment, shape, ink,
//! stamp...) anchored to one page. Shared fields live on [`Annotation`]; the
//! variant-specific fields live on the tagged [`AnnotationKind`] union, which
//! serializes flat next to the shared fields with a `type` discriminant.

use crate::color::Color;
use crate::geometry::{Point, Rect};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable annotation identifier, persisted in saved files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(uuid::Uuid);

impl AnnotationId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for AnnotationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl LineStyle {
    /// Dash pattern in stroke-width units; empty for solid lines.
    pub fn dash_pattern(&self) -> &'static [f32] {
        match self {
            LineStyle::Solid => &[],
            LineStyle::Dashed => &[3.0, 3.0],
            LineStyle::Dotted => &[1.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowHead {
    #[default]
    None,
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub enabled: bool,
    pub color: Color,
    pub opacity: f32,
}

impl Default for Fill {
    fn default() -> Self {
        Self { enabled: false, color: Color::WHITE, opacity: 1.0 }
    }
}

/// One freehand stroke; points are normalized and `stroke_width` is a fraction of page width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InkPath {
    pub points: Vec<Point>,
    pub stroke_width: f32,
    pub color: Color,
}

/// Variant-specific annotation fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum AnnotationKind {
    Highlight,
    Underline,
    Strikethrough,
    Comment {
        #[serde(default)]
        text: String,
    },
    Freetext {
        #[serde(default)]
        text: String,
        fontsize: f32,
    },
    Ink {
        paths: Vec<InkPath>,
    },
    Rectangle {
        stroke_width: f32,
        #[serde(default)]
        line_style: LineStyle,
        #[serde(default)]
        fill: Fill,
    },
    Ellipse {
        stroke_width: f32,
        #[serde(default)]
        line_style: LineStyle,
        #[serde(default)]
        fill: Fill,
    },
    Line {
        stroke_width: f32,
        #[serde(default)]
        line_style: LineStyle,
        start_point: Point,
        end_point: Point,
    },
    Arrow {
        stroke_width: f32,
        #[serde(default)]
        line_style: LineStyle,
        start_point: Point,
        end_point: Point,
        #[serde(default)]
        start_arrow: ArrowHead,
        #[serde(default = "closed_arrow")]
        end_arrow: ArrowHead,
    },
    SequenceNumber {
        sequence_number: u32,
    },
    Stamp {
        stamp_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image_data: Option<String>,
        #[serde(default)]
        rotation: f32,
    },
}

fn closed_arrow() -> ArrowHead {
    ArrowHead::Closed
}

/// Field-less discriminant of [`AnnotationKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnnotationType {
    Highlight,
    Underline,
    Strikethrough,
    Comment,
    Freetext,
    Ink,
    Rectangle,
    Ellipse,
    Line,
    Arrow,
    SequenceNumber,
    Stamp,
}

impl AnnotationType {
    /// Types whose content is typed by the user right after creation.
    pub fn is_text_entry(&self) -> bool {
        matches!(self, AnnotationType::Comment | AnnotationType::Freetext)
    }
}

impl AnnotationKind {
    pub fn annotation_type(&self) -> AnnotationType {
        match self {
            AnnotationKind::Highlight => AnnotationType::Highlight,
            AnnotationKind::Underline => AnnotationType::Underline,
            AnnotationKind::Strikethrough => AnnotationType::Strikethrough,
            AnnotationKind::Comment { .. } => AnnotationType::Comment,
            AnnotationKind::Freetext { .. } => AnnotationType::Freetext,
            AnnotationKind::Ink { .. } => AnnotationType::Ink,
            AnnotationKind::Rectangle { .. } => AnnotationType::Rectangle,
            AnnotationKind::Ellipse { .. } => AnnotationType::Ellipse,
            AnnotationKind::Line { .. } => AnnotationType::Line,
            AnnotationKind::Arrow { .. } => AnnotationType::Arrow,
            AnnotationKind::SequenceNumber { .. } => AnnotationType::SequenceNumber,
            AnnotationKind::Stamp { .. } => AnnotationType::Stamp,
        }
    }

    /// Text content for comment/freetext annotations.
    pub fn text(&self) -> Option<&str> {
        match self {
            AnnotationKind::Comment { text } | AnnotationKind::Freetext { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// A persisted markup entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: AnnotationId,
    /// 1-indexed page number
    pub page: u32,
    pub rect: Rect,
    pub color: Color,
    pub opacity: f32,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(flatten)]
    pub kind: AnnotationKind,
}

impl Annotation {
    pub fn new(page: u32, rect: Rect, color: Color, opacity: f32, kind: AnnotationKind) -> Self {
        let now = Utc::now();
        Self {
            id: AnnotationId::new(),
            page,
            rect,
            color,
            opacity,
            created_at: now,
            modified_at: now,
            author: None,
            kind,
        }
    }

    pub fn annotation_type(&self) -> AnnotationType {
        self.kind.annotation_type()
    }

    /// Merge `patch` into this annotation.
    ///
    /// Fields the variant does not carry are ignored. A new `rect` without
    /// explicit endpoints/paths re-projects line endpoints and ink points into
    /// the new rectangle so geometry stays consistent with the bounds.
    /// Timestamps are left to the caller.
    pub fn apply(&mut self, patch: &AnnotationPatch) {
        if let Some(rect) = patch.rect {
            let old = self.rect;
            self.rect = rect;
            if old != rect {
                self.reproject(&old, &rect, patch);
            }
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(opacity) = patch.opacity {
            self.opacity = opacity.clamp(0.0, 1.0);
        }
        if let Some(author) = &patch.author {
            self.author = Some(author.clone());
        }

        match &mut self.kind {
            AnnotationKind::Highlight | AnnotationKind::Underline | AnnotationKind::Strikethrough => {}
            AnnotationKind::Comment { text } => {
                if let Some(value) = &patch.text {
                    *text = value.clone();
                }
            }
            AnnotationKind::Freetext { text, fontsize } => {
                if let Some(value) = &patch.text {
                    *text = value.clone();
                }
                if let Some(value) = patch.font_size {
                    *fontsize = value;
                }
            }
            AnnotationKind::Ink { paths } => {
                if let Some(value) = &patch.paths {
                    *paths = value.clone();
                }
            }
            AnnotationKind::Rectangle { stroke_width, line_style, fill }
            | AnnotationKind::Ellipse { stroke_width, line_style, fill } => {
                if let Some(value) = patch.stroke_width {
                    *stroke_width = value;
                }
                if let Some(value) = patch.line_style {
                    *line_style = value;
                }
                if let Some(value) = patch.fill {
                    *fill = value;
                }
            }
            AnnotationKind::Line { stroke_width, line_style, start_point, end_point } => {
                if let Some(value) = patch.stroke_width {
                    *stroke_width = value;
                }
                if let Some(value) = patch.line_style {
                    *line_style = value;
                }
                if let Some(value) = patch.start_point {
                    *start_point = value;
                }
                if let Some(value) = patch.end_point {
                    *end_point = value;
                }
            }
            AnnotationKind::Arrow {
                stroke_width,
                line_style,
                start_point,
                end_point,
                start_arrow,
                end_arrow,
            } => {
                if let Some(value) = patch.stroke_width {
                    *stroke_width = value;
                }
                if let Some(value) = patch.line_style {
                    *line_style = value;
                }
                if let Some(value) = patch.start_point {
                    *start_point = value;
                }
                if let Some(value) = patch.end_point {
                    *end_point = value;
                }
                if let Some(value) = patch.start_arrow {
                    *start_arrow = value;
                }
                if let Some(value) = patch.end_arrow {
                    *end_arrow = value;
                }
            }
            AnnotationKind::SequenceNumber { sequence_number } => {
                if let Some(value) = patch.sequence_number {
                    *sequence_number = value;
                }
            }
            AnnotationKind::Stamp { stamp_type, image_data, rotation } => {
                if let Some(value) = &patch.stamp_type {
                    *stamp_type = value.clone();
                }
                if let Some(value) = &patch.image_data {
                    *image_data = Some(value.clone());
                }
                if let Some(value) = patch.rotation {
                    *rotation = value;
                }
            }
        }
    }

    fn reproject(&mut self, old: &Rect, new: &Rect, patch: &AnnotationPatch) {
        match &mut self.kind {
            AnnotationKind::Line { start_point, end_point, .. }
            | AnnotationKind::Arrow { start_point, end_point, .. } => {
                if patch.start_point.is_none() {
                    *start_point = old.map_point(start_point, new);
                }
                if patch.end_point.is_none() {
                    *end_point = old.map_point(end_point, new);
                }
            }
            AnnotationKind::Ink { paths } if patch.paths.is_none() => {
                for path in paths.iter_mut() {
                    for point in path.points.iter_mut() {
                        *point = old.map_point(point, new);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Partial update merged into an [`Annotation`] by the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationPatch {
    pub rect: Option<Rect>,
    pub color: Option<Color>,
    pub opacity: Option<f32>,
    pub author: Option<String>,
    pub text: Option<String>,
    pub font_size: Option<f32>,
    pub paths: Option<Vec<InkPath>>,
    pub stroke_width: Option<f32>,
    pub line_style: Option<LineStyle>,
    pub fill: Option<Fill>,
    pub start_point: Option<Point>,
    pub end_point: Option<Point>,
    pub start_arrow: Option<ArrowHead>,
    pub end_arrow: Option<ArrowHead>,
    pub sequence_number: Option<u32>,
    pub stamp_type: Option<String>,
    pub image_data: Option<String>,
    pub rotation: Option<f32>,
}

impl AnnotationPatch {
    pub fn rect(rect: Rect) -> Self {
        Self { rect: Some(rect), ..Default::default() }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), ..Default::default() }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrow() -> Annotation {
        Annotation::new(
            1,
            Rect::new(0.1, 0.1, 0.2, 0.2),
            Color::RED,
            1.0,
            AnnotationKind::Arrow {
                stroke_width: 0.002,
                line_style: LineStyle::Solid,
                start_point: Point::new(0.3, 0.1),
                end_point: Point::new(0.1, 0.3),
                start_arrow: ArrowHead::None,
                end_arrow: ArrowHead::Closed,
            },
        )
    }

    #[test]
    fn serializes_flat_with_type_tag() {
        let annotation = Annotation::new(
            2,
            Rect::new(0.1, 0.2, 0.3, 0.05),
            Color::YELLOW,
            0.5,
            AnnotationKind::SequenceNumber { sequence_number: 4 },
        );
        let value = serde_json::to_value(&annotation).expect("serialize");

        assert_eq!(value["type"], "sequenceNumber");
        assert_eq!(value["sequenceNumber"], 4);
        assert_eq!(value["page"], 2);
        assert_eq!(value["color"], "#ffff00");
        assert!(value["createdAt"].as_str().is_some_and(|s| s.contains('T')));
        assert!(value.get("author").is_none());

        let back: Annotation = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, annotation);
    }

    #[test]
    fn deserializes_arrow_with_default_heads() {
        let json = r##"{
            "id": "7f1d2f3e-64a8-4d70-9a59-8f0f4f7f3d11",
            "type": "arrow",
            "page": 1,
            "rect": {"x": 0.1, "y": 0.1, "width": 0.2, "height": 0.1},
            "color": "#000000",
            "opacity": 1.0,
            "createdAt": "2024-05-01T10:00:00Z",
            "modifiedAt": "2024-05-01T10:00:00Z",
            "strokeWidth": 0.002,
            "startPoint": {"x": 0.1, "y": 0.1},
            "endPoint": {"x": 0.3, "y": 0.2}
        }"##;
        let annotation: Annotation = serde_json::from_str(json).expect("deserialize");
        match annotation.kind {
            AnnotationKind::Arrow { start_arrow, end_arrow, line_style, .. } => {
                assert_eq!(start_arrow, ArrowHead::None);
                assert_eq!(end_arrow, ArrowHead::Closed);
                assert_eq!(line_style, LineStyle::Solid);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let mut annotation = arrow();
        let before = annotation.clone();
        annotation.apply(&AnnotationPatch::default());
        assert_eq!(annotation, before);
        assert!(AnnotationPatch::default().is_empty());
    }

    #[test]
    fn moving_rect_carries_endpoints_and_keeps_direction() {
        let mut annotation = arrow();
        annotation.apply(&AnnotationPatch::rect(Rect::new(0.5, 0.5, 0.2, 0.2)));

        let AnnotationKind::Arrow { start_point, end_point, .. } = annotation.kind else {
            panic!("arrow expected");
        };
        assert!((start_point.x - 0.7).abs() < 1e-6);
        assert!((start_point.y - 0.5).abs() < 1e-6);
        assert!((end_point.x - 0.5).abs() < 1e-6);
        assert!((end_point.y - 0.7).abs() < 1e-6);
    }

    #[test]
    fn inapplicable_fields_are_ignored() {
        let mut annotation = Annotation::new(
            1,
            Rect::new(0.1, 0.1, 0.1, 0.1),
            Color::YELLOW,
            0.5,
            AnnotationKind::Highlight,
        );
        annotation.apply(&AnnotationPatch { stroke_width: Some(3.0), ..AnnotationPatch::text("x") });
        assert_eq!(annotation.kind, AnnotationKind::Highlight);
    }

    #[test]
    fn text_entry_types() {
        assert!(AnnotationType::Comment.is_text_entry());
        assert!(AnnotationType::Freetext.is_text_entry());
        assert!(!AnnotationType::Rectangle.is_text_entry());
    }
}
