//! Document-content edit operations
//!
//! Edit operations change page content when applied by the PDF engine
//! (inserted text or images, drawn shapes, replaced source text), as opposed
//! to annotations which are markup layered on top.

use crate::color::Color;
use crate::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpId(uuid::Uuid);

impl OpId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for OpId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Text styling for inserted and replaced text.
///
/// `font_size` is in source-document units (points); `font_family` is a
/// layered CSS-style stack such as `"Times New Roman", Times, serif`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: f32,
    pub color: Color,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub align: TextAlign,
    #[serde(default)]
    pub rotation: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "Helvetica, Arial, sans-serif".to_owned(),
            font_size: 12.0,
            color: Color::BLACK,
            bold: false,
            italic: false,
            align: TextAlign::Left,
            rotation: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextStylePatch {
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    pub color: Option<Color>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub align: Option<TextAlign>,
    pub rotation: Option<f32>,
}

impl TextStyle {
    pub fn apply(&mut self, patch: &TextStylePatch) {
        if let Some(value) = &patch.font_family {
            self.font_family = value.clone();
        }
        if let Some(value) = patch.font_size {
            self.font_size = value;
        }
        if let Some(value) = patch.color {
            self.color = value;
        }
        if let Some(value) = patch.bold {
            self.bold = value;
        }
        if let Some(value) = patch.italic {
            self.italic = value;
        }
        if let Some(value) = patch.align {
            self.align = value;
        }
        if let Some(value) = patch.rotation {
            self.rotation = value;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Rect,
    Ellipse,
    Line,
}

/// Geometry of one extracted source line, kept for precise reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceLine {
    pub text: String,
    pub rect: Rect,
}

/// How clickable source-text regions are bucketed for replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditGranularity {
    #[default]
    Block,
    Line,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum EditorOpKind {
    InsertText {
        #[serde(default)]
        text: String,
        style: TextStyle,
    },
    InsertImage {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image_data: Option<String>,
        #[serde(default)]
        keep_aspect: bool,
    },
    DrawShape {
        shape: ShapeKind,
        stroke_color: Color,
        stroke_width: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill_color: Option<Color>,
    },
    ReplaceText {
        #[serde(default)]
        text: String,
        style: TextStyle,
        original_text: String,
        #[serde(default)]
        original_lines: Vec<SourceLine>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorOpType {
    InsertText,
    InsertImage,
    DrawShape,
    ReplaceText,
}

impl EditorOpType {
    pub fn is_text_entry(&self) -> bool {
        matches!(self, EditorOpType::InsertText | EditorOpType::ReplaceText)
    }
}

impl EditorOpKind {
    pub fn op_type(&self) -> EditorOpType {
        match self {
            EditorOpKind::InsertText { .. } => EditorOpType::InsertText,
            EditorOpKind::InsertImage { .. } => EditorOpType::InsertImage,
            EditorOpKind::DrawShape { .. } => EditorOpType::DrawShape,
            EditorOpKind::ReplaceText { .. } => EditorOpType::ReplaceText,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            EditorOpKind::InsertText { text, .. } | EditorOpKind::ReplaceText { text, .. } => {
                Some(text)
            }
            _ => None,
        }
    }

    pub fn style(&self) -> Option<&TextStyle> {
        match self {
            EditorOpKind::InsertText { style, .. } | EditorOpKind::ReplaceText { style, .. } => {
                Some(style)
            }
            _ => None,
        }
    }
}

/// A persisted content-editing entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorOp {
    pub id: OpId,
    /// 1-indexed page number
    pub page: u32,
    pub rect: Rect,
    #[serde(flatten)]
    pub kind: EditorOpKind,
}

impl EditorOp {
    pub fn new(page: u32, rect: Rect, kind: EditorOpKind) -> Self {
        Self { id: OpId::new(), page, rect, kind }
    }

    pub fn op_type(&self) -> EditorOpType {
        self.kind.op_type()
    }

    /// Merge `patch` into this operation; fields the variant lacks are ignored.
    pub fn apply(&mut self, patch: &EditorOpPatch) {
        if let Some(rect) = patch.rect {
            self.rect = rect;
        }

        match &mut self.kind {
            EditorOpKind::InsertText { text, style } | EditorOpKind::ReplaceText { text, style, .. } => {
                if let Some(value) = &patch.text {
                    *text = value.clone();
                }
                style.apply(&patch.style);
            }
            EditorOpKind::InsertImage { image_data, keep_aspect } => {
                if let Some(value) = &patch.image_data {
                    *image_data = Some(value.clone());
                }
                if let Some(value) = patch.keep_aspect {
                    *keep_aspect = value;
                }
            }
            EditorOpKind::DrawShape { shape, stroke_color, stroke_width, fill_color } => {
                if let Some(value) = patch.shape {
                    *shape = value;
                }
                if let Some(value) = patch.stroke_color {
                    *stroke_color = value;
                }
                if let Some(value) = patch.stroke_width {
                    *stroke_width = value;
                }
                if let Some(value) = patch.fill_color {
                    *fill_color = value;
                }
            }
        }
    }
}

/// Partial update merged into an [`EditorOp`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorOpPatch {
    pub rect: Option<Rect>,
    pub text: Option<String>,
    pub style: TextStylePatch,
    pub image_data: Option<String>,
    pub keep_aspect: Option<bool>,
    pub shape: Option<ShapeKind>,
    pub stroke_color: Option<Color>,
    pub stroke_width: Option<f32>,
    /// `Some(None)` clears the fill
    pub fill_color: Option<Option<Color>>,
}

impl EditorOpPatch {
    pub fn rect(rect: Rect) -> Self {
        Self { rect: Some(rect), ..Default::default() }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), ..Default::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replace_op() -> EditorOp {
        EditorOp::new(
            3,
            Rect::new(0.1, 0.2, 0.5, 0.04),
            EditorOpKind::ReplaceText {
                text: "Hello".to_owned(),
                style: TextStyle::default(),
                original_text: "Hello".to_owned(),
                original_lines: vec![SourceLine {
                    text: "Hello".to_owned(),
                    rect: Rect::new(0.1, 0.2, 0.5, 0.04),
                }],
            },
        )
    }

    #[test]
    fn wire_shape_uses_snake_case_tag_and_camel_case_fields() {
        let value = serde_json::to_value(replace_op()).expect("serialize");
        assert_eq!(value["type"], "replace_text");
        assert_eq!(value["originalText"], "Hello");
        assert_eq!(value["originalLines"][0]["text"], "Hello");
        assert_eq!(value["style"]["fontSize"], 12.0);
    }

    #[test]
    fn draw_shape_without_fill_round_trips() {
        let op = EditorOp::new(
            1,
            Rect::new(0.0, 0.0, 0.1, 0.1),
            EditorOpKind::DrawShape {
                shape: ShapeKind::Ellipse,
                stroke_color: Color::RED,
                stroke_width: 1.0,
                fill_color: None,
            },
        );
        let value = serde_json::to_value(&op).expect("serialize");
        assert!(value.get("fillColor").is_none());
        assert_eq!(value["shape"], "ellipse");
        let back: EditorOp = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, op);
    }

    #[test]
    fn patch_merges_style_channels() {
        let mut op = replace_op();
        op.apply(&EditorOpPatch {
            text: Some("World".to_owned()),
            style: TextStylePatch { bold: Some(true), font_size: Some(14.0), ..Default::default() },
            ..Default::default()
        });

        assert_eq!(op.kind.text(), Some("World"));
        let style = op.kind.style().expect("style");
        assert!(style.bold);
        assert_eq!(style.font_size, 14.0);
        assert_eq!(style.font_family, TextStyle::default().font_family);
    }

    #[test]
    fn fill_can_be_cleared() {
        let mut op = EditorOp::new(
            1,
            Rect::default(),
            EditorOpKind::DrawShape {
                shape: ShapeKind::Rect,
                stroke_color: Color::BLACK,
                stroke_width: 1.0,
                fill_color: Some(Color::WHITE),
            },
        );
        op.apply(&EditorOpPatch { fill_color: Some(None), ..Default::default() });
        assert!(matches!(op.kind, EditorOpKind::DrawShape { fill_color: None, .. }));
    }
}
