//! PDF engine collaborator contract
//!
//! Parsing, rasterization, text extraction and writing edits back into the
//! document belong to an external engine. This module fixes the interface
//! the overlay consumes and the wire payload handed over on save.

use crate::coords::PageSize;
use crate::fonts::FONT_SIZE_CORRECTION;
use crate::text_blocks::TextBlock;
use doc_model::{EditorOp, EditorOpKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Fraction of the (corrected) font size added below a replaced box for descenders.
pub const DESCENDER_EXTENSION: f32 = 0.3;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("page {0} does not exist")]
    InvalidPage(u32),

    #[error("engine unavailable: {0}")]
    Unavailable(String),

    #[error("engine failed: {0}")]
    Failed(String),

    #[error("invalid engine payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Rasterized page, tightly packed RGBA8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyTarget {
    /// 1-indexed page
    Page(u32),
    Document,
}

/// Operations handed to the engine on save.
///
/// The engine indexes pages from 0, so `ops[].page` and the dimension maps
/// use 0-based indices here while the stores stay 1-indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    pub ops: Vec<EditorOp>,
    pub page_widths: BTreeMap<String, f32>,
    pub page_heights: BTreeMap<String, f32>,
}

impl ApplyRequest {
    /// Wire payload for `ops`; pages missing from `page_sizes` get US Letter.
    pub fn new(ops: &[EditorOp], page_sizes: &BTreeMap<u32, PageSize>) -> Self {
        let mut page_widths = BTreeMap::new();
        let mut page_heights = BTreeMap::new();
        let ops = ops
            .iter()
            .map(|op| {
                let index = op.page.saturating_sub(1);
                let size = page_sizes.get(&op.page).copied().unwrap_or_default();
                page_widths.insert(index.to_string(), size.width);
                page_heights.insert(index.to_string(), size.height);
                EditorOp { page: index, ..op.clone() }
            })
            .collect();
        Self { ops, page_widths, page_heights }
    }

    /// Restrict to one 1-indexed page.
    pub fn for_page(&self, page: u32) -> Self {
        let index = page.saturating_sub(1);
        let key = index.to_string();
        let pick = |sizes: &BTreeMap<String, f32>| -> BTreeMap<String, f32> {
            sizes.get(&key).map(|size| (key.clone(), *size)).into_iter().collect()
        };
        Self {
            ops: self.ops.iter().filter(|op| op.page == index).cloned().collect(),
            page_widths: pick(&self.page_widths),
            page_heights: pick(&self.page_heights),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApplyOutcome {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub applied: usize,
}

/// External PDF engine.
pub trait PdfEngine {
    /// Extracted source text of a 1-indexed page, geometry normalized.
    fn text_blocks(&mut self, page: u32) -> Result<Vec<TextBlock>, EngineError>;

    fn render_page(&mut self, page: u32, dpi: f32) -> Result<RasterImage, EngineError>;

    fn apply_operations(
        &mut self,
        target: ApplyTarget,
        request: &ApplyRequest,
    ) -> Result<ApplyOutcome, EngineError>;
}

/// Rectangle in source points, `(x0, y0)` top-left and `(x1, y1)` bottom-right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointRect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

/// Area an engine should blank before drawing a replace_text op's new text.
///
/// The op box is extended downward to cover glyph descenders of the source
/// text. Returns `None` for other op types.
pub fn redaction_rect(op: &EditorOp, page_size: &PageSize) -> Option<PointRect> {
    let EditorOpKind::ReplaceText { style, .. } = &op.kind else {
        return None;
    };
    let font_size = style.font_size * FONT_SIZE_CORRECTION;
    let rect = op.rect;
    Some(PointRect {
        x0: rect.x * page_size.width,
        y0: rect.y * page_size.height,
        x1: rect.right() * page_size.width,
        y1: rect.bottom() * page_size.height + font_size * DESCENDER_EXTENSION,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{Rect, TextStyle};

    fn replace(page: u32) -> EditorOp {
        EditorOp::new(
            page,
            Rect::new(0.1, 0.1, 0.5, 0.05),
            EditorOpKind::ReplaceText {
                text: "new".to_owned(),
                style: TextStyle { font_size: 10.0, ..TextStyle::default() },
                original_text: "old".to_owned(),
                original_lines: Vec::new(),
            },
        )
    }

    #[test]
    fn request_uses_zero_based_pages() {
        let sizes = BTreeMap::from([(2, PageSize::new(600.0, 800.0))]);
        let request = ApplyRequest::new(&[replace(2), replace(3)], &sizes);

        assert_eq!(request.ops[0].page, 1);
        assert_eq!(request.page_widths.get("1"), Some(&600.0));
        assert_eq!(request.page_heights.get("2"), Some(&792.0));

        let value = serde_json::to_value(&request).expect("serialize");
        assert_eq!(value["ops"][0]["type"], "replace_text");
        assert!(value.get("pageWidths").is_some());
    }

    #[test]
    fn page_subset_keeps_only_that_page() {
        let request = ApplyRequest::new(&[replace(1), replace(2)], &BTreeMap::new());
        let page = request.for_page(2);
        assert_eq!(page.ops.len(), 1);
        assert_eq!(page.page_widths.len(), 1);
    }

    #[test]
    fn redaction_extends_for_descenders() {
        let rect = redaction_rect(&replace(1), &PageSize::new(600.0, 800.0)).expect("rect");
        assert!((rect.x0 - 60.0).abs() < 1e-3);
        assert!((rect.y1 - (120.0 + 10.8 * 0.3)).abs() < 1e-3);
    }

    #[test]
    fn outcome_parses_engine_reply() {
        let outcome: ApplyOutcome =
            serde_json::from_str(r#"{"success": true, "message": "Applied 2 edit(s)", "applied": 2}"#)
                .expect("deserialize");
        assert!(outcome.success);
        assert_eq!(outcome.applied, 2);
    }
}
