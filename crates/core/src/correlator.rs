//! Source text correlation
//!
//! Decides which extracted source blocks/lines are already claimed by a
//! replace_text operation, turns the unclaimed ones into clickable regions,
//! and seeds a replace_text operation from a clicked region.

use crate::coords::PageSize;
use crate::edit_store::EditOperationStore;
use crate::fonts::{calculate_display_font_size, map_font_family};
use crate::text_blocks::{TextBlock, TextLine};
use doc_model::{
    EditGranularity, EditorOp, EditorOpKind, EditorOpType, Point, Rect, SourceLine, TextAlign,
    TextStyle,
};

/// Share of a source region's own area an op must cover to claim it.
pub const CLAIM_THRESHOLD: f32 = 0.5;

/// An unclaimed, clickable piece of source text.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRegion {
    pub block_index: usize,
    /// Set in line granularity
    pub line_index: Option<usize>,
    pub rect: Rect,
    pub text: String,
    pub lines: Vec<SourceLine>,
}

/// Claimed-region queries against the replace_text ops of one page.
pub struct TextBlockCorrelator<'a> {
    claims: Vec<&'a EditorOp>,
}

impl<'a> TextBlockCorrelator<'a> {
    pub fn new(store: &'a EditOperationStore, page: u32) -> Self {
        let claims = store
            .ops_for_page(page)
            .into_iter()
            .filter(|op| op.op_type() == EditorOpType::ReplaceText)
            .collect();
        Self { claims }
    }

    fn is_claimed(&self, region: &Rect) -> bool {
        self.claims.iter().any(|op| region.covered_fraction(&op.rect) > CLAIM_THRESHOLD)
    }

    pub fn is_block_being_edited(&self, block: &TextBlock) -> bool {
        self.is_claimed(&block.rect)
    }

    pub fn is_line_being_edited(&self, line: &TextLine) -> bool {
        self.is_claimed(&line.rect)
    }

    /// Unclaimed regions bucketed by `granularity`, in extraction order.
    pub fn clickable_regions(
        &self,
        blocks: &[TextBlock],
        granularity: EditGranularity,
    ) -> Vec<SourceRegion> {
        let mut regions = Vec::new();
        for (block_index, block) in blocks.iter().enumerate() {
            if block.lines.is_empty() {
                continue;
            }
            match granularity {
                EditGranularity::Block => {
                    if !self.is_block_being_edited(block) {
                        regions.push(SourceRegion {
                            block_index,
                            line_index: None,
                            rect: block.rect,
                            text: block.text(),
                            lines: block.source_lines(),
                        });
                    }
                }
                EditGranularity::Line => {
                    for (line_index, line) in block.lines.iter().enumerate() {
                        if self.is_line_being_edited(line) || line.text().trim().is_empty() {
                            continue;
                        }
                        regions.push(SourceRegion {
                            block_index,
                            line_index: Some(line_index),
                            rect: line.rect,
                            text: line.text(),
                            lines: vec![line.source_line()],
                        });
                    }
                }
            }
        }
        regions
    }
}

/// Topmost region under `point`; later regions win, as they render later.
pub fn region_at<'r>(regions: &'r [SourceRegion], point: &Point) -> Option<&'r SourceRegion> {
    regions.iter().rev().find(|region| region.rect.contains(point))
}

/// Variant fields of a replace_text op seeded from `region`.
///
/// Text starts equal to the source; style is inferred from the block the
/// region came from. Font sizes are in points.
pub fn replace_text_kind(
    region: &SourceRegion,
    block: &TextBlock,
    page_size: &PageSize,
    base: &TextStyle,
) -> EditorOpKind {
    let inferred = block.resolved_style();
    let box_height = region.rect.height * page_size.height;
    let font_size = calculate_display_font_size(
        inferred.font.as_deref(),
        inferred.size,
        box_height,
        region.lines.len(),
    );
    let font_family = map_font_family(
        inferred.font.as_deref().unwrap_or_default(),
        inferred.is_serif,
        inferred.is_mono,
    );

    let style = TextStyle {
        font_family,
        font_size,
        color: inferred.color.unwrap_or(base.color),
        bold: inferred.bold,
        italic: inferred.italic,
        align: TextAlign::Left,
        rotation: inferred.rotation,
    };

    EditorOpKind::ReplaceText {
        text: region.text.clone(),
        style,
        original_text: region.text.clone(),
        original_lines: region.lines.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_blocks::parse_text_blocks;
    use doc_model::Color;

    fn block(rect: Rect, lines: &[(&str, Rect)]) -> TextBlock {
        TextBlock {
            rect,
            lines: lines
                .iter()
                .map(|(text, rect)| TextLine {
                    text: Some((*text).to_owned()),
                    rect: *rect,
                    chars: Vec::new(),
                    rotation: None,
                    spans: Vec::new(),
                })
                .collect(),
            dominant_font: Some("Georgia".to_owned()),
            dominant_size: Some(10.0),
            dominant_color: None,
            is_serif: None,
            is_mono: None,
            rotation: None,
        }
    }

    fn claim(store: &mut EditOperationStore, rect: Rect) {
        store.add_op(
            1,
            rect,
            EditorOpKind::ReplaceText {
                text: String::new(),
                style: TextStyle::default(),
                original_text: String::new(),
                original_lines: Vec::new(),
            },
        );
    }

    #[test]
    fn exactly_half_coverage_is_not_claimed() {
        let mut store = EditOperationStore::default();
        let source = block(Rect::new(0.0, 0.0, 0.5, 0.25), &[("a", Rect::new(0.0, 0.0, 0.5, 0.25))]);
        claim(&mut store, Rect::new(0.0, 0.0, 0.25, 0.25));

        assert!(!TextBlockCorrelator::new(&store, 1).is_block_being_edited(&source));

        claim(&mut store, Rect::new(0.0, 0.0, 0.375, 0.25));
        assert!(TextBlockCorrelator::new(&store, 1).is_block_being_edited(&source));
    }

    #[test]
    fn denominator_is_the_source_region() {
        let mut store = EditOperationStore::default();
        // op far larger than the block still claims it
        claim(&mut store, Rect::new(0.0, 0.0, 1.0, 1.0));
        let source = block(Rect::new(0.2, 0.2, 0.1, 0.02), &[("a", Rect::new(0.2, 0.2, 0.1, 0.02))]);
        assert!(TextBlockCorrelator::new(&store, 1).is_block_being_edited(&source));
        // a different page is unaffected
        assert!(!TextBlockCorrelator::new(&store, 2).is_block_being_edited(&source));
    }

    #[test]
    fn other_op_types_never_claim() {
        let mut store = EditOperationStore::default();
        store.add_op(1, Rect::new(0.0, 0.0, 1.0, 1.0), store.insert_text_kind());
        let source = block(Rect::new(0.2, 0.2, 0.1, 0.02), &[("a", Rect::new(0.2, 0.2, 0.1, 0.02))]);
        assert!(!TextBlockCorrelator::new(&store, 1).is_block_being_edited(&source));
    }

    #[test]
    fn line_granularity_skips_claimed_lines() {
        let mut store = EditOperationStore::default();
        let source = block(
            Rect::new(0.1, 0.1, 0.5, 0.04),
            &[("first", Rect::new(0.1, 0.1, 0.5, 0.02)), ("second", Rect::new(0.1, 0.12, 0.4, 0.02))],
        );
        claim(&mut store, Rect::new(0.1, 0.1, 0.5, 0.02));

        let correlator = TextBlockCorrelator::new(&store, 1);
        let regions = correlator.clickable_regions(std::slice::from_ref(&source), EditGranularity::Line);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].text, "second");
        assert_eq!(regions[0].line_index, Some(1));

        let blocks = correlator.clickable_regions(std::slice::from_ref(&source), EditGranularity::Block);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "first\nsecond");
    }

    #[test]
    fn region_lookup_by_point() {
        let store = EditOperationStore::default();
        let source = block(Rect::new(0.1, 0.1, 0.5, 0.04), &[("x", Rect::new(0.1, 0.1, 0.5, 0.04))]);
        let regions = TextBlockCorrelator::new(&store, 1)
            .clickable_regions(std::slice::from_ref(&source), EditGranularity::Block);

        assert!(region_at(&regions, &Point::new(0.2, 0.12)).is_some());
        assert!(region_at(&regions, &Point::new(0.9, 0.9)).is_none());
    }

    #[test]
    fn seeded_op_mirrors_source() {
        let source = block(
            Rect::new(0.1, 0.1, 0.5, 0.02),
            &[("Invoice total", Rect::new(0.1, 0.1, 0.5, 0.02))],
        );
        let store = EditOperationStore::default();
        let regions = TextBlockCorrelator::new(&store, 1)
            .clickable_regions(std::slice::from_ref(&source), EditGranularity::Block);

        let kind = replace_text_kind(&regions[0], &source, &PageSize::new(600.0, 800.0), &TextStyle::default());
        let EditorOpKind::ReplaceText { text, style, original_text, original_lines } = kind else {
            panic!("replace_text expected");
        };
        assert_eq!(text, "Invoice total");
        assert_eq!(original_text, text);
        assert_eq!(original_lines.len(), 1);
        assert!(style.font_family.ends_with("serif") && style.font_family.contains("Times"));
        // 16pt box -> 13.33 estimate beats 10.8
        assert!((style.font_size - 16.0 / 1.2).abs() < 1e-3);
        assert_eq!(style.color, Color::BLACK);
    }

    #[test]
    fn malformed_blocks_give_no_regions() {
        let store = EditOperationStore::default();
        let regions = TextBlockCorrelator::new(&store, 1)
            .clickable_regions(&parse_text_blocks("{oops"), EditGranularity::Block);
        assert!(regions.is_empty());
    }
}
