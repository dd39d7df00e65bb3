//! Source text geometry reported by the PDF engine
//!
//! Blocks arrive as JSON from the engine collaborator, already in normalized
//! page space. Lines carry either a flat `text` field or styled spans; block
//! level style fields may be missing, in which case they are inferred from
//! the spans weighted by character count.

use doc_model::{Color, Point, Rect, SourceLine};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Color as reported by extraction: a hex string or a packed `0xRRGGBB` integer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EngineColor {
    Hex(Color),
    Packed(u32),
}

impl EngineColor {
    pub fn to_color(self) -> Color {
        match self {
            EngineColor::Hex(color) => color,
            EngineColor::Packed(value) => Color::from_packed(value),
        }
    }
}

/// Character quad: upper/lower left/right corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    pub ul: Point,
    pub ur: Point,
    pub ll: Point,
    pub lr: Point,
}

impl Quad {
    pub fn bounds(&self) -> Rect {
        Rect::bounding(&[self.ul, self.ur, self.ll, self.lr]).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChar {
    #[serde(rename = "char")]
    pub ch: String,
    pub quad: Quad,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextSpan {
    pub text: String,
    pub font: Option<String>,
    pub size: Option<f32>,
    pub color: Option<EngineColor>,
    pub bold: bool,
    pub italic: bool,
    pub serif: bool,
    pub mono: bool,
    pub rect: Option<Rect>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub rect: Rect,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chars: Vec<TextChar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spans: Vec<TextSpan>,
}

impl TextLine {
    /// Line text, falling back to the concatenated span text.
    pub fn text(&self) -> String {
        match &self.text {
            Some(text) => text.clone(),
            None => self.spans.iter().map(|span| span.text.as_str()).collect(),
        }
    }

    pub fn source_line(&self) -> SourceLine {
        SourceLine { text: self.text(), rect: self.rect }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    pub rect: Rect,
    #[serde(default)]
    pub lines: Vec<TextLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant_font: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant_size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant_color: Option<EngineColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_serif: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_mono: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
}

/// Style of a block, resolved from explicit fields or its spans.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockStyle {
    pub font: Option<String>,
    pub size: Option<f32>,
    pub color: Option<Color>,
    pub is_serif: Option<bool>,
    pub is_mono: Option<bool>,
    pub bold: bool,
    pub italic: bool,
    pub rotation: f32,
}

impl TextBlock {
    /// Block text with one line per row.
    pub fn text(&self) -> String {
        self.lines.iter().map(TextLine::text).collect::<Vec<_>>().join("\n")
    }

    pub fn source_lines(&self) -> Vec<SourceLine> {
        self.lines.iter().map(TextLine::source_line).collect()
    }

    pub fn resolved_style(&self) -> BlockStyle {
        let spans: Vec<&TextSpan> = self.lines.iter().flat_map(|line| &line.spans).collect();
        let weight = |span: &TextSpan| span.text.chars().count();

        let font = self.dominant_font.clone().or_else(|| {
            dominant(spans.iter().filter_map(|s| s.font.clone().map(|f| (f, weight(s)))))
        });
        let size = self.dominant_size.or_else(|| {
            dominant(spans.iter().filter_map(|s| s.size.map(|v| (v.to_bits(), weight(s)))))
                .map(f32::from_bits)
        });
        let color = self.dominant_color.map(EngineColor::to_color).or_else(|| {
            dominant(spans.iter().filter_map(|s| s.color.map(|c| (c.to_color(), weight(s)))))
        });

        let visible: Vec<&TextSpan> =
            spans.iter().copied().filter(|s| !s.text.trim().is_empty()).collect();
        let total: usize = visible.iter().map(|s| weight(s)).sum();
        let majority = |flag: fn(&TextSpan) -> bool| -> Option<bool> {
            (total > 0).then(|| {
                let flagged: usize = visible.iter().filter(|s| flag(s)).map(|s| weight(s)).sum();
                flagged * 2 > total
            })
        };

        let rotation = self.rotation.unwrap_or_else(|| {
            let rotations: Vec<f32> = self.lines.iter().filter_map(|line| line.rotation).collect();
            if rotations.is_empty() {
                0.0
            } else {
                rotations.iter().sum::<f32>() / rotations.len() as f32
            }
        });

        let font_lower = font.as_deref().unwrap_or_default().to_lowercase();
        BlockStyle {
            is_serif: self.is_serif.or_else(|| majority(|s| s.serif)),
            is_mono: self.is_mono.or_else(|| majority(|s| s.mono)),
            bold: majority(|s| s.bold).unwrap_or(false) || font_lower.contains("bold"),
            italic: majority(|s| s.italic).unwrap_or(false)
                || font_lower.contains("italic")
                || font_lower.contains("oblique"),
            font,
            size,
            color,
            rotation,
        }
    }

    fn is_well_formed(&self) -> bool {
        let finite = |rect: &Rect| {
            [rect.x, rect.y, rect.width, rect.height].iter().all(|value| value.is_finite())
        };
        finite(&self.rect) && self.lines.iter().all(|line| finite(&line.rect))
    }
}

/// Value with the largest total weight; ties go to the first seen.
fn dominant<K: Eq + std::hash::Hash + Clone>(items: impl Iterator<Item = (K, usize)>) -> Option<K> {
    let mut order = Vec::new();
    let mut totals: HashMap<K, usize> = HashMap::new();
    for (key, weight) in items {
        if !totals.contains_key(&key) {
            order.push(key.clone());
        }
        *totals.entry(key).or_default() += weight;
    }
    let mut best: Option<(K, usize)> = None;
    for key in order {
        let total = totals.get(&key).copied().unwrap_or_default();
        if best.as_ref().map_or(true, |(_, best_total)| total > *best_total) {
            best = Some((key, total));
        }
    }
    best.map(|(key, _)| key)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BlocksPayload {
    Bare(Vec<TextBlock>),
    Wrapped { blocks: Vec<TextBlock> },
}

/// Parse engine output (a bare array or `{"blocks": [...]}`).
///
/// Malformed input yields no blocks, so source text is simply not clickable.
pub fn parse_text_blocks(json: &str) -> Vec<TextBlock> {
    let blocks = match serde_json::from_str::<BlocksPayload>(json) {
        Ok(BlocksPayload::Bare(blocks)) | Ok(BlocksPayload::Wrapped { blocks }) => blocks,
        Err(error) => {
            tracing::warn!(%error, "malformed text block payload");
            return Vec::new();
        }
    };

    let total = blocks.len();
    let blocks: Vec<TextBlock> = blocks.into_iter().filter(TextBlock::is_well_formed).collect();
    if blocks.len() != total {
        tracing::warn!(dropped = total - blocks.len(), "dropped text blocks with invalid geometry");
    }
    blocks
}
