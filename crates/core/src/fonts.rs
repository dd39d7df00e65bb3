//! Source font inference
//!
//! Maps whatever font name the extraction engine reports (often a subset
//! name such as `ABCDEF+Calibri-Bold`, sometimes an OCR placeholder with no
//! real glyphs) to a layered CSS-style family stack, and derives display
//! sizes from the source geometry.

/// Correction applied to reported sizes; built-in replacement fonts render slightly small.
pub const FONT_SIZE_CORRECTION: f32 = 1.08;

/// Line pitch as a multiple of font size.
pub const LINE_HEIGHT_RATIO: f32 = 1.2;

const MONO_FRAGMENTS: &[&str] = &["courier", "consolas", "mono", "fixed"];
const SERIF_FRAGMENTS: &[&str] = &["times", "georgia", "palatino", "garamond", "cambria", "roman"];
const SANS_FRAGMENTS: &[&str] = &["arial", "helvetica", "verdana", "calibri", "sans", "gothic"];

/// Fonts emitted by scanners and OCR text layers. Their metrics say nothing
/// about the visible glyphs underneath.
const PLACEHOLDER_MARKERS: &[&str] =
    &["glyphlessfont", "invisible", "hiddenhorzocr", "tesseract", "t3font_"];

/// Name tokens starting with this mark an OCR layer (`OCR-Layer`, `ocrfont`).
const OCR_TOKEN_PREFIX: &str = "ocr";

const OPEN_FAMILIES: &[(&str, &str)] =
    &[("dejavu", "DejaVu"), ("liberation", "Liberation"), ("noto", "Noto")];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontCategory {
    Serif,
    Sans,
    Mono,
}

impl FontCategory {
    pub fn css_stack(&self) -> &'static str {
        match self {
            FontCategory::Serif => "\"Times New Roman\", Times, Georgia, serif",
            FontCategory::Sans => "Arial, Helvetica, sans-serif",
            FontCategory::Mono => "\"Courier New\", Courier, monospace",
        }
    }

    /// Built-in font name understood by the PDF engine.
    pub fn engine_font(&self) -> &'static str {
        match self {
            FontCategory::Serif => "tiro",
            FontCategory::Sans => "helv",
            FontCategory::Mono => "cour",
        }
    }
}

/// Drop a subset tag (`ABCDEF+`) and lowercase.
fn normalize_font_name(name: &str) -> String {
    let base = match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.chars().all(|c| c.is_ascii_uppercase()) => rest,
        _ => name,
    };
    base.to_lowercase()
}

fn category_from_name(lower: &str) -> Option<FontCategory> {
    if MONO_FRAGMENTS.iter().any(|f| lower.contains(f)) {
        return Some(FontCategory::Mono);
    }
    let serif_word = lower.contains("serif") && !lower.contains("sans");
    if serif_word || SERIF_FRAGMENTS.iter().any(|f| lower.contains(f)) {
        return Some(FontCategory::Serif);
    }
    if SANS_FRAGMENTS.iter().any(|f| lower.contains(f)) {
        return Some(FontCategory::Sans);
    }
    None
}

pub fn is_placeholder_font(name: &str) -> bool {
    is_placeholder_name(&normalize_font_name(name))
}

fn is_placeholder_name(lower: &str) -> bool {
    PLACEHOLDER_MARKERS.iter().any(|marker| lower.contains(marker))
        || lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|token| token.starts_with(OCR_TOKEN_PREFIX))
}

/// Resolve a source font to a layered family stack.
///
/// Precedence: family name fragments, then an explicit serif flag, then the
/// mono flag (only when serif is explicitly false), then placeholder and
/// open-family special cases, then sans-serif.
pub fn map_font_family(name: &str, is_serif: Option<bool>, is_mono: Option<bool>) -> String {
    let lower = normalize_font_name(name);

    if let Some(category) = category_from_name(&lower) {
        return category.css_stack().to_owned();
    }
    if is_serif == Some(true) {
        return FontCategory::Serif.css_stack().to_owned();
    }
    if is_serif == Some(false) && is_mono == Some(true) {
        return FontCategory::Mono.css_stack().to_owned();
    }

    // OCR layers sit over scanned print; without a serif flag assume serif
    if is_serif.is_none() && is_placeholder_name(&lower) {
        return FontCategory::Serif.css_stack().to_owned();
    }
    if let Some((_, family)) = OPEN_FAMILIES.iter().find(|(fragment, _)| lower.contains(fragment)) {
        return format!("\"{family} Sans\", {}", FontCategory::Sans.css_stack());
    }

    FontCategory::Sans.css_stack().to_owned()
}

/// Map a CSS family stack to an engine built-in font.
///
/// The first recognized family name wins; otherwise the trailing generic
/// family decides, defaulting to serif.
pub fn css_stack_to_engine_font(css: &str) -> &'static str {
    let families: Vec<String> = css
        .split(',')
        .map(|family| family.trim().trim_matches(|c| c == '"' || c == '\'').to_lowercase())
        .filter(|family| !family.is_empty())
        .collect();

    for family in &families {
        if matches!(family.as_str(), "serif" | "sans-serif" | "monospace") {
            continue;
        }
        if let Some(category) = category_from_name(family) {
            return category.engine_font();
        }
    }

    match families.last().map(String::as_str) {
        Some("sans-serif") => FontCategory::Sans.engine_font(),
        Some("monospace") => FontCategory::Mono.engine_font(),
        _ => FontCategory::Serif.engine_font(),
    }
}

/// Font size (points) to display replacement text in a source box of
/// `box_height` points holding `line_count` lines.
pub fn calculate_display_font_size(
    font_name: Option<&str>,
    reported_size: Option<f32>,
    box_height: f32,
    line_count: usize,
) -> f32 {
    let pitch = box_height / line_count.max(1) as f32;
    let estimate = pitch / LINE_HEIGHT_RATIO;

    match reported_size {
        Some(size) if size > 0.0 && !font_name.is_some_and(is_placeholder_font) => {
            (size * FONT_SIZE_CORRECTION).max(estimate)
        }
        _ => estimate,
    }
}

/// Line pitch (points) for replacement text.
pub fn calculate_line_height(
    font_name: Option<&str>,
    font_size: f32,
    box_height: f32,
    line_count: usize,
) -> f32 {
    let pitch = box_height / line_count.max(1) as f32;
    if font_name.is_some_and(is_placeholder_font) || line_count > 1 {
        pitch
    } else {
        font_size * LINE_HEIGHT_RATIO
    }
}
