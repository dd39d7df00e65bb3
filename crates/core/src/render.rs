//! Entity -> drawing instructions
//!
//! Pure mapping from annotations and edit operations to host-agnostic draw
//! commands in rendered-pixel space. Hosts paint the commands in order.

use crate::coords::{font_size_to_pixels, PageViewport, PixelPoint, PixelRect};
use crate::edit_store::line_shape_endpoints;
use crate::fonts::calculate_line_height;
use crate::handles::{generate_handles, HandleType};
use doc_model::{
    Annotation, AnnotationKind, ArrowHead, Color, EditorOp, EditorOpKind, LineStyle, ShapeKind,
    TextAlign, TextStyle,
};

/// Standard line height in points used to normalize text markup rects.
const STANDARD_LINE_HEIGHT: f32 = 12.0;

/// Text markup taller than this many standard lines is drawn at one line height.
const MARKUP_OVERSIZE_RATIO: f32 = 1.5;

const COMMENT_ICON_PX: f32 = 20.0;

/// Page geometry a draw list is produced for
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderContext {
    pub viewport: PageViewport,
    /// Rendered pixels per source point, for font sizes
    pub pdf_to_pixel_scale: f32,
}

/// Outline style
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub color: Color,
    /// 0.0 to 1.0
    pub opacity: f32,
    /// Width in rendered pixels
    pub width: f32,
    /// Dash lengths in pixels; empty for solid
    pub dash: Vec<f32>,
}

impl Stroke {
    fn new(color: Color, opacity: f32, width: f32, style: LineStyle) -> Self {
        let dash = style.dash_pattern().iter().map(|segment| segment * width).collect();
        Self { color, opacity, width, dash }
    }
}

/// Solid fill
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub color: Color,
    pub opacity: f32,
}

/// Styled text laid out inside a box
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    /// Layered CSS family stack
    pub font_family: String,
    /// Size in rendered pixels
    pub font_size: f32,
    /// Line pitch in rendered pixels
    pub line_height: f32,
    pub color: Color,
    pub bold: bool,
    pub italic: bool,
    pub align: TextAlign,
    /// Degrees
    pub rotation: f32,
}

/// Host-independent drawing instruction in rendered page pixels
///
/// Lists are painted in order, so later commands draw on top.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Axis-aligned box, also used for highlights and markup bars
    Rect { rect: PixelRect, stroke: Option<Stroke>, fill: Option<Paint> },
    /// Ellipse inscribed in `rect`
    Ellipse { rect: PixelRect, stroke: Option<Stroke>, fill: Option<Paint> },
    Line { from: PixelPoint, to: PixelPoint, stroke: Stroke },
    /// Open path through `points`, for ink
    Polyline { points: Vec<PixelPoint>, stroke: Stroke },
    /// Arrow head at `tip`, pointing away from `from`
    ArrowHead { tip: PixelPoint, from: PixelPoint, closed: bool, stroke: Stroke },
    /// Filled disc, for sequence number badges
    Circle { center: PixelPoint, radius: f32, fill: Paint },
    /// Sticky-note marker of a comment
    CommentIcon { rect: PixelRect, paint: Paint },
    Text { rect: PixelRect, run: TextRun },
    /// Image placeholder; `data` is the encoded image when present
    Image { rect: PixelRect, data: Option<String>, keep_aspect: bool, rotation: f32 },
    /// Short centered caption (sequence numbers, stamp titles)
    Label { rect: PixelRect, text: String, color: Color },
    /// Manipulation handle of the selected entity
    Handle { center: PixelPoint, size: f32, kind: HandleType },
    /// Box around the selection or an in-progress rect gesture
    SelectionOutline { rect: PixelRect },
}

pub fn annotation_commands(annotation: &Annotation, ctx: &RenderContext) -> Vec<DrawCommand> {
    let viewport = &ctx.viewport;
    let rect = viewport.rect_to_pixels(&annotation.rect);
    let color = annotation.color;
    let opacity = annotation.opacity;
    let stroke_px = |fraction: f32| (fraction * viewport.rendered_width()).max(1.0);
    let markup_height = STANDARD_LINE_HEIGHT * ctx.pdf_to_pixel_scale;
    let markup_thickness = (markup_height / 12.0).max(1.0);

    match &annotation.kind {
        AnnotationKind::Highlight => {
            vec![DrawCommand::Rect { rect, stroke: None, fill: Some(Paint { color, opacity }) }]
        }
        AnnotationKind::Underline => {
            let band = normalized_markup_rect(rect, markup_height, MarkupAnchor::Bottom);
            let y = band.bottom();
            vec![DrawCommand::Line {
                from: PixelPoint::new(band.x, y),
                to: PixelPoint::new(band.right(), y),
                stroke: Stroke::new(color, opacity, markup_thickness, LineStyle::Solid),
            }]
        }
        AnnotationKind::Strikethrough => {
            let band = normalized_markup_rect(rect, markup_height, MarkupAnchor::Center);
            let y = band.center().y;
            vec![DrawCommand::Line {
                from: PixelPoint::new(band.x, y),
                to: PixelPoint::new(band.right(), y),
                stroke: Stroke::new(color, opacity, markup_thickness, LineStyle::Solid),
            }]
        }
        AnnotationKind::Comment { .. } => {
            let icon = PixelRect::new(rect.x, rect.y, COMMENT_ICON_PX, COMMENT_ICON_PX);
            vec![DrawCommand::CommentIcon { rect: icon, paint: Paint { color, opacity } }]
        }
        AnnotationKind::Freetext { text, fontsize } => {
            let font_size = font_size_to_pixels(*fontsize, ctx.pdf_to_pixel_scale);
            vec![DrawCommand::Text {
                rect,
                run: TextRun {
                    text: text.clone(),
                    font_family: "Helvetica, Arial, sans-serif".to_owned(),
                    font_size,
                    line_height: font_size * crate::fonts::LINE_HEIGHT_RATIO,
                    color,
                    bold: false,
                    italic: false,
                    align: TextAlign::Left,
                    rotation: 0.0,
                },
            }]
        }
        AnnotationKind::Ink { paths } => paths
            .iter()
            .map(|path| DrawCommand::Polyline {
                points: path.points.iter().map(|p| viewport.point_to_pixels(p)).collect(),
                stroke: Stroke::new(path.color, opacity, stroke_px(path.stroke_width), LineStyle::Solid),
            })
            .collect(),
        AnnotationKind::Rectangle { stroke_width, line_style, fill } => vec![DrawCommand::Rect {
            rect,
            stroke: Some(Stroke::new(color, opacity, stroke_px(*stroke_width), *line_style)),
            fill: fill.enabled.then_some(Paint { color: fill.color, opacity: fill.opacity }),
        }],
        AnnotationKind::Ellipse { stroke_width, line_style, fill } => vec![DrawCommand::Ellipse {
            rect,
            stroke: Some(Stroke::new(color, opacity, stroke_px(*stroke_width), *line_style)),
            fill: fill.enabled.then_some(Paint { color: fill.color, opacity: fill.opacity }),
        }],
        AnnotationKind::Line { stroke_width, line_style, start_point, end_point } => {
            vec![DrawCommand::Line {
                from: viewport.point_to_pixels(start_point),
                to: viewport.point_to_pixels(end_point),
                stroke: Stroke::new(color, opacity, stroke_px(*stroke_width), *line_style),
            }]
        }
        AnnotationKind::Arrow {
            stroke_width,
            line_style,
            start_point,
            end_point,
            start_arrow,
            end_arrow,
        } => {
            let from = viewport.point_to_pixels(start_point);
            let to = viewport.point_to_pixels(end_point);
            let stroke = Stroke::new(color, opacity, stroke_px(*stroke_width), *line_style);
            let head_stroke = Stroke { dash: Vec::new(), ..stroke.clone() };
            let mut commands = vec![DrawCommand::Line { from, to, stroke }];
            if let Some(head) = arrow_head(to, from, *end_arrow, &head_stroke) {
                commands.push(head);
            }
            if let Some(head) = arrow_head(from, to, *start_arrow, &head_stroke) {
                commands.push(head);
            }
            commands
        }
        AnnotationKind::SequenceNumber { sequence_number } => {
            let center = rect.center();
            vec![
                DrawCommand::Circle {
                    center,
                    radius: rect.width.min(rect.height) / 2.0,
                    fill: Paint { color, opacity: 1.0 },
                },
                DrawCommand::Label { rect, text: sequence_number.to_string(), color: Color::WHITE },
            ]
        }
        AnnotationKind::Stamp { stamp_type, image_data, rotation } => match image_data {
            Some(data) => vec![DrawCommand::Image {
                rect,
                data: Some(data.clone()),
                keep_aspect: true,
                rotation: *rotation,
            }],
            None => vec![
                DrawCommand::Rect {
                    rect,
                    stroke: Some(Stroke::new(color, opacity, 2.0, LineStyle::Solid)),
                    fill: None,
                },
                DrawCommand::Label { rect, text: stamp_type.to_uppercase(), color },
            ],
        },
    }
}

pub fn op_commands(op: &EditorOp, ctx: &RenderContext) -> Vec<DrawCommand> {
    let viewport = &ctx.viewport;
    let rect = viewport.rect_to_pixels(&op.rect);

    match &op.kind {
        EditorOpKind::InsertText { text, style } => {
            vec![DrawCommand::Text { rect, run: text_run(text, style, rect, 1, ctx) }]
        }
        EditorOpKind::ReplaceText { text, style, original_lines, .. } => {
            // Blank the source text, then draw the replacement over it
            let mut commands: Vec<DrawCommand> = original_lines
                .iter()
                .map(|line| DrawCommand::Rect {
                    rect: viewport.rect_to_pixels(&line.rect),
                    stroke: None,
                    fill: Some(Paint { color: Color::WHITE, opacity: 1.0 }),
                })
                .collect();
            commands.push(DrawCommand::Rect {
                rect,
                stroke: None,
                fill: Some(Paint { color: Color::WHITE, opacity: 1.0 }),
            });
            let line_count = original_lines.len().max(1);
            commands.push(DrawCommand::Text { rect, run: text_run(text, style, rect, line_count, ctx) });
            commands
        }
        EditorOpKind::InsertImage { image_data, keep_aspect } => vec![DrawCommand::Image {
            rect,
            data: image_data.clone(),
            keep_aspect: *keep_aspect,
            rotation: 0.0,
        }],
        EditorOpKind::DrawShape { shape, stroke_color, stroke_width, fill_color } => {
            let stroke = Stroke::new(
                *stroke_color,
                1.0,
                font_size_to_pixels(*stroke_width, ctx.pdf_to_pixel_scale).max(1.0),
                LineStyle::Solid,
            );
            let fill = fill_color.map(|color| Paint { color, opacity: 1.0 });
            match shape {
                ShapeKind::Rect => vec![DrawCommand::Rect { rect, stroke: Some(stroke), fill }],
                ShapeKind::Ellipse => vec![DrawCommand::Ellipse { rect, stroke: Some(stroke), fill }],
                ShapeKind::Line => {
                    let (start, end) = line_shape_endpoints(&op.rect);
                    vec![DrawCommand::Line {
                        from: viewport.point_to_pixels(&start),
                        to: viewport.point_to_pixels(&end),
                        stroke,
                    }]
                }
            }
        }
    }
}

/// Outline plus handles for the selected entity's bounds.
pub fn selection_commands(
    rect: &doc_model::Rect,
    viewport: &PageViewport,
    handle_size: f32,
) -> Vec<DrawCommand> {
    let mut commands = vec![DrawCommand::SelectionOutline { rect: viewport.rect_to_pixels(rect) }];
    commands.extend(generate_handles(rect, viewport, handle_size).into_iter().map(|handle| {
        DrawCommand::Handle { center: handle.position, size: handle.size, kind: handle.handle_type }
    }));
    commands
}

fn text_run(
    text: &str,
    style: &TextStyle,
    rect: PixelRect,
    line_count: usize,
    ctx: &RenderContext,
) -> TextRun {
    let scale = ctx.pdf_to_pixel_scale;
    let box_height_pts = if scale > 0.0 { rect.height / scale } else { rect.height };
    let line_height = calculate_line_height(None, style.font_size, box_height_pts, line_count);
    TextRun {
        text: text.to_owned(),
        font_family: style.font_family.clone(),
        font_size: font_size_to_pixels(style.font_size, scale),
        line_height: font_size_to_pixels(line_height, scale),
        color: style.color,
        bold: style.bold,
        italic: style.italic,
        align: style.align,
        rotation: style.rotation,
    }
}

#[derive(Debug, Clone, Copy)]
enum MarkupAnchor {
    Bottom,
    Center,
}

/// Shrink an oversized text-markup rect to one standard line height.
fn normalized_markup_rect(rect: PixelRect, line_height: f32, anchor: MarkupAnchor) -> PixelRect {
    if line_height <= 0.0 || rect.height <= line_height * MARKUP_OVERSIZE_RATIO {
        return rect;
    }
    let y = match anchor {
        MarkupAnchor::Bottom => rect.bottom() - line_height,
        MarkupAnchor::Center => rect.center().y - line_height / 2.0,
    };
    PixelRect::new(rect.x, y, rect.width, line_height)
}

fn arrow_head(
    tip: PixelPoint,
    from: PixelPoint,
    head: ArrowHead,
    stroke: &Stroke,
) -> Option<DrawCommand> {
    match head {
        ArrowHead::None => None,
        ArrowHead::Open | ArrowHead::Closed => Some(DrawCommand::ArrowHead {
            tip,
            from,
            closed: head == ArrowHead::Closed,
            stroke: stroke.clone(),
        }),
    }
}
